//! In-memory [`Config`] for tests

use super::alias::AliasConfig;
use super::defaults::DEFAULT_HOST;
use super::document::Mapping;
use super::map::ConfigMap;
use super::Config;
use crate::error::{CliError, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Config backed by a flat map of `host:key` entries
///
/// Global keys are stored under `:key`. Nothing touches the filesystem;
/// [`Stub::was_written`] records whether `write` was called.
#[derive(Debug, Default)]
pub struct Stub {
    values: BTreeMap<String, String>,
    aliases: Mapping,
    written: AtomicBool,
}

impl Stub {
    /// Empty stub
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    #[must_use]
    pub fn with(mut self, hostname: &str, key: &str, value: &str) -> Self {
        self.values.insert(format!("{hostname}:{key}"), value.to_string());
        self
    }

    /// Whether `write` has been called
    pub fn was_written(&self) -> bool {
        self.written.load(Ordering::SeqCst)
    }
}

impl Config for Stub {
    fn get_with_source(&self, hostname: &str, key: &str) -> Result<(String, String)> {
        self.values
            .get(&format!("{hostname}:{key}"))
            .map(|v| (v.clone(), super::defaults::MEMORY_SOURCE.to_string()))
            .ok_or_else(|| CliError::Internal(format!("{key} not found")))
    }

    fn set(&mut self, hostname: &str, key: &str, value: &str) -> Result<()> {
        self.values.insert(format!("{hostname}:{key}"), value.to_string());
        Ok(())
    }

    fn unset_host(&mut self, hostname: &str) {
        if hostname.is_empty() {
            return;
        }
        let prefix = format!("{hostname}:");
        self.values.retain(|k, _| !k.starts_with(&prefix));
    }

    fn hosts(&self) -> Result<Vec<String>> {
        let mut hosts: Vec<String> = Vec::new();
        for key in self.values.keys() {
            if let Some((host, _)) = key.rsplit_once(':') {
                if !host.is_empty() && !hosts.iter().any(|h| h == host) {
                    hosts.push(host.to_string());
                }
            }
        }
        Ok(hosts)
    }

    fn default_host_with_source(&self) -> Result<(String, String)> {
        Ok((DEFAULT_HOST.to_string(), String::new()))
    }

    fn aliases(&mut self) -> Result<AliasConfig<'_>> {
        let map = ConfigMap::new(self.aliases.clone());
        Ok(AliasConfig::new(map, self))
    }

    fn save_aliases(&mut self, aliases: &ConfigMap) -> Result<()> {
        self.aliases = aliases.root().clone();
        Ok(())
    }

    fn check_writeable(&self, _hostname: &str, _key: &str) -> Result<()> {
        Ok(())
    }

    fn write(&self) -> Result<()> {
        self.written.store(true, Ordering::SeqCst);
        Ok(())
    }
}
