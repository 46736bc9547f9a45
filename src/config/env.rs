//! Environment snapshot and the environment-variable overlay over a config

use super::alias::AliasConfig;
use super::auth::auth_token_from_env;
use super::defaults::{DEFAULT_HOST, HOST_ENV};
use super::map::ConfigMap;
use super::Config;
use crate::error::{CliError, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Snapshot of the process environment
///
/// Everything that consults environment variables takes one of these instead
/// of reading the process environment directly, so tests can supply their own.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the current process environment; non-UTF-8 entries are skipped
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Build from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `name` when set to something non-empty
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Value of `name` when set at all, even to ""
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Set a variable in this snapshot
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Home directory, preferring the snapshot's `HOME`/`USERPROFILE`
    pub fn home_dir(&self) -> Option<PathBuf> {
        let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
        self.get(var).map(PathBuf::from).or_else(dirs::home_dir)
    }
}

/// Config wrapper that lets environment variables win over stored values
///
/// `KITTYCAD_TOKEN` / `KITTYCAD_API_TOKEN` override the token of every host
/// and `KITTYCAD_HOST` overrides the default host. Values coming from the
/// environment are read-only.
pub struct EnvConfig {
    inner: Box<dyn Config>,
    env: Environment,
}

impl std::fmt::Debug for EnvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvConfig").finish_non_exhaustive()
    }
}

impl EnvConfig {
    /// Layer `env` over `inner`
    pub fn inherit_env(inner: Box<dyn Config>, env: Environment) -> Self {
        Self { inner, env }
    }
}

impl Config for EnvConfig {
    fn get_with_source(&self, hostname: &str, key: &str) -> Result<(String, String)> {
        if !hostname.is_empty() && key == "token" {
            if let Some((token, var)) = auth_token_from_env(&self.env) {
                return Ok((token, var.to_string()));
            }
        }
        self.inner.get_with_source(hostname, key)
    }

    fn set(&mut self, hostname: &str, key: &str, value: &str) -> Result<()> {
        self.inner.set(hostname, key, value)
    }

    fn unset_host(&mut self, hostname: &str) {
        self.inner.unset_host(hostname);
    }

    fn hosts(&self) -> Result<Vec<String>> {
        let hosts = self.inner.hosts();
        if auth_token_from_env(&self.env).is_none() {
            return hosts;
        }

        let mut hosts = hosts.unwrap_or_default();
        if !hosts.iter().any(|h| h == DEFAULT_HOST) {
            hosts.insert(0, DEFAULT_HOST.to_string());
        }
        Ok(hosts)
    }

    fn default_host_with_source(&self) -> Result<(String, String)> {
        if let Some(host) = self.env.get(HOST_ENV) {
            return Ok((host.to_string(), HOST_ENV.to_string()));
        }
        self.inner.default_host_with_source()
    }

    fn aliases(&mut self) -> Result<AliasConfig<'_>> {
        self.inner.aliases()
    }

    fn save_aliases(&mut self, aliases: &ConfigMap) -> Result<()> {
        self.inner.save_aliases(aliases)
    }

    fn check_writeable(&self, hostname: &str, key: &str) -> Result<()> {
        if !hostname.is_empty() && key == "token" {
            if let Some((_, var)) = auth_token_from_env(&self.env) {
                return Err(CliError::ReadOnlyEnv {
                    variable: var.to_string(),
                });
            }
        }
        self.inner.check_writeable(hostname, key)
    }

    fn write(&self) -> Result<()> {
        self.inner.write()
    }

    fn config_to_string(&self) -> Result<String> {
        self.inner.config_to_string()
    }

    fn hosts_to_string(&self) -> Result<String> {
        self.inner.hosts_to_string()
    }
}
