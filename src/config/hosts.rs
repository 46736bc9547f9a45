//! Per-host settings stored under the `hosts` key of the merged tree

use super::defaults::HOSTS_KEY;
use super::document::{Mapping, Node};
use super::map::ConfigMap;
use crate::error::{CliError, Result};

/// Read-only view of the `hosts` section
#[derive(Debug, Clone, Copy)]
pub struct HostsConfig<'a> {
    hosts: Option<&'a Mapping>,
}

impl<'a> HostsConfig<'a> {
    /// View over the `hosts` entry of `root`, which may be missing
    pub fn new(root: &'a ConfigMap) -> Self {
        Self {
            hosts: root.find_entry(HOSTS_KEY),
        }
    }

    /// Hostnames in document order
    pub fn names(&self) -> Vec<String> {
        self.hosts
            .map(|m| m.keys().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    /// Whether `hostname` has an entry
    pub fn contains(&self, hostname: &str) -> bool {
        self.host(hostname).is_some()
    }

    /// Non-empty scalar `key` configured for `hostname`
    pub fn get(&self, hostname: &str, key: &str) -> Option<String> {
        self.host(hostname)
            .and_then(|m| m.get(key))
            .and_then(Node::as_str)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
    }

    fn host(&self, hostname: &str) -> Option<&'a Mapping> {
        match self.hosts?.get(hostname) {
            Some(Node::Mapping(m)) => Some(m),
            _ => None,
        }
    }
}

/// Mutable access to the `hosts` section
#[derive(Debug)]
pub struct HostsConfigMut<'a> {
    root: &'a mut ConfigMap,
}

impl<'a> HostsConfigMut<'a> {
    /// Wrap the merged tree
    pub fn new(root: &'a mut ConfigMap) -> Self {
        Self { root }
    }

    /// Set `key` for `hostname`, creating the host and section as needed
    ///
    /// New hosts are appended after the existing ones.
    pub fn set(&mut self, hostname: &str, key: &str, value: &str) {
        let mut hosts = self.root.find_entry(HOSTS_KEY).cloned().unwrap_or_default();
        let mut host = match hosts.get(hostname) {
            Some(Node::Mapping(m)) => m.clone(),
            _ => Mapping::new(),
        };
        host.insert(key, Node::scalar(value));
        hosts.insert(hostname, Node::Mapping(host));
        self.root.root_mut().insert(HOSTS_KEY, Node::Mapping(hosts));
    }

    /// Drop every setting for `hostname`; true when something was removed
    pub fn unset(&mut self, hostname: &str) -> bool {
        self.root
            .find_entry_mut(HOSTS_KEY)
            .is_some_and(|hosts| hosts.remove(hostname).is_some())
    }
}

/// Validate a hostname given on the command line
pub fn validate_hostname(hostname: &str) -> Result<()> {
    if hostname.trim().is_empty() {
        return Err(CliError::InvalidArgument("a value is required".to_string()));
    }
    if hostname.contains('/') || (hostname.contains(':') && !hostname.starts_with("localhost:")) {
        return Err(CliError::InvalidArgument("invalid hostname".to_string()));
    }
    Ok(())
}
