//! [`Config`] backed by `config.yml` and `hosts.yml`

use super::alias::AliasConfig;
use super::defaults::{
    default_for, is_host_only, option, ALIASES_COMMENT, ALIASES_KEY, CONFIG_OPTIONS,
    DEFAULT_ALIASES, DEFAULT_HOST, HOSTS_KEY,
};
use super::document::{self, Entry, Mapping, Node};
use super::hosts::{HostsConfig, HostsConfigMut};
use super::map::ConfigMap;
use super::paths::{dir_error, read_error, ConfigPaths};
use super::Config;
use crate::error::{CliError, Result};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Both config documents merged into one tree
///
/// Host settings live under the `hosts` key while loaded; [`Config::write`]
/// splits them back out into `hosts.yml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfig {
    map: ConfigMap,
    paths: ConfigPaths,
}

impl FileConfig {
    /// Config over an already-built tree
    pub const fn new(root: Mapping, paths: ConfigPaths) -> Self {
        Self {
            map: ConfigMap::new(root),
            paths,
        }
    }

    /// Fresh config with the documented defaults
    pub fn blank(paths: ConfigPaths) -> Self {
        Self::new(blank_root(), paths)
    }

    /// Config parsed from a single main document
    pub fn from_yaml(data: &str, paths: ConfigPaths) -> Result<Self> {
        Ok(Self::new(document::parse(data)?, paths))
    }

    /// Load both documents from disk
    ///
    /// A missing `config.yml` yields the blank config. A non-empty
    /// `hosts.yml` is merged in as the `hosts` section; when `config.yml`
    /// still carries its own `hosts`, entries from `hosts.yml` take
    /// precedence.
    pub fn load(paths: ConfigPaths) -> Result<Self> {
        let mut root = match read_config_file(&paths.config_file)? {
            Some(data) => document::parse(&data)?,
            None => {
                debug!(path = %paths.config_file.display(), "no config file, using defaults");
                blank_root()
            }
        };

        if let Some(data) = read_config_file(&paths.hosts_file)? {
            let hosts = document::parse(&data)?;
            if !hosts.is_empty() {
                let merged = match root.remove(HOSTS_KEY) {
                    Some(Node::Mapping(legacy)) => merge_hosts(hosts, legacy),
                    _ => hosts,
                };
                root.prepend(Entry::new(HOSTS_KEY, Node::Mapping(merged)));
            }
        }

        Ok(Self::new(root, paths))
    }

    /// Paths this config reads from and writes to
    pub const fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Split the merged tree into the main and hosts documents
    fn split(&self) -> (Mapping, Mapping) {
        let mut main = Mapping::new();
        let mut hosts = Mapping::new();
        for entry in self.map.root().entries() {
            if entry.key == HOSTS_KEY {
                if let Node::Mapping(m) = &entry.value {
                    for host in m.entries() {
                        hosts.push(host.clone());
                    }
                }
            } else {
                main.push(entry.clone());
            }
        }
        (main, hosts)
    }

    fn source(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }
}

impl Config for FileConfig {
    fn get_with_source(&self, hostname: &str, key: &str) -> Result<(String, String)> {
        if !hostname.is_empty() {
            let hosts_source = Self::source(&self.paths.hosts_file);
            if let Some(value) = HostsConfig::new(&self.map).get(hostname, key) {
                return Ok((value, hosts_source));
            }
            if is_host_only(key) {
                return Ok((String::new(), hosts_source));
            }
        }

        let source = Self::source(&self.paths.config_file);
        let value = self
            .map
            .get_string_value(key)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default_for(key));
        Ok((value, source))
    }

    fn set(&mut self, hostname: &str, key: &str, value: &str) -> Result<()> {
        if hostname.is_empty() {
            self.map.set_string_value(key, value);
        } else {
            HostsConfigMut::new(&mut self.map).set(hostname, key, value);
        }
        Ok(())
    }

    fn unset_host(&mut self, hostname: &str) {
        if hostname.is_empty() {
            return;
        }
        HostsConfigMut::new(&mut self.map).unset(hostname);
    }

    fn hosts(&self) -> Result<Vec<String>> {
        Ok(HostsConfig::new(&self.map).names())
    }

    fn default_host_with_source(&self) -> Result<(String, String)> {
        Ok((DEFAULT_HOST.to_string(), String::new()))
    }

    fn aliases(&mut self) -> Result<AliasConfig<'_>> {
        if self.map.find_entry(ALIASES_KEY).is_none() {
            self.map
                .root_mut()
                .insert(ALIASES_KEY, Node::Mapping(Mapping::new()));
        }
        let map = ConfigMap::new(self.map.find_entry(ALIASES_KEY).cloned().unwrap_or_default());
        Ok(AliasConfig::new(map, self))
    }

    fn save_aliases(&mut self, aliases: &ConfigMap) -> Result<()> {
        self.map
            .root_mut()
            .insert(ALIASES_KEY, Node::Mapping(aliases.root().clone()));
        Ok(())
    }

    fn check_writeable(&self, _hostname: &str, _key: &str) -> Result<()> {
        Ok(())
    }

    fn write(&self) -> Result<()> {
        let (main, hosts) = self.split();
        write_config_file(&self.paths.config_file, &document::to_yaml(&main))?;
        write_config_file(&self.paths.hosts_file, &document::to_yaml(&hosts))
    }

    fn config_to_string(&self) -> Result<String> {
        Ok(document::to_yaml(&self.split().0))
    }

    fn hosts_to_string(&self) -> Result<String> {
        Ok(document::to_yaml(&self.split().1))
    }
}

/// Root mapping of a config that has never been saved
pub fn blank_root() -> Mapping {
    let mut root = Mapping::new();
    push_option(&mut root, "prompt");
    push_option(&mut root, "pager");

    let aliases: Mapping = DEFAULT_ALIASES
        .iter()
        .map(|(name, expansion)| Entry::new(*name, Node::scalar(*expansion)))
        .collect();
    root.push(Entry::new(ALIASES_KEY, Node::Mapping(aliases)).with_comment(ALIASES_COMMENT));

    for opt in CONFIG_OPTIONS {
        if !root.contains_key(opt.key) {
            push_option(&mut root, opt.key);
        }
    }

    root
}

fn push_option(root: &mut Mapping, key: &str) {
    if let Some(opt) = option(key) {
        root.push(
            Entry::new(opt.key, Node::scalar(opt.default_value)).with_comment(option_comment(key)),
        );
    }
}

fn option_comment(key: &str) -> String {
    match option(key) {
        Some(opt) if !opt.allowed_values.is_empty() => format!(
            "{} Supported values: {}",
            opt.comment,
            opt.allowed_values.join(", ")
        ),
        Some(opt) => opt.comment.to_string(),
        None => String::new(),
    }
}

fn merge_hosts(primary: Mapping, legacy: Mapping) -> Mapping {
    let mut merged = primary;
    for entry in legacy.entries() {
        if !merged.contains_key(&entry.key) {
            merged.push(entry.clone());
        }
    }
    merged
}

fn read_config_file(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(read_error(path, &e)),
    }
}

/// Write a config document, creating parent directories as needed
///
/// The file holds credentials, so it is restricted to the owner on Unix.
pub fn write_config_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| dir_error(parent, &e))?;
    }

    fs::write(path, contents).map_err(|e| CliError::ConfigWrite {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, Permissions::from_mode(0o600)).map_err(|e| {
            CliError::ConfigWrite {
                path: path.to_path_buf(),
                reason: format!("failed to set permissions: {e}"),
            }
        })?;
    }

    debug!(path = %path.display(), bytes = contents.len(), "wrote config file");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BLANK: &str = "\
# When to interactively prompt. This is a global config that cannot be overridden by hostname. Supported values: enabled, disabled
prompt: enabled
# A pager program to send command output to, e.g. \"less\". Set the value to \"cat\" to disable the pager.
pager:
# Aliases allow you to create nicknames for kittycad commands
aliases:
    co: file convert
# What web browser kittycad should use when opening URLs. If blank, will refer to environment.
browser:
";

    fn paths(dir: &TempDir) -> ConfigPaths {
        ConfigPaths::in_dir(dir.path())
    }

    #[test]
    fn blank_config_renders_documented_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = FileConfig::blank(paths(&dir));
        assert_eq!(cfg.config_to_string().unwrap(), BLANK);
        assert_eq!(cfg.hosts_to_string().unwrap(), "");
    }

    #[test]
    fn blank_config_survives_write_and_reload() {
        let dir = TempDir::new().unwrap();
        FileConfig::blank(paths(&dir)).write().unwrap();

        let reloaded = FileConfig::load(paths(&dir)).unwrap();
        assert_eq!(reloaded.config_to_string().unwrap(), BLANK);
        assert_eq!(reloaded.hosts_to_string().unwrap(), "");
        assert_eq!(fs::read_to_string(dir.path().join("hosts.yml")).unwrap(), "");
    }

    #[test]
    fn missing_files_load_blank_config() {
        let dir = TempDir::new().unwrap();
        let cfg = FileConfig::load(paths(&dir)).unwrap();
        assert_eq!(cfg.get("", "prompt").unwrap(), "enabled");
        assert!(cfg.hosts().unwrap().is_empty());
    }

    #[test]
    fn awkward_values_survive_write_and_reload() {
        let dir = TempDir::new().unwrap();
        let values = ["true", "0x10", "a: b", "multi\nline", "", " padded ", "#hash"];

        let mut cfg = FileConfig::from_yaml("", paths(&dir)).unwrap();
        for (i, value) in values.iter().enumerate() {
            cfg.set("", &format!("key{i}"), value).unwrap();
            cfg.set("localhost:8888", &format!("key{i}"), value).unwrap();
        }
        cfg.write().unwrap();

        let reloaded = FileConfig::load(paths(&dir)).unwrap();
        for (i, value) in values.iter().enumerate() {
            let key = format!("key{i}");
            assert_eq!(reloaded.get("", &key).unwrap(), *value, "global {key}");
            assert_eq!(
                reloaded.get("localhost:8888", &key).unwrap(),
                *value,
                "host {key}"
            );
        }
    }

    #[test]
    fn set_then_write_splits_hosts() {
        let dir = TempDir::new().unwrap();
        let mut cfg = FileConfig::from_yaml("", paths(&dir)).unwrap();
        cfg.set("api.kittycad.io", "pager", "cat").unwrap();
        cfg.set("api.kittycad.io", "token", "BLAH").unwrap();
        cfg.set("not.kittycad.io", "pager", "less").unwrap();
        cfg.set("", "editor", "vim").unwrap();
        cfg.write().unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("hosts.yml")).unwrap(),
            "api.kittycad.io:\n    pager: cat\n    token: BLAH\nnot.kittycad.io:\n    pager: less\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("config.yml")).unwrap(),
            "editor: vim\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn written_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let nested = ConfigPaths::in_dir(dir.path().join("a/b"));
        FileConfig::blank(nested.clone()).write().unwrap();

        let mode = fs::metadata(&nested.hosts_file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn host_values_win_over_global_values() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yml"), "pager: less\n").unwrap();
        fs::write(
            dir.path().join("hosts.yml"),
            "example.com:\n    pager: more\n    token: abc\n",
        )
        .unwrap();
        let cfg = FileConfig::load(paths(&dir)).unwrap();

        let (value, source) = cfg.get_with_source("example.com", "pager").unwrap();
        assert_eq!(value, "more");
        assert!(source.ends_with("hosts.yml"));

        let (value, source) = cfg.get_with_source("other.com", "pager").unwrap();
        assert_eq!(value, "less");
        assert!(source.ends_with("config.yml"));

        assert_eq!(cfg.get("other.com", "prompt").unwrap(), "enabled");
        assert_eq!(cfg.get("", "pager").unwrap(), "less");
    }

    #[test]
    fn host_only_keys_do_not_fall_back() {
        let dir = TempDir::new().unwrap();
        let cfg = FileConfig::from_yaml("token: global\nuser: someone\n", paths(&dir)).unwrap();
        assert_eq!(cfg.get("example.com", "token").unwrap(), "");
        assert_eq!(cfg.get("example.com", "user").unwrap(), "");
    }

    #[test]
    fn empty_global_value_reads_as_default() {
        let dir = TempDir::new().unwrap();
        let cfg = FileConfig::from_yaml("prompt:\n", paths(&dir)).unwrap();
        assert_eq!(cfg.get("", "prompt").unwrap(), "enabled");
    }

    #[test]
    fn legacy_hosts_in_main_document_are_read_and_split_out() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yml"),
            "hosts:\n    legacy.io:\n        token: old\n    shared.io:\n        token: old\npager: less\n",
        )
        .unwrap();
        fs::write(dir.path().join("hosts.yml"), "shared.io:\n    token: new\n").unwrap();

        let cfg = FileConfig::load(paths(&dir)).unwrap();
        assert_eq!(cfg.hosts().unwrap(), vec!["shared.io", "legacy.io"]);
        assert_eq!(cfg.get("shared.io", "token").unwrap(), "new");
        assert_eq!(cfg.get("legacy.io", "token").unwrap(), "old");

        cfg.write().unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("config.yml")).unwrap(),
            "pager: less\n"
        );
    }

    #[test]
    fn legacy_hosts_without_hosts_file_still_split() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yml"),
            "hosts:\n    legacy.io:\n        token: old\n",
        )
        .unwrap();
        let cfg = FileConfig::load(paths(&dir)).unwrap();
        assert_eq!(cfg.hosts().unwrap(), vec!["legacy.io"]);
        assert_eq!(cfg.config_to_string().unwrap(), "");
        assert_eq!(
            cfg.hosts_to_string().unwrap(),
            "legacy.io:\n    token: old\n"
        );
    }

    #[test]
    fn non_mapping_document_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yml"), "- one\n- two\n").unwrap();
        let err = FileConfig::load(paths(&dir)).unwrap_err();
        assert_eq!(err.to_string(), "expected a top level map");
    }

    #[test]
    fn whitespace_only_document_is_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yml"), "\n").unwrap();
        let cfg = FileConfig::load(paths(&dir)).unwrap();
        assert_eq!(cfg.config_to_string().unwrap(), "");
    }

    #[test]
    fn alias_set_appends_after_existing_keys() {
        let dir = TempDir::new().unwrap();
        let mut cfg = FileConfig::from_yaml("pager: more\n", paths(&dir)).unwrap();
        cfg.aliases().unwrap().add("fc", "file convert").unwrap();

        assert_eq!(
            cfg.config_to_string().unwrap(),
            "pager: more\naliases:\n    fc: file convert\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("config.yml")).unwrap(),
            "pager: more\naliases:\n    fc: file convert\n"
        );
    }

    #[test]
    fn unset_host_removes_only_that_host() {
        let dir = TempDir::new().unwrap();
        let mut cfg = FileConfig::from_yaml("", paths(&dir)).unwrap();
        cfg.set("a.io", "token", "1").unwrap();
        cfg.set("b.io", "token", "2").unwrap();
        cfg.unset_host("a.io");
        cfg.unset_host("missing.io");
        assert_eq!(cfg.hosts().unwrap(), vec!["b.io"]);
    }

    #[test]
    fn default_host_is_constant() {
        let dir = TempDir::new().unwrap();
        let cfg = FileConfig::blank(paths(&dir));
        assert_eq!(
            cfg.default_host_with_source().unwrap(),
            ("api.kittycad.io".to_string(), String::new())
        );
    }
}
