//! Configuration management for the KittyCAD CLI
//!
//! Global settings live in `config.yml`, per-host credentials in `hosts.yml`.
//! Both are loaded into one [`FileConfig`], which is wrapped in an
//! [`EnvConfig`] so exported tokens and hosts take precedence over what is on
//! disk. Everything else talks to the [`Config`] trait.

use crate::error::{CliError, Result};

pub mod alias;
pub mod auth;
pub mod defaults;
pub mod document;
pub mod env;
pub mod file;
pub mod hosts;
pub mod map;
pub mod paths;
pub mod stub;

pub use alias::{expand_alias, AliasConfig};
pub use auth::{auth_token_from_env, auth_token_provided_from_env, check_auth};
pub use defaults::{ConfigOption, CONFIG_OPTIONS, DEFAULT_HOST};
pub use env::{EnvConfig, Environment};
pub use file::FileConfig;
pub use hosts::validate_hostname;
pub use map::ConfigMap;
pub use paths::ConfigPaths;
pub use stub::Stub;

/// Read/write access to layered configuration
///
/// An empty `hostname` addresses the global section; any other value
/// addresses that host's entry.
pub trait Config: Send {
    /// Value for `key`, resolved through every layer
    fn get(&self, hostname: &str, key: &str) -> Result<String> {
        self.get_with_source(hostname, key).map(|(value, _)| value)
    }

    /// Value for `key` and a description of where it came from
    fn get_with_source(&self, hostname: &str, key: &str) -> Result<(String, String)>;

    /// Store a value in memory; call [`Config::write`] to persist it
    fn set(&mut self, hostname: &str, key: &str, value: &str) -> Result<()>;

    /// Forget everything stored for `hostname`
    fn unset_host(&mut self, hostname: &str);

    /// Hosts with stored settings
    fn hosts(&self) -> Result<Vec<String>>;

    /// Host used when none is given on the command line
    fn default_host(&self) -> Result<String> {
        self.default_host_with_source().map(|(host, _)| host)
    }

    /// Default host and where it came from
    fn default_host_with_source(&self) -> Result<(String, String)>;

    /// Alias section, writing through to this config
    fn aliases(&mut self) -> Result<AliasConfig<'_>>;

    /// Replace the alias section
    fn save_aliases(&mut self, aliases: &ConfigMap) -> Result<()>;

    /// Whether `key` for `hostname` can be changed by this program
    fn check_writeable(&self, hostname: &str, key: &str) -> Result<()>;

    /// Persist to disk
    fn write(&self) -> Result<()>;

    /// Main document as it would be written
    fn config_to_string(&self) -> Result<String> {
        Ok(String::new())
    }

    /// Hosts document as it would be written
    fn hosts_to_string(&self) -> Result<String> {
        Ok(String::new())
    }
}

/// Load the user's config from the resolved config directory, env overlay included
pub fn load_default(env: &Environment) -> Result<Box<dyn Config>> {
    let file = FileConfig::load(ConfigPaths::from_env(env))?;
    Ok(Box::new(EnvConfig::inherit_env(Box::new(file), env.clone())))
}

/// Reject keys that are not registered options
pub fn validate_key(key: &str) -> Result<()> {
    if defaults::option(key).is_some() {
        Ok(())
    } else {
        Err(CliError::UnknownKey(key.to_string()))
    }
}

/// Reject values outside a registered option's allow-list
///
/// Unknown keys and free-text options accept anything.
pub fn validate_value(key: &str, value: &str) -> Result<()> {
    let Some(opt) = defaults::option(key) else {
        return Ok(());
    };
    if opt.allowed_values.is_empty() || opt.allowed_values.contains(&value) {
        return Ok(());
    }
    Err(CliError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        valid_values: opt.allowed_values.iter().map(ToString::to_string).collect(),
    })
}

/// Long help text listing every option
pub fn options_help() -> String {
    let mut help = String::from(
        "Display or change configuration settings for kittycad.\n\nCurrent respected settings:\n",
    );
    for opt in CONFIG_OPTIONS {
        help.push_str(&format!("- {}: {}", opt.key, opt.description));
        if !opt.allowed_values.is_empty() {
            help.push_str(&format!(" {{{}}}", opt.allowed_values.join(" | ")));
        }
        if !opt.default_value.is_empty() {
            help.push_str(&format!(" (default: \"{}\")", opt.default_value));
        }
        help.push('\n');
    }
    help
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn known_keys_validate() {
        for opt in CONFIG_OPTIONS {
            assert!(validate_key(opt.key).is_ok());
        }
        assert_eq!(
            validate_key("unknownKey").unwrap_err(),
            CliError::UnknownKey("unknownKey".to_string())
        );
    }

    #[test]
    fn enumerated_values_are_enforced() {
        assert!(validate_value("prompt", "enabled").is_ok());
        assert!(validate_value("prompt", "disabled").is_ok());
        assert!(validate_value("pager", "anything at all").is_ok());
        assert!(validate_value("unknownKey", "x").is_ok());

        let err = validate_value("prompt", "invalid").unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to set \"prompt\" to \"invalid\": valid values are 'enabled', 'disabled'"
        );
    }

    #[test]
    fn help_lists_every_option() {
        let help = options_help();
        assert!(help.contains("- prompt: toggle interactive prompting in the terminal {enabled | disabled} (default: \"enabled\")"));
        assert!(help.contains("- pager:"));
        assert!(help.contains("- browser:"));
    }

    #[test]
    fn load_default_reads_config_dir_and_env() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("hosts.yml"),
            "example.com:\n    token: stored\n",
        )
        .unwrap();

        let env = Environment::from_pairs([
            ("KITTYCAD_CONFIG_DIR", dir.path().to_string_lossy().into_owned()),
            ("KITTYCAD_TOKEN", "from-env".to_string()),
        ]);
        let cfg = load_default(&env).unwrap();

        assert_eq!(cfg.hosts().unwrap(), vec!["api.kittycad.io", "example.com"]);
        assert_eq!(cfg.get("example.com", "token").unwrap(), "from-env");
        assert!(cfg.check_writeable("example.com", "token").is_err());
    }
}
