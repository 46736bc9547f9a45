//! `kittycad config get|set|list`

use crate::config::{validate_key, validate_value, Config, CONFIG_OPTIONS};
use crate::error::{CliError, Result};
use crate::iostreams::IoStreams;

/// Print the value of `key`, nothing when it is empty
pub fn get(io: &mut IoStreams, cfg: &dyn Config, key: &str, host: Option<&str>) -> Result<()> {
    validate_key(key)?;
    let value = cfg.get(host.unwrap_or_default(), key)?;
    if !value.is_empty() {
        writeln!(io.out(), "{value}")?;
    }
    Ok(())
}

/// Set `key` to `value` and write the config
///
/// Unknown keys only produce a warning; values outside an option's
/// allow-list are rejected.
pub fn set(
    io: &mut IoStreams,
    cfg: &mut dyn Config,
    key: &str,
    value: &str,
    host: Option<&str>,
) -> Result<()> {
    if validate_key(key).is_err() {
        let icon = io.warning_icon();
        writeln!(
            io.err_out(),
            "{icon} warning: '{key}' is not a known configuration key"
        )?;
    }
    validate_value(key, value)?;

    cfg.set(host.unwrap_or_default(), key, value)?;
    cfg.write()
        .map_err(|e| CliError::Internal(format!("failed to write config to disk: {e}")))
}

/// Print every registered option as `key=value`
pub fn list(io: &mut IoStreams, cfg: &dyn Config, host: Option<&str>) -> Result<()> {
    let host = match host.filter(|h| !h.is_empty()) {
        Some(h) => h.to_string(),
        None => cfg.default_host()?,
    };

    for opt in CONFIG_OPTIONS {
        let value = cfg.get(&host, opt.key)?;
        writeln!(io.out(), "{}={value}", opt.key)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{ConfigPaths, FileConfig, Stub};
    use tempfile::TempDir;

    #[test]
    fn get_prints_value() {
        let (mut io, out, _) = IoStreams::test();
        let cfg = Stub::new().with("", "pager", "less");
        get(&mut io, &cfg, "pager", None).unwrap();
        assert_eq!(out.contents(), "less\n");
    }

    #[test]
    fn get_prints_nothing_for_empty_value() {
        let (mut io, out, _) = IoStreams::test();
        let cfg = Stub::new().with("", "browser", "");
        get(&mut io, &cfg, "browser", None).unwrap();
        assert_eq!(out.contents(), "");
    }

    #[test]
    fn get_host_value() {
        let (mut io, out, _) = IoStreams::test();
        let cfg = Stub::new().with("example.com", "prompt", "disabled");
        get(&mut io, &cfg, "prompt", Some("example.com")).unwrap();
        assert_eq!(out.contents(), "disabled\n");
    }

    #[test]
    fn get_rejects_unknown_key() {
        let (mut io, _, _) = IoStreams::test();
        let err = get(&mut io, &Stub::new(), "unknownKey", None).unwrap_err();
        assert_eq!(err, CliError::UnknownKey("unknownKey".to_string()));
    }

    #[test]
    fn set_writes_config() {
        let (mut io, out, err) = IoStreams::test();
        let mut cfg = Stub::new();
        set(&mut io, &mut cfg, "prompt", "disabled", None).unwrap();
        assert_eq!(cfg.get("", "prompt").unwrap(), "disabled");
        assert!(cfg.was_written());
        assert_eq!(out.contents(), "");
        assert_eq!(err.contents(), "");
    }

    #[test]
    fn set_warns_on_unknown_key_but_proceeds() {
        let (mut io, _, err) = IoStreams::test();
        let mut cfg = Stub::new();
        set(&mut io, &mut cfg, "unknownKey", "someValue", None).unwrap();
        assert_eq!(
            err.contents(),
            "! warning: 'unknownKey' is not a known configuration key\n"
        );
        assert_eq!(cfg.get("", "unknownKey").unwrap(), "someValue");
        assert!(cfg.was_written());
    }

    #[test]
    fn set_rejects_invalid_value() {
        let (mut io, _, _) = IoStreams::test();
        let mut cfg = Stub::new();
        let err = set(&mut io, &mut cfg, "prompt", "invalid", None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to set \"prompt\" to \"invalid\": valid values are 'enabled', 'disabled'"
        );
        assert!(!cfg.was_written());
    }

    #[test]
    fn set_host_value_lands_in_hosts_file() {
        let dir = TempDir::new().unwrap();
        let (mut io, _, _) = IoStreams::test();
        let mut cfg = FileConfig::from_yaml("", ConfigPaths::in_dir(dir.path())).unwrap();
        set(&mut io, &mut cfg, "prompt", "disabled", Some("example.com")).unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("hosts.yml")).unwrap(),
            "example.com:\n    prompt: disabled\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("config.yml")).unwrap(),
            ""
        );
    }

    #[test]
    fn list_prints_every_option() {
        let dir = TempDir::new().unwrap();
        let (mut io, out, _) = IoStreams::test();
        let cfg = FileConfig::from_yaml(
            "prompt: disabled\npager: less\n",
            ConfigPaths::in_dir(dir.path()),
        )
        .unwrap();
        list(&mut io, &cfg, None).unwrap();
        assert_eq!(out.contents(), "prompt=disabled\npager=less\nbrowser=\n");
    }

    #[test]
    fn list_uses_host_overrides() {
        let dir = TempDir::new().unwrap();
        let (mut io, out, _) = IoStreams::test();
        let mut cfg = FileConfig::from_yaml("pager: less\n", ConfigPaths::in_dir(dir.path())).unwrap();
        cfg.set("example.com", "pager", "more").unwrap();
        list(&mut io, &cfg, Some("example.com")).unwrap();
        assert_eq!(out.contents(), "prompt=enabled\npager=more\nbrowser=\n");
    }
}
