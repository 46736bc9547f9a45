//! Command aliases and their expansion

use super::map::ConfigMap;
use super::Config;
use crate::error::{CliError, Result};

/// Aliases loaded from the `aliases` section, writing through to the parent
///
/// The map is a copy; [`AliasConfig::add`] and [`AliasConfig::delete`] hand
/// the whole section back to the parent config and persist it immediately.
pub struct AliasConfig<'a> {
    map: ConfigMap,
    parent: &'a mut dyn Config,
}

impl std::fmt::Debug for AliasConfig<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasConfig").field("map", &self.map).finish_non_exhaustive()
    }
}

impl<'a> AliasConfig<'a> {
    /// Bind an alias section to the config it was read from
    pub fn new(map: ConfigMap, parent: &'a mut dyn Config) -> Self {
        Self { map, parent }
    }

    /// Expansion for `alias`, if defined and non-empty
    pub fn get(&self, alias: &str) -> Option<String> {
        self.map.get_string_value(alias).filter(|v| !v.is_empty())
    }

    /// Define or replace an alias and write the config to disk
    pub fn add(&mut self, alias: &str, expansion: &str) -> Result<()> {
        self.map.set_string_value(alias, expansion);
        self.persist()
    }

    /// Remove an alias and write the config to disk
    pub fn delete(&mut self, alias: &str) -> Result<()> {
        self.map.remove_entry(alias);
        self.persist()
    }

    /// All aliases in document order
    pub fn list(&self) -> Vec<(String, String)> {
        self.map.string_entries()
    }

    /// True when no aliases are defined
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn persist(&mut self) -> Result<()> {
        self.parent
            .save_aliases(&self.map)
            .map_err(|e| CliError::Alias(format!("failed to update config: {e}")))?;
        self.parent
            .write()
            .map_err(|e| CliError::Alias(format!("failed to write config: {e}")))
    }
}

/// Expand the first user argument if it names an alias
///
/// `args` is the full argv including the program name. Returns the expanded
/// arguments without the program name, and whether the alias is a shell alias
/// that should be run through `sh -c` rather than dispatched.
pub fn expand_alias(cfg: &mut dyn Config, args: &[String]) -> Result<(Vec<String>, bool)> {
    let rest: Vec<String> = args.iter().skip(1).cloned().collect();
    let Some(first) = rest.first() else {
        return Ok((rest, false));
    };

    let aliases = cfg.aliases()?;
    let Some(expansion) = aliases.get(first) else {
        return Ok((rest, false));
    };
    drop(aliases);

    tracing::debug!(alias = %first, %expansion, "expanding alias");
    let extra = &rest[1..];

    if let Some(body) = expansion.strip_prefix('!') {
        let mut expanded = vec![find_sh()?, "-c".to_string(), body.to_string()];
        if !extra.is_empty() {
            expanded.push("--".to_string());
            expanded.extend(extra.iter().cloned());
        }
        return Ok((expanded, true));
    }

    let mut line = expansion;
    let mut extra_args = Vec::new();
    for (i, arg) in extra.iter().enumerate() {
        let placeholder = format!("${}", i + 1);
        if line.contains(&placeholder) {
            line = line.replace(&placeholder, arg);
        } else if !line.contains('$') {
            extra_args.push(arg.clone());
        }
    }

    if has_placeholder(&line) {
        return Err(CliError::Alias(format!(
            "not enough arguments for alias: {line}"
        )));
    }

    let mut expanded = shlex::split(&line).ok_or_else(|| {
        CliError::Alias(format!("could not parse alias expansion: {line}"))
    })?;
    expanded.extend(extra_args);

    Ok((expanded, false))
}

fn has_placeholder(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes
        .windows(2)
        .any(|w| w[0] == b'$' && w[1].is_ascii_digit())
}

fn find_sh() -> Result<String> {
    which::which("sh")
        .map(|p| p.to_string_lossy().into_owned())
        .map_err(|e| CliError::Alias(format!("unable to locate sh to execute the shell alias with: {e}")))
}
