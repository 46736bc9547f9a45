//! Default configuration values, option registry and well-known names

/// Default API host
pub const DEFAULT_HOST: &str = "api.kittycad.io";

/// Directory name used under XDG-style base directories
pub const SHORTHAND_DIR: &str = "kittycad";

/// Directory name used under `AppData` / `LocalAppData` on Windows
pub const WINDOWS_DIR: &str = "KittyCAD CLI";

/// Main config document file name
pub const CONFIG_FILE_NAME: &str = "config.yml";

/// Hosts document file name
pub const HOSTS_FILE_NAME: &str = "hosts.yml";

/// Update-check state file name
pub const STATE_FILE_NAME: &str = "state.yml";

/// Source reported for values that never touched disk
pub const MEMORY_SOURCE: &str = "(memory)";

// Environment variables

/// Overrides the default host
pub const HOST_ENV: &str = "KITTYCAD_HOST";
/// Auth token, most specific
pub const TOKEN_ENV: &str = "KITTYCAD_TOKEN";
/// Auth token, consulted when `KITTYCAD_TOKEN` is empty
pub const API_TOKEN_ENV: &str = "KITTYCAD_API_TOKEN";
/// Overrides the config directory
pub const CONFIG_DIR_ENV: &str = "KITTYCAD_CONFIG_DIR";
/// Browser launcher override
pub const BROWSER_ENV: &str = "KITTYCAD_BROWSER";
/// Pager override
pub const PAGER_ENV: &str = "KITTYCAD_PAGER";
/// Forces terminal behaviour even when stdout is redirected
pub const FORCE_TTY_ENV: &str = "KITTYCAD_FORCE_TTY";
/// Disables the background update check
pub const NO_UPDATE_NOTIFIER_ENV: &str = "KITTYCAD_NO_UPDATE_NOTIFIER";

/// XDG config base directory
pub const XDG_CONFIG_HOME: &str = "XDG_CONFIG_HOME";
/// XDG state base directory
pub const XDG_STATE_HOME: &str = "XDG_STATE_HOME";
/// XDG data base directory
pub const XDG_DATA_HOME: &str = "XDG_DATA_HOME";
/// Roaming app data directory on Windows
pub const APP_DATA: &str = "AppData";
/// Local app data directory on Windows
pub const LOCAL_APP_DATA: &str = "LocalAppData";

/// Top-level key holding the per-host mappings in the merged tree
pub const HOSTS_KEY: &str = "hosts";

/// Top-level key holding aliases in the main document
pub const ALIASES_KEY: &str = "aliases";

/// Keys that only make sense per host and never fall back to global values
pub const HOST_ONLY_KEYS: &[&str] = &["token", "user"];

/// A registered global configuration option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigOption {
    /// Key as written in `config.yml`
    pub key: &'static str,
    /// Short description for `config --help`
    pub description: &'static str,
    /// Comment written above the key in a fresh config file
    pub comment: &'static str,
    /// Value returned when unset
    pub default_value: &'static str,
    /// Closed set of accepted values; empty means free text
    pub allowed_values: &'static [&'static str],
}

/// All registered global options, in the order `config list` prints them
pub static CONFIG_OPTIONS: &[ConfigOption] = &[
    ConfigOption {
        key: "prompt",
        description: "toggle interactive prompting in the terminal",
        comment: "When to interactively prompt. This is a global config that cannot be overridden by hostname.",
        default_value: "enabled",
        allowed_values: &["enabled", "disabled"],
    },
    ConfigOption {
        key: "pager",
        description: "the terminal pager program to send standard output to",
        comment: "A pager program to send command output to, e.g. \"less\". Set the value to \"cat\" to disable the pager.",
        default_value: "",
        allowed_values: &[],
    },
    ConfigOption {
        key: "browser",
        description: "the web browser to use for opening URLs",
        comment: "What web browser kittycad should use when opening URLs. If blank, will refer to environment.",
        default_value: "",
        allowed_values: &[],
    },
];

/// Comment written above the `aliases` key in a fresh config file
pub const ALIASES_COMMENT: &str = "Aliases allow you to create nicknames for kittycad commands";

/// Aliases present out of the box
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[("co", "file convert")];

/// Look up a registered option by key
pub fn option(key: &str) -> Option<&'static ConfigOption> {
    CONFIG_OPTIONS.iter().find(|o| o.key == key)
}

/// Default value for a key, empty when the key is not registered
pub fn default_for(key: &str) -> String {
    option(key)
        .map(|o| o.default_value.to_string())
        .unwrap_or_default()
}

/// Whether a key is scoped to hosts only
pub fn is_host_only(key: &str) -> bool {
    HOST_ONLY_KEYS.contains(&key)
}

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Minimum hours between update checks
pub const UPDATE_CHECK_INTERVAL_HOURS: i64 = 24;
