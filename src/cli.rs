//! Command-line interface argument parsing
//!
//! Defines all CLI commands and their arguments using Clap.

use crate::config::options_help;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// KittyCAD CLI - work with KittyCAD from the command line
#[derive(Parser, Debug)]
#[command(name = "kittycad")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Work seamlessly with KittyCAD from the command line")]
#[command(long_about = concat!(
    "KittyCAD CLI (v", env!("CARGO_PKG_VERSION"), ")\n",
    "Work seamlessly with KittyCAD from the command line.\n\n",
    "Start with 'kittycad auth login', then convert files with 'kittycad file convert'.\n",
    "Frequently used command lines can be shortened with 'kittycad alias set'."
))]
pub struct Cli {
    /// Print debug logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Login, logout, and get the status of your authentication
    #[command(subcommand, display_order = 1)]
    Auth(AuthCommand),

    /// Manage configuration for kittycad
    #[command(subcommand, display_order = 2)]
    Config(ConfigCommand),

    /// Create command shortcuts
    ///
    /// Aliases can be used to make shortcuts for kittycad commands or to
    /// compose multiple commands. Run "kittycad help alias set" to learn more.
    #[command(subcommand, display_order = 3)]
    Alias(AliasCommand),

    /// Convert CAD files and check on conversions
    #[command(subcommand, display_order = 4)]
    File(FileCommand),

    /// Metadata about the KittyCAD API and your session
    #[command(subcommand, display_order = 5)]
    Meta(MetaCommand),

    /// Generate shell completion scripts
    ///
    /// Examples:
    ///   eval "$(kittycad completion -s bash)"
    ///   kittycad completion -s zsh > /usr/local/share/zsh/site-functions/_kittycad
    ///   kittycad completion -s fish > ~/.config/fish/completions/kittycad.fish
    #[command(display_order = 6)]
    Completion {
        /// The shell type
        #[arg(short, long, value_enum, default_value_t = Shell::Bash)]
        shell: Shell,
    },

    /// Show version information
    #[command(display_order = 7)]
    Version,
}

/// `kittycad auth ...`
#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Authenticate with a KittyCAD host
    ///
    /// The default authentication mode is an interactive prompt for an API
    /// token. Alternatively, pass a token on standard input with --with-token.
    ///
    /// Examples:
    ///   kittycad auth login
    ///   kittycad auth login --with-token < mytoken.txt
    ///   kittycad auth login --hostname localhost:8888
    Login {
        /// The hostname of the KittyCAD instance to authenticate with
        #[arg(short = 'H', long)]
        hostname: Option<String>,

        /// Read token from standard input
        #[arg(long)]
        with_token: bool,
    },

    /// Log out of a KittyCAD host
    ///
    /// Removes the stored credentials for the host.
    Logout {
        /// The hostname of the KittyCAD instance to log out of
        #[arg(short = 'H', long)]
        hostname: Option<String>,
    },

    /// View authentication status
    ///
    /// Verifies and displays information about your authentication state.
    Status {
        /// Check a specific hostname's auth status
        #[arg(short = 'H', long)]
        hostname: Option<String>,

        /// Display the auth token
        #[arg(short = 't', long)]
        show_token: bool,
    },
}

/// `kittycad config ...`
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the value of a given configuration key
    ///
    /// Example:
    ///   kittycad config get prompt
    Get {
        /// Key to read
        key: String,

        /// Get per-host setting
        #[arg(short = 'H', long)]
        host: Option<String>,
    },

    /// Update configuration with a value for the given key
    ///
    /// Examples:
    ///   kittycad config set pager "less -R"
    ///   kittycad config set prompt disabled
    Set {
        /// Key to update
        key: String,

        /// New value
        value: String,

        /// Set per-host setting
        #[arg(short = 'H', long)]
        host: Option<String>,
    },

    /// Print a list of configuration keys and values
    #[command(visible_alias = "ls")]
    List {
        /// Get per-host configuration
        #[arg(short = 'H', long)]
        host: Option<String>,
    },
}

/// `kittycad alias ...`
#[derive(Subcommand, Debug)]
pub enum AliasCommand {
    /// Create a shortcut for a kittycad command
    ///
    /// The expansion may specify additional arguments and flags. If the
    /// expansion includes positional placeholders such as "$1", extra
    /// arguments that follow the alias will be inserted appropriately.
    /// Otherwise, extra arguments are appended to the expanded command.
    ///
    /// Use "-" as expansion argument to read the expansion string from
    /// standard input. This is useful to avoid quoting issues when defining
    /// an alias.
    ///
    /// If the expansion starts with "!" or if --shell was given, the
    /// expansion is a shell expression evaluated through the "sh"
    /// interpreter. This allows for chaining multiple commands via piping
    /// and redirection.
    ///
    /// Examples:
    ///   kittycad alias set co 'file convert'
    ///   kittycad alias set tostl 'file convert $1 --to stl'
    ///   kittycad alias set --shell igrep 'kittycad file status "$1" | grep "$2"'
    Set {
        /// Name of the alias
        name: String,

        /// Command line the alias expands to, or "-" to read from stdin
        #[arg(allow_hyphen_values = true)]
        expansion: String,

        /// Declare an alias to be passed through a shell interpreter
        #[arg(short, long)]
        shell: bool,
    },

    /// List your aliases
    #[command(visible_alias = "ls")]
    List,

    /// Delete an alias
    Delete {
        /// Name of the alias
        name: String,
    },
}

/// `kittycad file ...`
#[derive(Subcommand, Debug)]
pub enum FileCommand {
    /// Convert a CAD file to another format
    ///
    /// The source format is taken from the file extension.
    ///
    /// Example:
    ///   kittycad file convert part.obj --to stl
    Convert {
        /// File to convert
        input: PathBuf,

        /// Output format, e.g. stl, step, obj
        #[arg(short, long)]
        to: String,
    },

    /// Get the status of a file conversion
    Status {
        /// Conversion ID
        id: String,
    },
}

/// `kittycad meta ...`
#[derive(Subcommand, Debug)]
pub enum MetaCommand {
    /// Show details about your API session
    Session,
}

impl Commands {
    /// Whether the command talks to the API and therefore needs a token
    pub const fn requires_auth(&self) -> bool {
        matches!(self, Self::File(_) | Self::Meta(_))
    }
}

impl Cli {
    /// The full command tree, including help text built at runtime
    pub fn build_command() -> clap::Command {
        Self::command().mut_subcommand("config", |c| c.long_about(options_help()))
    }

    /// Parse `args` (program name first)
    ///
    /// Help and version requests come back as clap errors too; callers print
    /// them and exit with the code clap reports.
    pub fn try_parse_args<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::build_command().try_get_matches_from(args)?;
        Self::from_arg_matches(&matches)
    }
}

/// Whether the first argument names a built-in command
pub fn has_command(args: &[String]) -> bool {
    let Some(first) = args.first() else {
        return false;
    };
    first == "help" || Cli::build_command().find_subcommand(first).is_some()
}

/// Usage line of the deepest subcommand named in `args` (program name first)
pub fn usage_for(args: &[String]) -> String {
    let mut cmd = Cli::build_command();
    cmd.build();
    for word in args.iter().skip(1).filter(|a| !a.starts_with('-')) {
        let Some(sub) = cmd.find_subcommand(word).cloned() else {
            break;
        };
        cmd = sub;
    }
    cmd.render_usage().to_string()
}

/// Whether an alias expansion starts with a built-in command
pub fn is_valid_command(expansion: &str) -> bool {
    shlex::split(expansion).is_some_and(|args| has_command(&args))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::try_parse_args(["kittycad", "config", "set", "prompt", "disabled", "-H", "example.com"]).unwrap();
        match cli.command {
            Commands::Config(ConfigCommand::Set { key, value, host }) => {
                assert_eq!(key, "prompt");
                assert_eq!(value, "disabled");
                assert_eq!(host.as_deref(), Some("example.com"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn alias_expansion_may_be_stdin_dash() {
        let cli = Cli::try_parse_args(["kittycad", "alias", "set", "co", "-"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Alias(AliasCommand::Set { ref expansion, .. }) if expansion == "-"
        ));
    }

    #[test]
    fn command_detection() {
        let args = |list: &[&str]| list.iter().map(ToString::to_string).collect::<Vec<_>>();
        assert!(has_command(&args(&["file", "convert"])));
        assert!(has_command(&args(&["help"])));
        assert!(!has_command(&args(&["co"])));
        assert!(!has_command(&args(&[])));

        assert!(is_valid_command("file convert"));
        assert!(is_valid_command("auth status --show-token"));
        assert!(!is_valid_command("ls -la"));
        assert!(!is_valid_command("'unbalanced"));
    }

    #[test]
    fn usage_follows_subcommands() {
        let args = |list: &[&str]| list.iter().map(ToString::to_string).collect::<Vec<_>>();
        let usage = usage_for(&args(&["kittycad", "auth", "login", "--with-token"]));
        assert!(usage.contains("kittycad auth login"), "{usage}");

        let usage = usage_for(&args(&["kittycad", "nope"]));
        assert!(usage.contains("kittycad"), "{usage}");
    }

    #[test]
    fn config_help_lists_options() {
        let mut cmd = Cli::build_command();
        let config = cmd.find_subcommand_mut("config").unwrap();
        let help = config.render_long_help().to_string();
        assert!(help.contains("prompt"));
        assert!(help.contains("browser"));
    }

    #[test]
    fn api_commands_need_auth() {
        let cli = Cli::try_parse_args(["kittycad", "meta", "session"]).unwrap();
        assert!(cli.command.requires_auth());
        let cli = Cli::try_parse_args(["kittycad", "alias", "list"]).unwrap();
        assert!(!cli.command.requires_auth());
    }
}
