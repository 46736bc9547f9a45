//! Opening URLs in the user's web browser

use crate::config::defaults::BROWSER_ENV;
use crate::config::{Config, Environment};
use crate::error::{CliError, Result};
use std::process::Command;
use tracing::debug;

/// Browser launcher resolved from the environment and config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Browser {
    launcher: Option<String>,
}

impl Browser {
    /// `KITTYCAD_BROWSER`, then the `browser` setting, then `BROWSER`
    pub fn resolve(env: &Environment, cfg: &dyn Config) -> Self {
        let launcher = env
            .get(BROWSER_ENV)
            .map(ToString::to_string)
            .or_else(|| cfg.get("", "browser").ok().filter(|b| !b.is_empty()))
            .or_else(|| env.get("BROWSER").map(ToString::to_string));
        Self { launcher }
    }

    /// Launcher command line, when one is configured
    pub fn launcher(&self) -> Option<&str> {
        self.launcher.as_deref()
    }

    /// Open `url`
    ///
    /// A configured launcher is split shell-style and run with the URL as
    /// its last argument; otherwise the platform default handler is used.
    pub fn browse(&self, url: &str) -> Result<()> {
        let Some(launcher) = &self.launcher else {
            debug!(%url, "opening with system handler");
            return open::that(url)
                .map_err(|e| CliError::Io(format!("failed to open {url}: {e}")));
        };

        let argv = shlex::split(launcher)
            .ok_or_else(|| CliError::InvalidArgument(format!("could not parse browser: {launcher}")))?;
        let Some((program, args)) = argv.split_first() else {
            return Err(CliError::InvalidArgument("browser command is empty".to_string()));
        };
        let program = which::which(program)
            .map_err(|e| CliError::Io(format!("could not find browser {program}: {e}")))?;

        debug!(launcher = %program.display(), %url, "opening with configured browser");
        Command::new(program)
            .args(args)
            .arg(url)
            .spawn()
            .map_err(|e| CliError::Io(format!("failed to open {url}: {e}")))?;
        Ok(())
    }
}
