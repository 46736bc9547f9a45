//! Per-process state shared by every command

use crate::browser::Browser;
use crate::client::ApiClient;
use crate::config::defaults::PAGER_ENV;
use crate::config::{self, check_auth, Config, Environment};
use crate::error::Result;
use crate::iostreams::IoStreams;

type ConfigLoader = fn(&Environment) -> Result<Box<dyn Config>>;

/// Streams, environment and the lazily loaded config
///
/// The config is loaded on first use and the outcome, success or failure,
/// is kept for the rest of the process.
pub struct Context {
    /// Terminal streams
    pub io: IoStreams,
    /// Environment snapshot
    pub env: Environment,
    config: Option<Result<Box<dyn Config>>>,
    loader: ConfigLoader,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("io", &self.io)
            .field("config_loaded", &self.config.is_some())
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Context that loads the user's config from disk on first use
    pub fn new(io: IoStreams, env: Environment) -> Self {
        Self {
            io,
            env,
            config: None,
            loader: config::load_default,
        }
    }

    /// Context with a ready-made config
    pub fn with_config(io: IoStreams, env: Environment, config: Box<dyn Config>) -> Self {
        Self {
            io,
            env,
            config: Some(Ok(config)),
            loader: config::load_default,
        }
    }

    /// The config, loading it on first call
    pub fn config(&mut self) -> Result<&mut dyn Config> {
        self.parts().map(|(_, _, cfg)| cfg)
    }

    /// Streams and config borrowed together
    pub fn io_and_config(&mut self) -> Result<(&mut IoStreams, &mut dyn Config)> {
        self.parts().map(|(io, _, cfg)| (io, cfg))
    }

    fn parts(&mut self) -> Result<(&mut IoStreams, &Environment, &mut dyn Config)> {
        let env = &self.env;
        let loader = self.loader;
        match self.config.get_or_insert_with(|| loader(env)) {
            Ok(cfg) => Ok((&mut self.io, env, cfg.as_mut())),
            Err(e) => Err(e.clone()),
        }
    }

    /// Apply config-driven terminal settings: prompting and the pager
    ///
    /// `KITTYCAD_PAGER` wins over the `pager` setting, which wins over `PAGER`.
    pub fn configure_io(&mut self) -> Result<()> {
        let (prompt, pager_setting) = {
            let cfg = self.config()?;
            (
                cfg.get("", "prompt").unwrap_or_default(),
                cfg.get("", "pager").unwrap_or_default(),
            )
        };

        if prompt == "disabled" {
            self.io.set_never_prompt(true);
        }

        let pager = self
            .env
            .lookup(PAGER_ENV)
            .map(ToString::to_string)
            .or_else(|| Some(pager_setting).filter(|p| !p.is_empty()))
            .or_else(|| self.env.get("PAGER").map(ToString::to_string));
        self.io.set_pager(pager);
        Ok(())
    }

    /// Whether a token is available from the environment or a stored host
    pub fn is_authenticated(&mut self) -> Result<bool> {
        let (_, env, cfg) = self.parts()?;
        Ok(check_auth(cfg, env))
    }

    /// Browser launcher for this user
    pub fn browser(&mut self) -> Result<Browser> {
        let (_, env, cfg) = self.parts()?;
        Ok(Browser::resolve(env, cfg))
    }

    /// API client for `hostname`, or the default host
    pub fn api_client(&mut self, hostname: Option<&str>) -> Result<ApiClient> {
        let cfg = self.config()?;
        ApiClient::from_config(cfg, hostname)
    }
}
