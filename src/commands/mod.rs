//! Command implementations
//!
//! Each submodule holds the handlers for one command group. Handlers write
//! through [`IoStreams`] so tests can capture what the user would see.

use crate::cli::{AliasCommand, AuthCommand, Commands, ConfigCommand, FileCommand, MetaCommand};
use crate::context::Context;
use crate::error::Result;
use crate::iostreams::IoStreams;

pub mod alias;
pub mod api;
pub mod auth;
pub mod completion;
pub mod config;

/// Run a parsed command
pub async fn run(ctx: &mut Context, command: Commands) -> Result<()> {
    match command {
        Commands::Auth(cmd) => match cmd {
            AuthCommand::Login {
                hostname,
                with_token,
            } => auth::login(ctx, hostname.as_deref(), with_token).await,
            AuthCommand::Logout { hostname } => {
                let (io, cfg) = ctx.io_and_config()?;
                auth::logout(io, cfg, hostname.as_deref())
            }
            AuthCommand::Status {
                hostname,
                show_token,
            } => auth::status(ctx, hostname.as_deref(), show_token).await,
        },
        Commands::Config(cmd) => {
            let (io, cfg) = ctx.io_and_config()?;
            match cmd {
                ConfigCommand::Get { key, host } => config::get(io, cfg, &key, host.as_deref()),
                ConfigCommand::Set { key, value, host } => {
                    config::set(io, cfg, &key, &value, host.as_deref())
                }
                ConfigCommand::List { host } => config::list(io, cfg, host.as_deref()),
            }
        }
        Commands::Alias(cmd) => {
            let (io, cfg) = ctx.io_and_config()?;
            match cmd {
                AliasCommand::Set {
                    name,
                    expansion,
                    shell,
                } => alias::set(io, cfg, &name, &expansion, shell),
                AliasCommand::List => alias::list(io, cfg),
                AliasCommand::Delete { name } => alias::delete(io, cfg, &name),
            }
        }
        Commands::File(FileCommand::Convert { input, to }) => {
            api::file_convert(ctx, &input, &to).await
        }
        Commands::File(FileCommand::Status { id }) => api::file_status(ctx, &id).await,
        Commands::Meta(MetaCommand::Session) => api::meta_session(ctx).await,
        Commands::Completion { shell } => completion::generate(&mut ctx.io, shell),
        Commands::Version => api::version(&mut ctx.io),
    }
}

/// Two-column output: aligned on a terminal, tab-separated otherwise
#[derive(Debug, Default)]
pub struct TablePrinter {
    rows: Vec<(String, String)>,
}

impl TablePrinter {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row
    pub fn add_row(&mut self, left: impl Into<String>, right: impl Into<String>) {
        self.rows.push((left.into(), right.into()));
    }

    /// Write every row to stdout
    pub fn render(&self, io: &mut IoStreams) -> std::io::Result<()> {
        let tty = io.is_stdout_tty();
        let width = self
            .rows
            .iter()
            .map(|(left, _)| left.chars().count())
            .max()
            .unwrap_or(0);

        let out = io.out();
        for (left, right) in &self.rows {
            if tty {
                writeln!(out, "{left:<width$} {right}")?;
            } else {
                writeln!(out, "{left}\t{right}")?;
            }
        }
        Ok(())
    }
}
