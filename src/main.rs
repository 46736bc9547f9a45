//! KittyCAD CLI
//!
//! Resolves configuration, expands aliases, dispatches the command and
//! prints a notice when a newer release is out.

use kittycad_cli::cli::{has_command, usage_for, Cli};
use kittycad_cli::config::{expand_alias, paths, Environment};
use kittycad_cli::context::Context;
use kittycad_cli::iostreams::IoStreams;
use kittycad_cli::update::{
    check_for_update, should_check_for_update, update_notice, ReleaseInfo, RELEASE_REPO,
};
use kittycad_cli::{commands, CliError, Result, VERSION};
use tokio::sync::oneshot;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const WELCOME: &str =
    "Welcome to KittyCAD CLI!\n\nTo authenticate, please run `kittycad auth login`.";

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    std::process::exit(exit_code);
}

async fn run() -> i32 {
    let args: Vec<String> = std::env::args_os()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let env = Environment::from_process();
    init_logging(&env, &args);

    let io = IoStreams::system(&env);
    let (update_tx, mut update_rx) = oneshot::channel::<ReleaseInfo>();
    if should_check_for_update(&env, io.is_stdout_tty(), io.is_stderr_tty()) {
        let state_file = paths::state_file(&env);
        tokio::spawn(async move {
            match check_for_update(&state_file, RELEASE_REPO, VERSION).await {
                Ok(Some(release)) => {
                    let _ = update_tx.send(release);
                }
                Ok(None) => {}
                Err(e) => debug!(error = %e, "update check failed"),
            }
        });
    }

    let mut ctx = Context::new(io, env);
    let exit_code = match execute(&mut ctx, args).await {
        Ok(code) => code,
        Err(err) => {
            if !err.is_silent() {
                let _ = writeln!(ctx.io.err_out(), "{err}");
            }
            err.exit_code()
        }
    };

    if let Ok(release) = update_rx.try_recv() {
        let notice = update_notice(VERSION, &release);
        let notice = ctx.io.yellow(&notice);
        let _ = write!(ctx.io.err_out(), "{notice}");
    }
    exit_code
}

/// Run one invocation and return the process exit code
async fn execute(ctx: &mut Context, args: Vec<String>) -> Result<i32> {
    if let Err(e) = ctx.configure_io() {
        writeln!(ctx.io.err_out(), "failed to read configuration:  {e}")?;
        return Err(CliError::Silent);
    }

    let user_args = args.get(1..).unwrap_or_default();
    let argv = if has_command(user_args) {
        args.clone()
    } else {
        let (expanded, is_shell) = expand_alias(ctx.config()?, &args)?;
        if ctx.env.get("DEBUG").is_some() {
            writeln!(ctx.io.err_out(), "{user_args:?} -> {expanded:?}")?;
        }
        if is_shell {
            return run_shell_alias(&expanded).await;
        }
        args.iter().take(1).cloned().chain(expanded).collect()
    };

    let cli = match Cli::try_parse_args(&argv) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return Ok(e.exit_code());
        }
    };
    debug!(verbose = cli.verbose, command = ?cli.command, "dispatching");

    if cli.command.requires_auth() && !ctx.is_authenticated()? {
        writeln!(ctx.io.err_out(), "{WELCOME}")?;
        return Err(CliError::AuthRequired);
    }

    match commands::run(ctx, cli.command).await {
        Ok(()) => Ok(0),
        Err(CliError::AuthRequired) => {
            let host = ctx.config()?.default_host()?;
            writeln!(
                ctx.io.err_out(),
                "not logged in to {host}\n\nTo authenticate, please run `kittycad auth login -H {host}`."
            )?;
            Err(CliError::AuthRequired)
        }
        Err(e) if e.wants_usage() => {
            let usage = usage_for(&argv);
            writeln!(ctx.io.err_out(), "{e}\n\n{usage}")?;
            Err(CliError::Silent)
        }
        Err(e) => Err(e),
    }
}

/// Run an expanded shell alias, passing its exit code through
async fn run_shell_alias(argv: &[String]) -> Result<i32> {
    let Some((program, rest)) = argv.split_first() else {
        return Ok(0);
    };
    let status = tokio::process::Command::new(program)
        .args(rest)
        .status()
        .await
        .map_err(|e| CliError::Io(format!("failed to run alias: {e}")))?;
    Ok(status.code().unwrap_or(1))
}

/// Log to stderr; `warn` by default, `debug` with `--verbose` or `DEBUG`
///
/// `RUST_LOG` replaces the filter entirely.
fn init_logging(env: &Environment, args: &[String]) {
    let verbose = args
        .iter()
        .skip(1)
        .take_while(|a| *a != "--")
        .any(|a| a == "-v" || a == "--verbose")
        || env.get("DEBUG").is_some();
    let default = if verbose {
        "kittycad_cli=debug,kittycad=debug,warn"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
