//! `kittycad auth login|logout|status`

use crate::client::{is_auth_failure, ApiClient};
use crate::config::defaults::DEFAULT_HOST;
use crate::config::{validate_hostname, Config};
use crate::context::Context;
use crate::error::{CliError, Result};
use crate::iostreams::IoStreams;
use dialoguer::{Confirm, Password, Select};
use tracing::{debug, warn};

const MASKED_TOKEN: &str = "*******************";

/// Store a token for a host
///
/// The token comes from stdin with `--with-token`, otherwise from an
/// interactive prompt. The account email is looked up and stored as `user`
/// when the API can be reached.
pub async fn login(ctx: &mut Context, hostname: Option<&str>, with_token: bool) -> Result<()> {
    if !with_token && !ctx.io.can_prompt() {
        return Err(CliError::InvalidArgument(
            "--with-token required when not running interactively".to_string(),
        ));
    }
    if let Some(h) = hostname {
        validate_hostname(h)
            .map_err(|e| CliError::InvalidArgument(format!("error parsing --hostname: {e}")))?;
    }

    let mut token = if with_token {
        ctx.io.read_stdin()?.trim().to_string()
    } else {
        String::new()
    };
    let interactive = ctx.io.can_prompt() && token.is_empty();

    let host = {
        let (io, cfg) = ctx.io_and_config()?;
        let host = match hostname {
            Some(h) => h.to_string(),
            None => cfg.default_host()?,
        };
        if let Err(e) = cfg.check_writeable(&host, "token") {
            return Err(env_token_guidance(
                io,
                e,
                "To have KittyCAD CLI store credentials instead, first clear the value from the environment.",
            )?);
        }
        host
    };

    if token.is_empty() {
        if !interactive {
            return Err(CliError::InvalidArgument(
                "no token found on standard input".to_string(),
            ));
        }
        match prompt_for_token(ctx, &host)? {
            Some(t) => token = t,
            None => return Ok(()),
        }
    }

    let email = match ApiClient::new(&host, &token)?.current_user_email().await {
        Ok(email) => Some(email),
        Err(e) if is_auth_failure(&e) => {
            return Err(CliError::Internal(format!(
                "the token was rejected by {host}: {e}"
            )));
        }
        Err(e) => {
            warn!(%host, error = %e, "could not look up the account email");
            None
        }
    };

    let (io, cfg) = ctx.io_and_config()?;
    cfg.set(&host, "token", &token)?;
    if let Some(email) = &email {
        cfg.set(&host, "user", email)?;
    }
    cfg.write()?;

    let icon = io.success_icon();
    match email {
        Some(email) => {
            let email = io.bold(&email);
            writeln!(io.err_out(), "{icon} Logged in as {email}")?;
        }
        None => {
            let host = io.bold(&host);
            writeln!(io.err_out(), "{icon} Logged in to {host}")?;
        }
    }
    Ok(())
}

fn prompt_for_token(ctx: &mut Context, host: &str) -> Result<Option<String>> {
    let existing = ctx.config()?.get(host, "token").unwrap_or_default();
    if !existing.is_empty() {
        let again = Confirm::new()
            .with_prompt(format!(
                "You're already logged into {host}. Do you want to re-authenticate?"
            ))
            .default(false)
            .interact()?;
        if !again {
            return Ok(None);
        }
    }

    let url = account_url(host);
    let choice = Select::new()
        .with_prompt("How would you like to authenticate KittyCAD CLI?")
        .items(&["Open the token page in a web browser", "Paste an authentication token"])
        .default(0)
        .interact()?;

    if choice == 0 {
        let browser = ctx.browser()?;
        writeln!(ctx.io.err_out(), "Opening {url} in your browser.")?;
        if let Err(e) = browser.browse(&url) {
            let icon = ctx.io.warning_icon();
            writeln!(ctx.io.err_out(), "{icon} {e}")?;
        }
    } else {
        writeln!(ctx.io.err_out(), "Tip: you can generate an API Token here {url}")?;
    }

    let token = Password::new()
        .with_prompt("Paste your authentication token")
        .interact()?;
    Ok(Some(token.trim().to_string()))
}

/// Page where API tokens for `host` are created
fn account_url(host: &str) -> String {
    if host == DEFAULT_HOST {
        "https://kittycad.io/account".to_string()
    } else {
        format!("{}/account", crate::client::base_url(host))
    }
}

/// Remove the stored credentials for a host
pub fn logout(io: &mut IoStreams, cfg: &mut dyn Config, hostname: Option<&str>) -> Result<()> {
    let candidates = cfg.hosts().unwrap_or_default();
    if candidates.is_empty() {
        return Err(CliError::Internal("not logged in to any hosts".to_string()));
    }

    let host = match hostname {
        Some(h) if candidates.iter().any(|c| c == h) => h.to_string(),
        Some(h) => return Err(CliError::Internal(format!("not logged into {h}"))),
        None if candidates.len() == 1 => candidates.into_iter().next().unwrap_or_default(),
        None if io.can_prompt() => {
            let index = Select::new()
                .with_prompt("What account do you want to log out of?")
                .items(&candidates[..])
                .default(0)
                .interact()?;
            candidates.get(index).cloned().ok_or(CliError::Cancelled)?
        }
        None => {
            return Err(CliError::InvalidArgument(
                "--hostname required when not running interactively".to_string(),
            ))
        }
    };

    if let Err(e) = cfg.check_writeable(&host, "token") {
        return Err(env_token_guidance(
            io,
            e,
            "To erase credentials stored in KittyCAD CLI, first clear the value from the environment.",
        )?);
    }

    let user = cfg.get(&host, "user").unwrap_or_default();
    let account = if user.is_empty() {
        String::new()
    } else {
        format!(" account '{user}'")
    };

    if io.can_prompt() {
        let sure = Confirm::new()
            .with_prompt(format!("Are you sure you want to log out of {host}{account}?"))
            .default(false)
            .interact()?;
        if !sure {
            return Ok(());
        }
    }

    cfg.unset_host(&host);
    cfg.write().map_err(|e| {
        CliError::Internal(format!(
            "failed to write config, authentication configuration not updated: {e}"
        ))
    })?;
    debug!(%host, "removed stored credentials");

    if io.is_stdin_tty() && io.is_stdout_tty() {
        let (icon, host) = (io.success_icon(), io.bold(&host));
        writeln!(io.err_out(), "{icon} Logged out of {host}{account}")?;
    }
    Ok(())
}

enum HostState {
    LoggedIn(String),
    NoToken,
    Rejected,
    Unreachable(CliError),
}

async fn check_host(host: &str, token: &str) -> HostState {
    if token.is_empty() {
        return HostState::NoToken;
    }
    let client = match ApiClient::new(host, token) {
        Ok(client) => client,
        Err(e) => return HostState::Unreachable(e),
    };
    match client.current_user_email().await {
        Ok(email) => HostState::LoggedIn(email),
        Err(e) if is_auth_failure(&e) => HostState::Rejected,
        Err(e) => HostState::Unreachable(e),
    }
}

/// Report, for every host or just `hostname`, whether its token works
///
/// Everything goes to stderr. Any failing host makes the command exit 1.
pub async fn status(ctx: &mut Context, hostname: Option<&str>, show_token: bool) -> Result<()> {
    let (io, cfg) = ctx.io_and_config()?;
    let hosts = cfg.hosts().unwrap_or_default();
    if hosts.is_empty() {
        let cmd = io.bold("kittycad auth login");
        writeln!(
            io.err_out(),
            "You are not logged into any KittyCAD hosts. Run {cmd} to authenticate."
        )?;
        return Err(CliError::Silent);
    }

    let selected: Vec<String> = hosts
        .into_iter()
        .filter(|h| hostname.is_none_or(|want| h.as_str() == want))
        .collect();
    if selected.is_empty() {
        writeln!(
            io.err_out(),
            "Hostname \"{}\" not found among authenticated KittyCAD hosts",
            hostname.unwrap_or_default()
        )?;
        return Err(CliError::Silent);
    }

    let mut failed = false;
    for host in selected {
        let (token, source) = cfg.get_with_source(&host, "token").unwrap_or_default();
        let writeable = cfg.check_writeable(&host, "token").is_ok();
        let state = check_host(&host, &token).await;

        let mut lines = Vec::new();
        match state {
            HostState::LoggedIn(email) => {
                lines.push(format!(
                    "{} Logged in to {host} as {} ({source})",
                    io.success_icon(),
                    io.bold(&email)
                ));
                let shown = if show_token { token.as_str() } else { MASKED_TOKEN };
                lines.push(format!("{} Token: {shown}", io.success_icon()));
            }
            HostState::NoToken => {
                failed = true;
                let reason = format!("- No token is stored for {}.", io.bold(&host));
                lines.extend(auth_failed_lines(io, &host, reason, writeable));
            }
            HostState::Rejected => {
                failed = true;
                let reason = format!("- The {} token in {source} is no longer valid.", io.bold(&host));
                lines.extend(auth_failed_lines(io, &host, reason, writeable));
            }
            HostState::Unreachable(e) => {
                failed = true;
                lines.push(format!("{} {host}: api call failed: {e}", io.failure_icon()));
            }
        }

        let heading = io.bold(&host);
        writeln!(io.err_out(), "{heading}")?;
        for line in lines {
            writeln!(io.err_out(), "  {line}")?;
        }
    }

    if failed {
        return Err(CliError::Silent);
    }
    Ok(())
}

fn auth_failed_lines(io: &IoStreams, host: &str, reason: String, writeable: bool) -> Vec<String> {
    let mut lines = vec![
        format!("{} {host}: authentication failed", io.failure_icon()),
        reason,
    ];
    if writeable {
        lines.push(format!(
            "- To re-authenticate, run: {} {}",
            io.bold("kittycad auth login -H"),
            io.bold(host)
        ));
        lines.push(format!(
            "- To forget about this host, run: {} {}",
            io.bold("kittycad auth logout -H"),
            io.bold(host)
        ));
    }
    lines
}

/// Explain a token that comes from the environment; other errors pass through
fn env_token_guidance(io: &mut IoStreams, err: CliError, advice: &str) -> Result<CliError> {
    let CliError::ReadOnlyEnv { variable } = &err else {
        return Ok(err);
    };
    writeln!(
        io.err_out(),
        "The value of the {variable} environment variable is being used for authentication."
    )?;
    writeln!(io.err_out(), "{advice}")?;
    Ok(CliError::Silent)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{ConfigPaths, EnvConfig, Environment, FileConfig, Stub};
    use crate::iostreams::TestBuffer;
    use std::fs;
    use tempfile::TempDir;

    fn context_with(cfg: Box<dyn Config>, env: Environment) -> (Context, TestBuffer, TestBuffer) {
        let (io, out, err) = IoStreams::test();
        (Context::with_config(io, env, cfg), out, err)
    }

    fn env_token() -> Environment {
        Environment::from_pairs([("KITTYCAD_TOKEN", "from-env")])
    }

    #[tokio::test]
    async fn login_requires_token_flag_when_not_interactive() {
        let (mut ctx, _, _) = context_with(Box::new(Stub::new()), Environment::default());
        let err = login(&mut ctx, None, false).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "--with-token required when not running interactively"
        );
    }

    #[tokio::test]
    async fn login_rejects_bad_hostname() {
        let (mut ctx, _, _) = context_with(Box::new(Stub::new()), Environment::default());
        let err = login(&mut ctx, Some("https://example.com/"), true).await.unwrap_err();
        assert!(err.to_string().starts_with("error parsing --hostname:"));
    }

    #[tokio::test]
    async fn login_refuses_when_env_token_active() {
        let env = env_token();
        let cfg = EnvConfig::inherit_env(Box::new(Stub::new()), env.clone());
        let (io, _, err) = IoStreams::test();
        let mut ctx = Context::with_config(io.with_stdin("abc\n"), env, Box::new(cfg));

        let result = login(&mut ctx, None, true).await.unwrap_err();
        assert_eq!(result, CliError::Silent);
        assert_eq!(
            err.contents(),
            "The value of the KITTYCAD_TOKEN environment variable is being used for authentication.\n\
             To have KittyCAD CLI store credentials instead, first clear the value from the environment.\n"
        );
    }

    #[tokio::test]
    async fn login_with_token_stores_it() {
        let dir = TempDir::new().unwrap();
        let cfg = FileConfig::from_yaml("", ConfigPaths::in_dir(dir.path())).unwrap();
        let (io, _, err) = IoStreams::test();
        let io = io.with_stdin("  sekrit\n");
        let mut ctx = Context::with_config(io, Environment::default(), Box::new(cfg));

        login(&mut ctx, Some("localhost:1"), true).await.unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("hosts.yml")).unwrap(),
            "localhost:1:\n    token: sekrit\n"
        );
        assert_eq!(err.contents(), "✓ Logged in to localhost:1\n");
    }

    #[tokio::test]
    async fn login_with_empty_stdin_fails() {
        let (mut ctx, _, _) = context_with(Box::new(Stub::new()), Environment::default());
        let err = login(&mut ctx, None, true).await.unwrap_err();
        assert_eq!(err.to_string(), "no token found on standard input");
    }

    #[test]
    fn logout_without_hosts() {
        let (mut io, _, _) = IoStreams::test();
        let err = logout(&mut io, &mut Stub::new(), None).unwrap_err();
        assert_eq!(err.to_string(), "not logged in to any hosts");
    }

    #[test]
    fn logout_unknown_host() {
        let (mut io, _, _) = IoStreams::test();
        let mut cfg = Stub::new().with("api.kittycad.io", "token", "abc");
        let err = logout(&mut io, &mut cfg, Some("example.com")).unwrap_err();
        assert_eq!(err.to_string(), "not logged into example.com");
    }

    #[test]
    fn logout_single_host() {
        let (mut io, _, err) = IoStreams::test();
        let mut cfg = Stub::new()
            .with("api.kittycad.io", "token", "abc")
            .with("api.kittycad.io", "user", "me@example.com");

        logout(&mut io, &mut cfg, None).unwrap();

        assert!(cfg.hosts().unwrap().is_empty());
        assert!(cfg.was_written());
        assert_eq!(err.contents(), "");
    }

    #[test]
    fn logout_needs_hostname_with_several_hosts() {
        let (mut io, _, _) = IoStreams::test();
        let mut cfg = Stub::new()
            .with("api.kittycad.io", "token", "abc")
            .with("localhost:8888", "token", "xyz");
        let err = logout(&mut io, &mut cfg, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "--hostname required when not running interactively"
        );
    }

    #[test]
    fn logout_refuses_env_token() {
        let (mut io, _, err) = IoStreams::test();
        let mut cfg = EnvConfig::inherit_env(Box::new(Stub::new()), env_token());

        let result = logout(&mut io, &mut cfg, None).unwrap_err();
        assert_eq!(result, CliError::Silent);
        assert!(err
            .contents()
            .contains("To erase credentials stored in KittyCAD CLI, first clear the value from the environment."));
    }

    #[test]
    fn logout_writes_hosts_file() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(dir.path());
        let mut cfg = FileConfig::from_yaml("", paths).unwrap();
        cfg.set("api.kittycad.io", "token", "abc").unwrap();
        cfg.set("localhost:8888", "token", "xyz").unwrap();
        let (mut io, _, _) = IoStreams::test();

        logout(&mut io, &mut cfg, Some("localhost:8888")).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("hosts.yml")).unwrap(),
            "api.kittycad.io:\n    token: abc\n"
        );
    }

    #[tokio::test]
    async fn status_without_hosts() {
        let (mut ctx, _, err) = context_with(Box::new(Stub::new()), Environment::default());
        let result = status(&mut ctx, None, false).await.unwrap_err();
        assert_eq!(result, CliError::Silent);
        assert_eq!(
            err.contents(),
            "You are not logged into any KittyCAD hosts. Run kittycad auth login to authenticate.\n"
        );
    }

    #[tokio::test]
    async fn status_unknown_hostname() {
        let cfg = Stub::new().with("api.kittycad.io", "token", "abc");
        let (mut ctx, _, err) = context_with(Box::new(cfg), Environment::default());
        let result = status(&mut ctx, Some("example.com"), false).await.unwrap_err();
        assert_eq!(result, CliError::Silent);
        assert_eq!(
            err.contents(),
            "Hostname \"example.com\" not found among authenticated KittyCAD hosts\n"
        );
    }

    #[tokio::test]
    async fn status_reports_missing_token() {
        let cfg = Stub::new()
            .with("localhost:1", "token", "")
            .with("localhost:1", "user", "me@example.com");
        let (mut ctx, _, err) = context_with(Box::new(cfg), Environment::default());

        let result = status(&mut ctx, None, false).await.unwrap_err();
        assert_eq!(result, CliError::Silent);
        assert_eq!(
            err.contents(),
            "localhost:1\n  X localhost:1: authentication failed\n  - No token is stored for localhost:1.\n  \
             - To re-authenticate, run: kittycad auth login -H localhost:1\n  \
             - To forget about this host, run: kittycad auth logout -H localhost:1\n"
        );
    }

    #[tokio::test]
    async fn status_reports_unreachable_host() {
        let cfg = Stub::new().with("localhost:1", "token", "abc");
        let (mut ctx, _, err) = context_with(Box::new(cfg), Environment::default());

        let result = status(&mut ctx, Some("localhost:1"), false).await.unwrap_err();
        assert_eq!(result, CliError::Silent);
        let err = err.contents();
        assert!(err.starts_with("localhost:1\n  X localhost:1: api call failed:"));
        assert!(!err.contains("abc"));
    }

    #[test]
    fn account_page() {
        assert_eq!(account_url("api.kittycad.io"), "https://kittycad.io/account");
        assert_eq!(account_url("localhost:8888"), "http://localhost:8888/account");
    }
}
