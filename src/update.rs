//! Background check for newer releases
//!
//! At most once a day the latest GitHub release is fetched and compared with
//! the running version. The last check is recorded in `state.yml`. Every
//! failure here is swallowed by the caller; the notice is purely advisory.

use crate::client::create_http_client;
use crate::config::defaults::{NO_UPDATE_NOTIFIER_ENV, UPDATE_CHECK_INTERVAL_HOURS};
use crate::config::file::write_config_file;
use crate::config::Environment;
use anyhow::{Context as _, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Repository releases are published from
pub const RELEASE_REPO: &str = "kittycad/cli";

/// A published release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// Tag, e.g. `v0.4.0`
    pub tag_name: String,
    /// Release page
    pub html_url: String,
    /// Publication time
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Contents of `state.yml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    /// When the releases API was last asked
    pub checked_for_update_at: DateTime<Utc>,
    /// What it answered
    pub latest_release: ReleaseInfo,
}

/// Whether the check should run at all
///
/// Disabled by `KITTYCAD_NO_UPDATE_NOTIFIER`, on CI, and whenever stdout or
/// stderr is not a terminal.
pub fn should_check_for_update(env: &Environment, stdout_tty: bool, stderr_tty: bool) -> bool {
    if env.get(NO_UPDATE_NOTIFIER_ENV).is_some() {
        return false;
    }
    if is_ci(env) {
        return false;
    }
    stdout_tty && stderr_tty
}

fn is_ci(env: &Environment) -> bool {
    env.get("CI").is_some() || env.get("BUILD_NUMBER").is_some() || env.get("RUN_ID").is_some()
}

/// Newer release than `current_version`, if one exists and the check is due
pub async fn check_for_update(
    state_file: &Path,
    repo: &str,
    current_version: &str,
) -> Result<Option<ReleaseInfo>> {
    if let Some(state) = read_state(state_file) {
        if Utc::now() - state.checked_for_update_at < Duration::hours(UPDATE_CHECK_INTERVAL_HOURS) {
            debug!("update check ran recently, skipping");
            return Ok(None);
        }
    }

    let release = latest_release(repo).await?;
    write_state(state_file, Utc::now(), &release)?;

    if version_greater_than(&release.tag_name, current_version) {
        Ok(Some(release))
    } else {
        Ok(None)
    }
}

async fn latest_release(repo: &str) -> Result<ReleaseInfo> {
    let url = format!("https://api.github.com/repos/{repo}/releases/latest");
    let client = create_http_client()?;
    let response = client
        .get(&url)
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .with_context(|| format!("failed to fetch {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {} fetching {url}", response.status());
    }

    response
        .json::<ReleaseInfo>()
        .await
        .context("unexpected release payload")
}

fn read_state(path: &Path) -> Option<StateEntry> {
    let data = fs::read_to_string(path).ok()?;
    serde_yaml::from_str(&data).ok()
}

fn write_state(path: &Path, checked_at: DateTime<Utc>, release: &ReleaseInfo) -> Result<()> {
    let state = StateEntry {
        checked_for_update_at: checked_at,
        latest_release: release.clone(),
    };
    let contents = serde_yaml::to_string(&state)?;
    write_config_file(path, &contents)?;
    Ok(())
}

/// Whether release tag `v` is newer than the running version `w`
///
/// A `git describe` build such as `0.3.0-4-gabcdef12` counts as a pre-release
/// of the next patch, so a release of that patch is still offered.
pub fn version_greater_than(v: &str, w: &str) -> bool {
    let w = normalize_git_describe(w);
    match (parse_version(v), parse_version(&w)) {
        (Some(v), Some(w)) => v > w,
        _ => false,
    }
}

fn parse_version(v: &str) -> Option<semver::Version> {
    semver::Version::parse(v.trim().trim_start_matches('v')).ok()
}

fn normalize_git_describe(w: &str) -> String {
    let parts: Vec<&str> = w.rsplitn(3, '-').collect();
    let &[hash, count, base] = parts.as_slice() else {
        return w.to_string();
    };
    let is_hash = hash.len() == 9
        && hash.starts_with('g')
        && hash[1..].chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'));
    if !is_hash || count.is_empty() || !count.chars().all(|c| c.is_ascii_digit()) {
        return w.to_string();
    }

    let digits_start = base
        .rfind(|c: char| !c.is_ascii_digit())
        .map_or(0, |i| i + 1);
    match base[digits_start..].parse::<u64>() {
        Ok(n) => format!("{}{}-pre.0", &base[..digits_start], n + 1),
        Err(_) => w.to_string(),
    }
}

/// Notice printed after the command finishes
pub fn update_notice(current_version: &str, release: &ReleaseInfo) -> String {
    format!(
        "\nA new release of kittycad is available: {} → {}\n{}\n",
        current_version,
        release.tag_name.trim_start_matches('v'),
        release.html_url
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn version_comparison() {
        assert!(version_greater_than("v1.0.1", "1.0.0"));
        assert!(version_greater_than("1.1.0", "v1.0.9"));
        assert!(!version_greater_than("v1.0.0", "1.0.0"));
        assert!(!version_greater_than("v0.9.0", "1.0.0"));
        assert!(!version_greater_than("garbage", "1.0.0"));
    }

    #[test]
    fn git_describe_counts_as_next_prerelease() {
        assert_eq!(normalize_git_describe("1.2.3-4-gabcdef12"), "1.2.4-pre.0");
        assert_eq!(normalize_git_describe("v0.3.19-12-g0123abcd"), "v0.3.20-pre.0");
        assert_eq!(normalize_git_describe("1.2.3"), "1.2.3");
        assert_eq!(normalize_git_describe("1.2.3-rc.1"), "1.2.3-rc.1");

        assert!(version_greater_than("v1.2.4", "1.2.3-4-gabcdef12"));
        assert!(!version_greater_than("v1.2.3", "1.2.3-4-gabcdef12"));
    }

    #[test]
    fn disabled_by_env_and_ci() {
        let env = Environment::from_pairs([("KITTYCAD_NO_UPDATE_NOTIFIER", "1")]);
        assert!(!should_check_for_update(&env, true, true));

        let env = Environment::from_pairs([("CI", "true")]);
        assert!(!should_check_for_update(&env, true, true));

        let env = Environment::default();
        assert!(!should_check_for_update(&env, false, true));
        assert!(should_check_for_update(&env, true, true));
    }

    #[tokio::test]
    async fn recent_check_is_throttled() {
        let dir = TempDir::new().unwrap();
        let state_file = dir.path().join("state.yml");
        let release = ReleaseInfo {
            tag_name: "v99.0.0".to_string(),
            html_url: "https://github.com/kittycad/cli/releases/tag/v99.0.0".to_string(),
            published_at: None,
        };
        write_state(&state_file, Utc::now(), &release).unwrap();

        let result = check_for_update(&state_file, RELEASE_REPO, "0.1.0").await.unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn state_round_trips() {
        let dir = TempDir::new().unwrap();
        let state_file = dir.path().join("nested").join("state.yml");
        let release = ReleaseInfo {
            tag_name: "v1.0.0".to_string(),
            html_url: "https://example.com".to_string(),
            published_at: None,
        };
        let now = Utc::now();
        write_state(&state_file, now, &release).unwrap();

        let state = read_state(&state_file).unwrap();
        assert_eq!(state.latest_release, release);
        assert_eq!(state.checked_for_update_at, now);
    }

    #[test]
    fn notice_text() {
        let release = ReleaseInfo {
            tag_name: "v0.4.0".to_string(),
            html_url: "https://github.com/kittycad/cli/releases/tag/v0.4.0".to_string(),
            published_at: None,
        };
        assert_eq!(
            update_notice("0.3.0", &release),
            "\nA new release of kittycad is available: 0.3.0 → 0.4.0\nhttps://github.com/kittycad/cli/releases/tag/v0.4.0\n"
        );
    }
}
