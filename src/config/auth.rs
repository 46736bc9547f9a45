//! Authentication state derived from the environment and stored hosts

use super::defaults::{API_TOKEN_ENV, TOKEN_ENV};
use super::env::Environment;
use super::Config;

/// Token supplied through the environment, with the variable it came from
///
/// `KITTYCAD_TOKEN` wins over `KITTYCAD_API_TOKEN`; empty values count as unset.
pub fn auth_token_from_env(env: &Environment) -> Option<(String, &'static str)> {
    [TOKEN_ENV, API_TOKEN_ENV]
        .into_iter()
        .find_map(|var| env.get(var).map(|token| (token.to_string(), var)))
}

/// Whether any token variable is set
#[must_use]
pub fn auth_token_provided_from_env(env: &Environment) -> bool {
    auth_token_from_env(env).is_some()
}

/// Whether the user can reach the API at all
///
/// True when a token is exported or any configured host carries a token.
pub fn check_auth(cfg: &dyn Config, env: &Environment) -> bool {
    if auth_token_provided_from_env(env) {
        return true;
    }

    let Ok(hosts) = cfg.hosts() else {
        return false;
    };

    hosts
        .iter()
        .any(|host| cfg.get(host, "token").is_ok_and(|token| !token.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::stub::Stub;

    #[test]
    fn authenticated_through_env() {
        let env = Environment::from_pairs([("KITTYCAD_API_TOKEN", "abc")]);
        assert_eq!(
            auth_token_from_env(&env),
            Some(("abc".to_string(), "KITTYCAD_API_TOKEN"))
        );
        assert!(check_auth(&Stub::new(), &env));
    }

    #[test]
    fn authenticated_through_stored_host() {
        let env = Environment::default();
        let cfg = Stub::new().with("api.kittycad.io", "token", "abc");
        assert!(check_auth(&cfg, &env));
    }

    #[test]
    fn not_authenticated() {
        let env = Environment::from_pairs([("KITTYCAD_TOKEN", "")]);
        assert!(!auth_token_provided_from_env(&env));
        assert!(!check_auth(&Stub::new(), &env));

        let cfg = Stub::new().with("api.kittycad.io", "user", "someone");
        assert!(!check_auth(&cfg, &env));
    }
}
