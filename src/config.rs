use std::env;
use std::path::PathBuf;

use crate::{policy, redirect::RedirectPaths};

/// Paths the shell serves itself; the login and access-denied pages must not
/// shadow them.
const RESERVED_PREFIXES: [&str; 3] = ["/auth/", "/swagger-ui", "/api-docs"];

/// AppConfig
///
/// Holds the portal's configuration. Immutable once loaded and shared through
/// the application state via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and storage requirements.
    pub env: Env,
    // Address the HTTP shell binds to.
    pub bind_addr: String,
    // File backing the persistent credential store. In-memory when None.
    pub storage_path: Option<PathBuf>,
    // Fallback destinations for the route guard.
    pub redirects: RedirectPaths,
}

/// Env
///
/// Runtime context: local development or production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Non-panicking configuration for tests: in-memory storage, default
    /// redirect targets, ephemeral bind address.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:0".to_string(),
            storage_path: None,
            redirects: RedirectPaths::default(),
        }
    }
}

/// validate_redirects
///
/// Rejects redirect targets the router could not mount: every target must be
/// an absolute path, and the two pages the shell serves itself (login and
/// access-denied) must be distinct, free of path parameters and clear of every
/// guarded route and built-in endpoint.
pub fn validate_redirects(redirects: &RedirectPaths) -> Result<(), String> {
    let targets = [
        ("LOGIN_PATH", &redirects.login),
        ("ADMIN_ROOT_PATH", &redirects.admin_root),
        ("TUTOR_DASHBOARD_PATH", &redirects.tutor_dashboard),
        ("ACCESS_DENIED_PATH", &redirects.access_denied),
    ];
    for (name, path) in targets {
        if !path.starts_with('/') {
            return Err(format!("{name} must start with '/', got {path:?}"));
        }
    }

    let served = [
        ("LOGIN_PATH", &redirects.login),
        ("ACCESS_DENIED_PATH", &redirects.access_denied),
    ];
    for (name, path) in served {
        if path.contains(['{', '}', '*']) {
            return Err(format!("{name} must be a literal path, got {path:?}"));
        }
        if path == "/health" || RESERVED_PREFIXES.iter().any(|p| path.starts_with(p)) {
            return Err(format!("{name} collides with a built-in endpoint: {path}"));
        }
        if let Some(entry) = policy::find_by_path(path) {
            return Err(format!("{name} collides with guarded route '{}': {path}", entry.route_key));
        }
    }

    if redirects.login == redirects.access_denied {
        return Err(format!(
            "LOGIN_PATH and ACCESS_DENIED_PATH must differ, both are {}",
            redirects.login
        ));
    }
    Ok(())
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (fail-fast).
    ///
    /// # Panics
    /// Panics in production when `PORTAL_STORAGE_PATH` is missing: a production
    /// portal must not silently lose every session on restart. Also panics when
    /// a redirect target fails `validate_redirects`.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()).as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let storage_path = match env {
            Env::Production => Some(PathBuf::from(
                env::var("PORTAL_STORAGE_PATH")
                    .expect("FATAL: PORTAL_STORAGE_PATH must be set in production."),
            )),
            Env::Local => env::var("PORTAL_STORAGE_PATH").ok().map(PathBuf::from),
        };

        let defaults = RedirectPaths::default();
        let redirects = RedirectPaths {
            login: var_or("LOGIN_PATH", &defaults.login),
            admin_root: var_or("ADMIN_ROOT_PATH", &defaults.admin_root),
            tutor_dashboard: var_or("TUTOR_DASHBOARD_PATH", &defaults.tutor_dashboard),
            access_denied: var_or("ACCESS_DENIED_PATH", &defaults.access_denied),
        };
        if let Err(reason) = validate_redirects(&redirects) {
            panic!("FATAL: {reason}");
        }

        Self {
            env,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            storage_path,
            redirects,
        }
    }
}
