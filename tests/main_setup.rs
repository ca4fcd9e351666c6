use portal_gate::{AppConfig, config::{Env, validate_redirects}, redirect::RedirectPaths};
use serial_test::serial;
use std::{env, panic, path::PathBuf};

const VARS: [&str; 7] = [
    "APP_ENV",
    "BIND_ADDR",
    "PORTAL_STORAGE_PATH",
    "LOGIN_PATH",
    "ADMIN_ROOT_PATH",
    "TUTOR_DASHBOARD_PATH",
    "ACCESS_DENIED_PATH",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with a clean slate for every portal variable and restores the
/// original environment afterwards, even if the test panics.
fn run_with_env<T, R>(set: &[(&str, &str)], test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> =
        VARS.iter().map(|&var| (var, env::var(var).ok())).collect();

    unsafe {
        for var in VARS {
            env::remove_var(var);
        }
        for (key, value) in set {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_requires_storage_path() {
    let result = run_with_env(&[("APP_ENV", "production")], || {
        panic::catch_unwind(AppConfig::load)
    });

    assert!(
        result.is_err(),
        "Production config loading should panic without PORTAL_STORAGE_PATH"
    );
}

#[test]
#[serial]
fn test_app_config_production_with_storage_path() {
    let config = run_with_env(
        &[("APP_ENV", "production"), ("PORTAL_STORAGE_PATH", "/var/lib/portal/storage.json")],
        AppConfig::load,
    );

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.storage_path, Some(PathBuf::from("/var/lib/portal/storage.json")));
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(&[("APP_ENV", "local")], AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    assert_eq!(config.storage_path, None);
    assert_eq!(config.redirects.login, "/login");
    assert_eq!(config.redirects.admin_root, "/admin");
    assert_eq!(config.redirects.tutor_dashboard, "/tutor/dashboard");
    assert_eq!(config.redirects.access_denied, "/access-denied");
}

#[test]
#[serial]
fn test_app_config_redirect_overrides() {
    let config = run_with_env(
        &[
            ("LOGIN_PATH", "/signin"),
            ("TUTOR_DASHBOARD_PATH", "/teach"),
            ("ADMIN_ROOT_PATH", "  "),
        ],
        AppConfig::load,
    );

    assert_eq!(config.redirects.login, "/signin");
    assert_eq!(config.redirects.tutor_dashboard, "/teach");
    // Blank values fall back to the default.
    assert_eq!(config.redirects.admin_root, "/admin");
}

#[test]
#[serial]
fn test_app_config_rejects_unmountable_redirects() {
    let cases: [&[(&str, &str)]; 5] = [
        &[("LOGIN_PATH", "login")],
        &[("ACCESS_DENIED_PATH", "/admin/users")],
        &[("LOGIN_PATH", "/health")],
        &[("LOGIN_PATH", "/auth/login")],
        &[("LOGIN_PATH", "/denied"), ("ACCESS_DENIED_PATH", "/denied")],
    ];

    for set in cases {
        let result = run_with_env(set, || panic::catch_unwind(AppConfig::load));
        let message = result
            .expect_err("config loading should fail fast")
            .downcast::<String>()
            .map(|m| *m)
            .unwrap_or_default();
        assert!(message.starts_with("FATAL:"), "{set:?}: {message}");
    }
}

#[test]
fn test_validate_redirects_accepts_defaults_and_literal_overrides() {
    assert!(validate_redirects(&RedirectPaths::default()).is_ok());

    let custom = RedirectPaths {
        login: "/signin".to_string(),
        access_denied: "/forbidden".to_string(),
        ..RedirectPaths::default()
    };
    assert!(validate_redirects(&custom).is_ok());

    let templated = RedirectPaths {
        access_denied: "/denied/{reason}".to_string(),
        ..RedirectPaths::default()
    };
    let err = validate_redirects(&templated).unwrap_err();
    assert!(err.contains("ACCESS_DENIED_PATH"));
}
