use portal_gate::{AppConfig, AppState, config::Env, create_router, init_session};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point for the portal shell: configuration, logging, session
/// initialization, then the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "portal_gate=debug,tower_http=info,axum=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Portal starting in {:?} mode", config.env);

    // 3. Session (Loading -> Authenticated | Unauthenticated)
    let session = init_session(&config)
        .expect("FATAL: Failed to open the persistent store. Check PORTAL_STORAGE_PATH.");

    let snapshot = session.snapshot();
    tracing::info!(
        authenticated = snapshot.is_authenticated,
        storage = ?config.storage_path,
        "session initialized"
    );

    // 4. Router and server
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState {
        session: session.clone(),
        config,
    });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
        })
        .await;

    session.dispose();

    if let Err(e) = served {
        tracing::error!(error = %e, "server terminated with an error");
    }
}
