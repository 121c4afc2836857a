//! Gatekeeper 데모 서버.
//!
//! 설정을 로드하고 키를 준비한 뒤, 보호된 라우트와 리프레시 엔드포인트를 제공합니다.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use gatekeeper_api::auth::{InMemoryUserStore, UserRecord};
use gatekeeper_api::{create_api_router, security_table, setup_metrics_recorder, AppState, TokenClaims};
use gatekeeper_core::{init_logging, AppConfig, GatekeeperError, LogConfig};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// 설정 파일 경로 환경 변수.
const CONFIG_PATH_ENV: &str = "GATEKEEPER_CONFIG";
/// 설정하면 데모 사용자 토큰 쌍을 표준 출력에 출력합니다.
const PRINT_DEMO_TOKENS_ENV: &str = "GATEKEEPER_PRINT_DEMO_TOKENS";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config/default.toml".to_string());
    let config = AppConfig::load(&config_path)?;

    init_logging(LogConfig::from(&config.logging).with_env_overrides())?;
    info!(config = %config_path, "Starting Gatekeeper API server...");

    let metrics_handle = setup_metrics_recorder()?;
    info!("Prometheus metrics recorder initialized");

    let routes = security_table(&config.server.api_prefix, &config.auth.default_route_role);
    let users = demo_users();
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::from_config(config, Arc::new(users), routes).map_err(|e| {
        error!(error = %e, fatal = e.is_startup_fatal(), "Failed to initialize application state");
        e
    })?;
    let state = Arc::new(state.with_metrics(metrics_handle));
    info!(routes = state.routes.len(), "Application state initialized");

    if std::env::var(PRINT_DEMO_TOKENS_ENV).is_ok() {
        print_demo_tokens(&state);
    }

    let app = create_api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| GatekeeperError::Config(format!("cannot bind {}: {}", addr, e)))?;
    info!(%addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!(error = %e, "Server terminated with error");
            GatekeeperError::Server(e.to_string())
        })?;

    info!("Server stopped gracefully");
    Ok(())
}

fn demo_users() -> InMemoryUserStore {
    InMemoryUserStore::new()
        .with_user(UserRecord::new("admin", "Admin", "admin"))
        .with_user(UserRecord::new("user", "User", "user"))
}

/// 데모 사용자 토큰 쌍 출력.
///
/// 로그에는 남기지 않고 표준 출력에만 씁니다.
fn print_demo_tokens(state: &AppState) {
    let (auth_expiry, refresh_expiry) = state.default_expiries();
    for (subject, role) in [("admin", "Admin"), ("user", "User")] {
        let claims = TokenClaims::new().with("rol", role);
        match state.issuer.issue_token_pair(
            subject,
            &state.config.auth.issuer,
            auth_expiry,
            refresh_expiry,
            claims.clone(),
            claims,
        ) {
            Ok(pair) => {
                println!("{} auth token:    {}", subject, pair.auth_token);
                println!("{} refresh token: {}", subject, pair.refresh_token);
            }
            Err(e) => warn!(subject, error = %e, "Failed to issue demo tokens"),
        }
    }
}

/// Graceful shutdown 시그널 대기.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
