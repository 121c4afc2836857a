//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness, 인증 없음)
//! - `/health/ready` - 상세 헬스 체크 (readiness, 인증 없음)
//! - `/metrics` - Prometheus 메트릭 (인증 없음)
//! - `{api_prefix}/tokens/refresh` - 토큰 재발급 (`Refresh-Token` 헤더)
//! - `{api_prefix}/me` - 현재 사용자 (인증 필요)
//! - `{api_prefix}/admin/me` - 현재 사용자 (Admin 역할 필요)

pub mod health;
pub mod principal;
pub mod tokens;

pub use health::{health_router, HealthResponse};
pub use principal::{principal_router, PrincipalResponse};
pub use tokens::{refresh_tokens, tokens_router};

use axum::{
    extract::State,
    http::{Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::auth::{authorize_request, Role, RouteSecurityTable};
use crate::middleware::metrics_layer;
use crate::state::AppState;

/// 기본 라우트 보안 테이블.
///
/// 테이블에 없는 보호 라우트는 `default_role`을 요구합니다.
pub fn security_table(api_prefix: &str, default_role: &str) -> RouteSecurityTable {
    RouteSecurityTable::new(default_role)
        .public_route(Method::GET, format!("{}/me", api_prefix))
        .route(Method::GET, format!("{}/admin/me", api_prefix), Role::Admin)
}

/// Prometheus 메트릭 렌더링.
///
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}

/// 전체 API 라우터 생성.
///
/// 보호 라우트에는 `route_layer`로 인가 미들웨어를 붙여 라우트 템플릿
/// (`MatchedPath`)을 보안 테이블 키로 사용합니다.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    let api_prefix = state.config.server.api_prefix.clone();

    let protected = principal_router(&api_prefix)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authorize_request,
        ));

    Router::new()
        .nest("/health", health_router())
        .route("/metrics", get(metrics_handler))
        .nest(&format!("{}/tokens", api_prefix), tokens_router())
        .merge(protected)
        .layer(middleware::from_fn(metrics_layer))
        .with_state(state)
}
