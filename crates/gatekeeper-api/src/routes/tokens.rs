//! 토큰 endpoint.
//!
//! 리프레시 토큰을 새 토큰 쌍으로 교환합니다. 이 라우트는 인가 미들웨어를
//! 거치지 않으며 [`RefreshFlow`](crate::auth::RefreshFlow)가 직접 검증합니다.

use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use std::sync::Arc;

use crate::auth::{AuthorizationError, TokenPair};
use crate::state::AppState;

/// 토큰 재발급.
///
/// GET {api_prefix}/tokens/refresh
///
/// `Refresh-Token: Bearer <token>` 헤더가 필요합니다.
pub async fn refresh_tokens(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TokenPair>, AuthorizationError> {
    let pair = state.refresh.refresh(&headers).await?;
    Ok(Json(pair))
}

/// 토큰 라우터 생성.
pub fn tokens_router() -> Router<Arc<AppState>> {
    Router::new().route("/refresh", get(refresh_tokens))
}
