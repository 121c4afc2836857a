//! 인가된 주체 조회 endpoint.

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::state::AppState;

/// 현재 주체 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct PrincipalResponse {
    pub principal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// 토큰 만료 시각 (Unix timestamp)
    pub expires_at: i64,
}

/// 현재 사용자 정보.
///
/// GET {api_prefix}/me
pub async fn current_principal(CurrentUser(ctx): CurrentUser) -> Json<PrincipalResponse> {
    Json(PrincipalResponse {
        principal: ctx.principal,
        role: ctx.role.map(String::from),
        jti: ctx.jti,
        expires_at: ctx.exp,
    })
}

/// 주체 라우터 생성.
///
/// - `GET {api_prefix}/me`: 인증만 필요
/// - `GET {api_prefix}/admin/me`: Admin 역할 필요
pub fn principal_router(api_prefix: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(&format!("{}/me", api_prefix), get(current_principal))
        .route(&format!("{}/admin/me", api_prefix), get(current_principal))
}
