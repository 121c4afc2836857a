//! Axum 인가 미들웨어.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::metrics::normalize_path;
use crate::state::AppState;

/// 보호된 라우트 앞에서 인터셉터를 실행하는 미들웨어.
///
/// 라우트 식별자는 `MatchedPath`(라우트 템플릿)에서 얻으므로
/// `Router::route_layer`로 붙여야 합니다.
///
/// # 사용 예시
///
/// ```rust,ignore
/// let protected = Router::new()
///     .route("/api/v1/me", get(me))
///     .route_layer(middleware::from_fn_with_state(state.clone(), authorize_request));
/// ```
pub async fn authorize_request(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let route = parts
        .extensions
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| normalize_path(parts.uri.path()));

    let method = parts.method.clone();
    let requirement = state.routes.requirement_for(&method, &route);
    let source = state.routes.token_source_for(&method, &route);

    match state
        .authorizer
        .authorize(&mut parts, &route, requirement, source)
        .await
    {
        Ok(_) => next.run(Request::from_parts(parts, body)).await,
        Err(err) => err
            .to_api_error()
            .with_request_info(&parts.method, &parts.uri)
            .into_response_with(err.status()),
    }
}
