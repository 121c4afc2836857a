//! 요청 범위 보안 컨텍스트.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthorizationError, Role};

/// 인가에 성공한 요청의 주체 정보.
///
/// 요청 extensions에만 저장되며 요청과 함께 사라집니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationContext {
    /// 인증된 사용자 이름 (`sub`)
    pub principal: String,
    /// 토큰 역할. `rol` 클레임이 없으면 `None`
    pub role: Option<Role>,
    /// 토큰 ID (`jti`)
    pub jti: Option<String>,
    /// 만료 시각 (Unix timestamp)
    pub exp: i64,
}

/// 핸들러에서 인가된 사용자를 꺼내는 추출기.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn whoami(CurrentUser(ctx): CurrentUser) -> String {
///     ctx.principal
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthorizationContext);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthorizationError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthorizationContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthorizationError::MissingOrMalformedHeader {
                header: "Authorization".to_string(),
            })
    }
}
