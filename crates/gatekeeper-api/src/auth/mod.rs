//! 인증 및 권한 부여.
//!
//! 서명된 bearer 토큰 기반 인증과 역할 기반 접근 제어(RBAC)를 제공합니다.
//! 세션 저장소 없이 모든 요청에서 토큰을 다시 검증합니다.
//!
//! # 구성 요소
//!
//! - [`obtain_keys`]: 서명/검증 키 준비 (HMAC 또는 RSA 키 파일)
//! - [`TokenIssuer`]: 인증/리프레시 토큰 발급
//! - [`TokenValidator`]: 구조 → 서명 → 발급자 → 만료 순서의 검증
//! - [`Authorizer`]: 요청별 인가 인터셉터
//! - [`RefreshFlow`]: 리프레시 토큰으로 새 토큰 쌍 발급
//! - [`authorize_request`]: Axum 미들웨어
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(CurrentUser(ctx): CurrentUser) -> impl IntoResponse {
//!     format!("Hello, {}!", ctx.principal)
//! }
//! ```

pub mod claims;
mod context;
mod error;
pub mod interceptor;
pub mod issuer;
pub mod keys;
mod middleware;
mod refresh;
mod roles;
mod route_security;
mod user;
pub mod validator;

pub use claims::TokenClaims;
pub use context::{AuthorizationContext, CurrentUser};
pub use error::AuthorizationError;
pub use interceptor::{AuthState, Authorizer};
pub use issuer::{ExpiryPolicy, IssueError, TokenIssuer, TokenKind, TokenPair};
pub use keys::{obtain_keys, KeyKind, KeyMaterial, KeyMaterialError};
pub use middleware::authorize_request;
pub use refresh::{refresh_seed, RefreshFlow};
pub use roles::{Role, RouteSecurityRequirement};
pub use route_security::{RouteSecurityTable, TokenSource};
pub use user::{InMemoryUserStore, UserLookup, UserLookupError, UserRecord};
pub use validator::{peek_subject, TokenValidator, ValidationError};
