//! 서명된 bearer 토큰 기반 인증과 역할 기반 인가.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 토큰 발급 (인증 토큰 + 리프레시 토큰)
//! - 구조 → 서명 → 발급자 → 만료 순서의 토큰 검증
//! - 요청별 인가 인터셉터와 Axum 미들웨어
//! - 리프레시 흐름
//! - 헬스 체크 엔드포인트와 Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`auth`]: 키, 발급, 검증, 인가, 리프레시
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`error`]: 통합 에러 응답

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use auth::{
    AuthorizationContext, AuthorizationError, Authorizer, CurrentUser, KeyMaterial, RefreshFlow,
    Role, RouteSecurityRequirement, RouteSecurityTable, TokenClaims, TokenIssuer, TokenPair,
    TokenValidator, UserLookup, UserRecord,
};
pub use error::ApiErrorResponse;
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::{create_api_router, security_table};
pub use state::AppState;
