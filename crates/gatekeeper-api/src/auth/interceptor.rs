//! 요청 인가 인터셉터.
//!
//! 요청 하나가 거치는 상태:
//!
//! ```text
//! Unauthenticated → TokenExtracted → UserResolved → TokenVerified → RoleChecked → Authorized
//!        └──────────────┴───────────────┴───────────────┴──────────────┴──→ Rejected
//! ```
//!
//! 각 전이는 소요 시간과 함께 요청 ID로 로그에 남습니다. 시간 측정은 결과에
//! 영향을 주지 않습니다.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::http::{request::Parts, HeaderMap};
use chrono::Utc;
use tracing::{debug, warn, Instrument};

use super::claims::TokenClaims;
use super::issuer::TokenKind;
use super::route_security::TokenSource;
use super::user::{UserLookup, UserRecord};
use super::validator::{peek_subject, TokenValidator};
use super::{AuthorizationContext, AuthorizationError, RouteSecurityRequirement};
use crate::metrics::record_auth_decision;

/// 요청 ID를 전달하는 헤더.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const BEARER_PREFIX: &str = "Bearer ";
const TOKEN_PREFIX_LOG_LEN: usize = 12;

/// 인가 파이프라인 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    TokenExtracted,
    UserResolved,
    TokenVerified,
    RoleChecked,
    Authorized,
    Rejected,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::TokenExtracted => "token_extracted",
            AuthState::UserResolved => "user_resolved",
            AuthState::TokenVerified => "token_verified",
            AuthState::RoleChecked => "role_checked",
            AuthState::Authorized => "authorized",
            AuthState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 상태 전이 기록기.
///
/// 전이마다 직전 상태 이후 경과 시간을 debug 로그로 남깁니다.
#[derive(Debug)]
pub(crate) struct Transitions {
    state: AuthState,
    started: Instant,
    last: Instant,
}

impl Transitions {
    pub(crate) fn start() -> Self {
        let now = Instant::now();
        Self {
            state: AuthState::Unauthenticated,
            started: now,
            last: now,
        }
    }

    pub(crate) fn advance(&mut self, next: AuthState) {
        let now = Instant::now();
        debug!(
            from = %self.state,
            to = %next,
            elapsed_us = now.duration_since(self.last).as_micros() as u64,
            "Auth state transition"
        );
        self.state = next;
        self.last = now;
    }

    pub(crate) fn reject(&mut self, error: &AuthorizationError, token: Option<&str>) {
        warn!(
            from = %self.state,
            code = error.code(),
            token_prefix = token.map(token_prefix).unwrap_or_default(),
            error = %error,
            "Request rejected"
        );
        self.advance(AuthState::Rejected);
    }

    pub(crate) fn total_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// 로그용 토큰 앞부분. 전체 토큰은 절대 남기지 않습니다.
pub fn token_prefix(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(TOKEN_PREFIX_LOG_LEN)
        .map(|(idx, _)| idx)
        .unwrap_or(token.len());
    &token[..end]
}

/// 요청 ID 헤더 값. 없으면 새로 생성합니다.
pub fn request_id_of(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// 토큰 검증과 역할 검사를 수행하는 인가기.
#[derive(Clone)]
pub struct Authorizer {
    validator: Arc<TokenValidator>,
    users: Arc<dyn UserLookup>,
    auth_header: String,
    refresh_header: String,
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("issuer", &self.validator.issuer())
            .field("auth_header", &self.auth_header)
            .field("refresh_header", &self.refresh_header)
            .finish_non_exhaustive()
    }
}

impl Authorizer {
    pub fn new(
        validator: Arc<TokenValidator>,
        users: Arc<dyn UserLookup>,
        auth_header: impl Into<String>,
        refresh_header: impl Into<String>,
    ) -> Self {
        Self {
            validator,
            users,
            auth_header: auth_header.into(),
            refresh_header: refresh_header.into(),
        }
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    fn header_name(&self, source: TokenSource) -> &str {
        match source {
            TokenSource::AuthHeader => &self.auth_header,
            TokenSource::RefreshHeader => &self.refresh_header,
        }
    }

    /// 헤더에서 Bearer 토큰 추출.
    pub fn extract_token<'h>(
        &self,
        headers: &'h HeaderMap,
        source: TokenSource,
    ) -> Result<&'h str, AuthorizationError> {
        let name = self.header_name(source);
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthorizationError::MissingOrMalformedHeader {
                header: name.to_string(),
            })
    }

    /// 현재 시각 기준으로 요청 인가.
    pub async fn authorize(
        &self,
        request: &mut Parts,
        route: &str,
        requirement: &RouteSecurityRequirement,
        source: TokenSource,
    ) -> Result<AuthorizationContext, AuthorizationError> {
        self.authorize_at(request, route, requirement, source, Utc::now().timestamp())
            .await
    }

    /// 주어진 시각(Unix timestamp) 기준으로 요청 인가.
    ///
    /// 성공하면 [`AuthorizationContext`]를 요청 extensions에 게시합니다.
    /// 요청 본문은 건드리지 않으므로 `Parts`만 받습니다.
    /// 이미 컨텍스트가 있는 요청은 헤더를 보지 않고 바로 통과시킵니다.
    pub async fn authorize_at(
        &self,
        request: &mut Parts,
        route: &str,
        requirement: &RouteSecurityRequirement,
        source: TokenSource,
        now: i64,
    ) -> Result<AuthorizationContext, AuthorizationError> {
        let request_id = request_id_of(&request.headers);
        let span = gatekeeper_core::request_span!("authorize", request_id, route);

        async {
            if let Some(existing) = request.extensions.get::<AuthorizationContext>() {
                debug!(principal = %existing.principal, "Request already authorized");
                return Ok(existing.clone());
            }

            let mut transitions = Transitions::start();
            let result = self
                .run(&request.headers, requirement, source, now, &mut transitions)
                .await;

            let outcome = match &result {
                Ok(_) => "authorized",
                Err(err) => err.code(),
            };
            record_auth_decision(outcome, transitions.total_secs());

            if let Ok(context) = &result {
                request.extensions.insert(context.clone());
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        headers: &HeaderMap,
        requirement: &RouteSecurityRequirement,
        source: TokenSource,
        now: i64,
        transitions: &mut Transitions,
    ) -> Result<AuthorizationContext, AuthorizationError> {
        let (_, claims) = self
            .authenticate_at(headers, source, now, transitions)
            .await?;

        let role = claims.role();
        if !requirement.is_satisfied_by(role.as_ref()) {
            let err = AuthorizationError::RoleMismatch {
                required: requirement.required_role().clone(),
                actual: role,
            };
            transitions.reject(&err, None);
            return Err(err);
        }
        transitions.advance(AuthState::RoleChecked);

        let context = AuthorizationContext {
            principal: claims.subject().unwrap_or_default().to_string(),
            role,
            jti: claims.token_id().map(str::to_string),
            exp: claims.expires_at().unwrap_or_default(),
        };
        transitions.advance(AuthState::Authorized);
        Ok(context)
    }

    /// 토큰 추출 → 사용자 조회 → 토큰 검증. 역할 검사는 하지 않습니다.
    pub(crate) async fn authenticate_at(
        &self,
        headers: &HeaderMap,
        source: TokenSource,
        now: i64,
        transitions: &mut Transitions,
    ) -> Result<(UserRecord, TokenClaims), AuthorizationError> {
        let token = match self.extract_token(headers, source) {
            Ok(token) => token,
            Err(err) => {
                transitions.reject(&err, None);
                return Err(err);
            }
        };
        transitions.advance(AuthState::TokenExtracted);

        let user = match self.resolve_user(token).await {
            Ok(user) => user,
            Err(err) => {
                transitions.reject(&err, Some(token));
                return Err(err);
            }
        };
        transitions.advance(AuthState::UserResolved);

        let claims = match self.verify(token, &user, source, now) {
            Ok(claims) => claims,
            Err(err) => {
                transitions.reject(&err, Some(token));
                return Err(err);
            }
        };
        transitions.advance(AuthState::TokenVerified);

        Ok((user, claims))
    }

    async fn resolve_user(&self, token: &str) -> Result<UserRecord, AuthorizationError> {
        let subject = peek_subject(token)?;
        match self.users.find_user(&subject).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AuthorizationError::UnknownSubject),
            Err(err) => {
                warn!(error = %err, "User lookup failed");
                Err(AuthorizationError::LookupUnavailable)
            }
        }
    }

    /// 서명·발급자·만료 검증 후 주체와 토큰 종류를 확인.
    ///
    /// 인증 헤더에는 인증 토큰만, 리프레시 헤더에는 리프레시 토큰만 허용합니다.
    fn verify(
        &self,
        token: &str,
        user: &UserRecord,
        source: TokenSource,
        now: i64,
    ) -> Result<TokenClaims, AuthorizationError> {
        let claims = self
            .validator
            .parse_and_verify_at(token, now)
            .map_err(|err| {
                debug!(error = %err, "Token validation failed");
                AuthorizationError::from(err)
            })?;
        if claims.subject() != Some(user.username.as_str()) {
            return Err(AuthorizationError::UnknownSubject);
        }

        let expected = expected_kind(source);
        if claims.token_kind().and_then(TokenKind::parse) != Some(expected) {
            return Err(AuthorizationError::TokenKindMismatch {
                expected: expected.as_str(),
                actual: claims.token_kind().map(str::to_string),
            });
        }
        Ok(claims)
    }
}

fn expected_kind(source: TokenSource) -> TokenKind {
    match source {
        TokenSource::AuthHeader => TokenKind::Auth,
        TokenSource::RefreshHeader => TokenKind::Refresh,
    }
}
