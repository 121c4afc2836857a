//! 리프레시 토큰으로 새 토큰 쌍 발급.

use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn, Instrument};

use super::claims::{self, TokenClaims};
use super::interceptor::{request_id_of, AuthState, Authorizer, Transitions};
use super::issuer::{TokenIssuer, TokenPair};
use super::route_security::TokenSource;
use super::AuthorizationError;
use crate::metrics::record_auth_decision;

/// 새 토큰에서 다시 계산되어야 하는 클레임.
const REISSUED_CLAIMS: [&str; 5] = [
    claims::ISSUED_AT,
    claims::EXPIRES_AT,
    claims::NOT_BEFORE,
    claims::TOKEN_ID,
    claims::TOKEN_KIND,
];

/// 리프레시 흐름.
///
/// 리프레시 헤더의 토큰을 검증(역할 검사 없음)한 뒤, 그 클레임을 씨앗으로
/// 설정된 기본 만료 시간의 새 토큰 쌍을 발급합니다.
#[derive(Debug, Clone)]
pub struct RefreshFlow {
    authorizer: Authorizer,
    issuer: Arc<TokenIssuer>,
    auth_expiry: Duration,
    refresh_expiry: Duration,
}

impl RefreshFlow {
    pub fn new(
        authorizer: Authorizer,
        issuer: Arc<TokenIssuer>,
        auth_expiry: Duration,
        refresh_expiry: Duration,
    ) -> Self {
        Self {
            authorizer,
            issuer,
            auth_expiry,
            refresh_expiry,
        }
    }

    /// 현재 시각 기준 리프레시.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<TokenPair, AuthorizationError> {
        self.refresh_at(headers, Utc::now()).await
    }

    /// 주어진 시각 기준 리프레시.
    pub async fn refresh_at(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthorizationError> {
        let request_id = request_id_of(headers);
        let span = gatekeeper_core::request_span!("refresh", request_id);

        async {
            let mut transitions = Transitions::start();
            let result = self.reissue(headers, now, &mut transitions).await;

            let outcome = match &result {
                Ok(_) => "refreshed",
                Err(err) => err.code(),
            };
            record_auth_decision(outcome, transitions.total_secs());
            result
        }
        .instrument(span)
        .await
    }

    async fn reissue(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
        transitions: &mut Transitions,
    ) -> Result<TokenPair, AuthorizationError> {
        let (user, claims) = self
            .authorizer
            .authenticate_at(headers, TokenSource::RefreshHeader, now.timestamp(), transitions)
            .await?;

        let seed = refresh_seed(claims);
        let pair = self
            .issuer
            .issue_token_pair_at(
                now,
                &user.username,
                self.authorizer.validator().issuer(),
                self.auth_expiry,
                self.refresh_expiry,
                seed.clone(),
                seed,
            )
            .map_err(|issue_err| {
                warn!(error = %issue_err, "Token pair re-issue failed");
                let err = AuthorizationError::from(issue_err);
                transitions.reject(&err, None);
                err
            })?;
        transitions.advance(AuthState::Authorized);

        info!(subject = %user.username, "Token pair refreshed");
        Ok(pair)
    }
}

/// 리프레시 토큰 클레임에서 새 토큰의 씨앗 클레임 생성.
pub fn refresh_seed(mut claims: TokenClaims) -> TokenClaims {
    for name in REISSUED_CLAIMS {
        claims.remove(name);
    }
    claims
}
