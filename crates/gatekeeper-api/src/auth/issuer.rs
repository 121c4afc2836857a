//! 토큰 발급.
//!
//! 인증 토큰과 리프레시 토큰을 만들고, 만료 시간 보정과 기본 클레임 채우기를
//! 담당합니다. 서명 알고리즘은 키 종류에 따라 생성 시점에 고정됩니다.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::claims::{self, TokenClaims};
use super::{KeyMaterial, Role};

pub const EXPIRE_IN_ONE_MINUTE: Duration = Duration::minutes(1);
pub const EXPIRE_IN_FIVE_MINUTES: Duration = Duration::minutes(5);
pub const EXPIRE_IN_TEN_MINUTES: Duration = Duration::minutes(10);
pub const EXPIRE_IN_THIRTY_MINUTES: Duration = Duration::minutes(30);
pub const EXPIRE_IN_ONE_HOUR: Duration = Duration::hours(1);
pub const EXPIRE_IN_EIGHT_HOURS: Duration = Duration::hours(8);
pub const EXPIRE_IN_ONE_DAY: Duration = Duration::days(1);
pub const EXPIRE_IN_ONE_WEEK: Duration = Duration::days(7);
pub const EXPIRE_IN_ONE_MONTH: Duration = Duration::days(30);
pub const EXPIRE_IN_ONE_YEAR: Duration = Duration::days(365);

/// 토큰 종류. 만료 시간 보정 규칙이 다릅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// 짧은 수명의 접근 토큰
    Auth,
    /// 새 인증 토큰을 받기 위한 긴 수명의 토큰
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Auth => "auth",
            TokenKind::Refresh => "refresh",
        }
    }

    /// `tkn` 클레임 값 파싱.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "auth" => Some(TokenKind::Auth),
            "refresh" => Some(TokenKind::Refresh),
            _ => None,
        }
    }
}

/// 만료 시간 보정 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// 리프레시 토큰 최소 수명이자 인증 토큰 수명 상한
    pub refresh_floor: Duration,
    /// 인증 토큰 수명이 상한을 넘을 때 대신 쓰는 짧은 수명
    pub auth_fallback: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            refresh_floor: EXPIRE_IN_THIRTY_MINUTES,
            auth_fallback: EXPIRE_IN_FIVE_MINUTES,
        }
    }
}

impl ExpiryPolicy {
    /// 보정된 만료 시간 반환.
    ///
    /// - 인증 토큰: 상한(`refresh_floor`)을 넘으면 `auth_fallback`으로 대체
    /// - 리프레시 토큰: `refresh_floor`보다 짧으면 `refresh_floor`로 올림
    pub fn clamp(&self, kind: TokenKind, requested: Duration) -> Duration {
        match kind {
            TokenKind::Auth if requested > self.refresh_floor => self.auth_fallback,
            TokenKind::Refresh if requested < self.refresh_floor => self.refresh_floor,
            _ => requested,
        }
    }
}

/// 인증 토큰 + 리프레시 토큰 쌍.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// 인증 토큰
    pub auth_token: String,
    /// 리프레시 토큰
    pub refresh_token: String,
    /// 인증 토큰 수명 (초)
    pub expires_in: i64,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
}

/// 토큰 발급 에러.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("토큰 만료 시간은 1초 이상이어야 합니다: {0}초")]
    NonPositiveExpiry(i64),
    #[error("토큰 만료 시각을 계산할 수 없습니다: {0}초")]
    ExpiryOverflow(i64),
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// 서명된 토큰 발급기.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    keys: Arc<KeyMaterial>,
    policy: ExpiryPolicy,
    audience: String,
}

impl TokenIssuer {
    /// 새 발급기 생성.
    ///
    /// * `audience` - `aud` 클레임이 없을 때 채우는 기본값 (서비스 이름)
    pub fn new(keys: Arc<KeyMaterial>, policy: ExpiryPolicy, audience: impl Into<String>) -> Self {
        Self {
            keys,
            policy,
            audience: audience.into(),
        }
    }

    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    /// 키 종류로 결정된 서명 알고리즘.
    pub fn algorithm(&self) -> Algorithm {
        self.keys.algorithm()
    }

    /// 현재 시각 기준으로 토큰 발급.
    pub fn issue(
        &self,
        kind: TokenKind,
        subject: &str,
        issuer: &str,
        expiry: Duration,
        claims: TokenClaims,
    ) -> Result<String, IssueError> {
        self.issue_at(Utc::now(), kind, subject, issuer, expiry, claims)
    }

    /// 주어진 발급 시각 기준으로 토큰 발급.
    ///
    /// 호출자 클레임은 그대로 유지하고 `aud`, `jti`, `rol`이 없으면 채웁니다.
    /// `sub`/`iss`/`tkn`은 인자 값으로, `iat`/`exp`는 항상 새로 계산한 값으로 설정됩니다.
    pub fn issue_at(
        &self,
        now: DateTime<Utc>,
        kind: TokenKind,
        subject: &str,
        issuer: &str,
        expiry: Duration,
        mut claims: TokenClaims,
    ) -> Result<String, IssueError> {
        let effective = self.policy.clamp(kind, expiry);
        if effective != expiry {
            warn!(
                kind = kind.as_str(),
                requested_secs = expiry.num_seconds(),
                effective_secs = effective.num_seconds(),
                "Token expiry adjusted by policy"
            );
        }
        // iat/exp는 초 단위로 잘리므로 1초 미만이면 발급 즉시 만료
        if effective.num_seconds() < 1 {
            return Err(IssueError::NonPositiveExpiry(effective.num_seconds()));
        }

        claims.insert_if_absent(claims::AUDIENCE, || json!(self.audience));
        claims.insert_if_absent(claims::TOKEN_ID, || {
            json!(uuid::Uuid::new_v4().to_string())
        });
        claims.insert_if_absent(claims::ROLE, || json!(Role::User.as_str()));
        claims.insert(claims::SUBJECT, subject);
        claims.insert(claims::ISSUER, issuer);
        claims.insert(claims::TOKEN_KIND, kind.as_str());

        let issued_at = now.timestamp();
        let expires_at = now
            .checked_add_signed(effective)
            .ok_or(IssueError::ExpiryOverflow(effective.num_seconds()))?
            .timestamp();
        claims.insert(claims::ISSUED_AT, issued_at);
        claims.insert(claims::EXPIRES_AT, expires_at);

        let token = encode(
            &Header::new(self.keys.algorithm()),
            &claims,
            self.keys.encoding_key(),
        )?;

        debug!(
            kind = kind.as_str(),
            subject,
            jti = claims.token_id().unwrap_or_default(),
            expires_at,
            "Token issued"
        );
        Ok(token)
    }

    /// 인증 토큰 + 리프레시 토큰 쌍 발급.
    ///
    /// 두 토큰은 같은 서명 키를 쓰는 것 외에는 서로 독립적입니다.
    pub fn issue_token_pair(
        &self,
        subject: &str,
        issuer: &str,
        auth_expiry: Duration,
        refresh_expiry: Duration,
        auth_claims: TokenClaims,
        refresh_claims: TokenClaims,
    ) -> Result<TokenPair, IssueError> {
        self.issue_token_pair_at(
            Utc::now(),
            subject,
            issuer,
            auth_expiry,
            refresh_expiry,
            auth_claims,
            refresh_claims,
        )
    }

    /// 주어진 발급 시각 기준으로 토큰 쌍 발급.
    #[allow(clippy::too_many_arguments)]
    pub fn issue_token_pair_at(
        &self,
        now: DateTime<Utc>,
        subject: &str,
        issuer: &str,
        auth_expiry: Duration,
        refresh_expiry: Duration,
        auth_claims: TokenClaims,
        refresh_claims: TokenClaims,
    ) -> Result<TokenPair, IssueError> {
        let auth_token = self.issue_at(now, TokenKind::Auth, subject, issuer, auth_expiry, auth_claims)?;
        let refresh_token = self.issue_at(
            now,
            TokenKind::Refresh,
            subject,
            issuer,
            refresh_expiry,
            refresh_claims,
        )?;

        Ok(TokenPair {
            auth_token,
            refresh_token,
            expires_in: self.policy.clamp(TokenKind::Auth, auth_expiry).num_seconds(),
            token_type: "Bearer".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use chrono::TimeZone;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn issuer() -> TokenIssuer {
        let keys = Arc::new(KeyMaterial::symmetric(TEST_SECRET).unwrap());
        TokenIssuer::new(keys, ExpiryPolicy::default(), "payments")
    }

    fn payload(token: &str) -> serde_json::Value {
        let segment = token.split('.').nth(1).unwrap();
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(segment)
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn header(token: &str) -> serde_json::Value {
        let segment = token.split('.').next().unwrap();
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(segment)
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_auth_expiry_above_floor_falls_back() {
        let policy = ExpiryPolicy::default();
        assert_eq!(policy.clamp(TokenKind::Auth, EXPIRE_IN_ONE_HOUR), EXPIRE_IN_FIVE_MINUTES);
        assert_eq!(policy.clamp(TokenKind::Auth, EXPIRE_IN_TEN_MINUTES), EXPIRE_IN_TEN_MINUTES);
        assert_eq!(
            policy.clamp(TokenKind::Auth, EXPIRE_IN_THIRTY_MINUTES),
            EXPIRE_IN_THIRTY_MINUTES
        );
    }

    #[test]
    fn test_refresh_expiry_below_floor_is_raised() {
        let policy = ExpiryPolicy::default();
        assert_eq!(
            policy.clamp(TokenKind::Refresh, EXPIRE_IN_ONE_MINUTE),
            EXPIRE_IN_THIRTY_MINUTES
        );
        assert_eq!(policy.clamp(TokenKind::Refresh, EXPIRE_IN_ONE_DAY), EXPIRE_IN_ONE_DAY);
    }

    #[test]
    fn test_defaults_filled_and_timestamps_computed() {
        let now = Utc::now();
        let token = issuer()
            .issue_at(
                now,
                TokenKind::Auth,
                "jane.doe",
                "org-a",
                EXPIRE_IN_FIVE_MINUTES,
                TokenClaims::new().with("did", "device-1"),
            )
            .unwrap();

        let body = payload(&token);
        assert_eq!(body["sub"], "jane.doe");
        assert_eq!(body["iss"], "org-a");
        assert_eq!(body["aud"], "payments");
        assert_eq!(body["rol"], "User");
        assert_eq!(body["did"], "device-1");
        assert_eq!(body["iat"], now.timestamp());
        assert_eq!(body["exp"], now.timestamp() + 300);
        assert!(body["jti"].as_str().is_some_and(|jti| !jti.is_empty()));
        assert_eq!(header(&token)["alg"], "HS512");
    }

    #[test]
    fn test_caller_claims_are_not_overwritten() {
        let token = issuer()
            .issue(
                TokenKind::Auth,
                "jane.doe",
                "org-a",
                EXPIRE_IN_FIVE_MINUTES,
                TokenClaims::new()
                    .with("aud", "microservices")
                    .with("jti", "fixed-id")
                    .with("rol", "Admin"),
            )
            .unwrap();

        let body = payload(&token);
        assert_eq!(body["aud"], "microservices");
        assert_eq!(body["jti"], "fixed-id");
        assert_eq!(body["rol"], "Admin");
    }

    #[test]
    fn test_timestamps_cannot_be_overridden() {
        let now = Utc::now();
        let token = issuer()
            .issue_at(
                now,
                TokenKind::Auth,
                "jane.doe",
                "org-a",
                EXPIRE_IN_FIVE_MINUTES,
                TokenClaims::new().with("iat", 1).with("exp", 4_102_444_800_i64),
            )
            .unwrap();

        let body = payload(&token);
        assert_eq!(body["iat"], now.timestamp());
        assert_eq!(body["exp"], now.timestamp() + 300);
    }

    #[test]
    fn test_token_ids_are_unique() {
        let issuer = issuer();
        let first = issuer
            .issue(TokenKind::Auth, "a", "org-a", EXPIRE_IN_FIVE_MINUTES, TokenClaims::new())
            .unwrap();
        let second = issuer
            .issue(TokenKind::Auth, "a", "org-a", EXPIRE_IN_FIVE_MINUTES, TokenClaims::new())
            .unwrap();

        assert_ne!(payload(&first)["jti"], payload(&second)["jti"]);
    }

    #[test]
    fn test_non_positive_expiry_rejected() {
        let result = issuer().issue(
            TokenKind::Auth,
            "jane.doe",
            "org-a",
            Duration::zero(),
            TokenClaims::new(),
        );
        assert!(matches!(result, Err(IssueError::NonPositiveExpiry(0))));
    }

    #[test]
    fn test_sub_second_expiry_rejected() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let result = issuer().issue_at(
            now,
            TokenKind::Auth,
            "jane.doe",
            "org-a",
            Duration::milliseconds(500),
            TokenClaims::new(),
        );
        assert!(matches!(result, Err(IssueError::NonPositiveExpiry(0))));
    }

    #[test]
    fn test_one_second_expiry_outlives_issuance() {
        let now = Utc.timestamp_opt(1_700_000_000, 900_000_000).unwrap();
        let token = issuer()
            .issue_at(
                now,
                TokenKind::Auth,
                "jane.doe",
                "org-a",
                Duration::seconds(1),
                TokenClaims::new(),
            )
            .unwrap();

        let body = payload(&token);
        let iat = body["iat"].as_i64().unwrap();
        let exp = body["exp"].as_i64().unwrap();
        assert!(exp > iat);
    }

    #[test]
    fn test_token_kind_stamped_and_not_overridable() {
        let issuer = issuer();
        let auth = issuer
            .issue(
                TokenKind::Auth,
                "jane.doe",
                "org-a",
                EXPIRE_IN_FIVE_MINUTES,
                TokenClaims::new().with("tkn", "refresh"),
            )
            .unwrap();
        let refresh = issuer
            .issue(
                TokenKind::Refresh,
                "jane.doe",
                "org-a",
                EXPIRE_IN_THIRTY_MINUTES,
                TokenClaims::new(),
            )
            .unwrap();

        assert_eq!(payload(&auth)["tkn"], "auth");
        assert_eq!(payload(&refresh)["tkn"], "refresh");
        assert_eq!(TokenKind::parse("refresh"), Some(TokenKind::Refresh));
        assert_eq!(TokenKind::parse("bogus"), None);
    }

    #[test]
    fn test_issue_token_pair() {
        let now = Utc::now();
        let pair = issuer()
            .issue_token_pair_at(
                now,
                "jane.doe",
                "org-a",
                EXPIRE_IN_ONE_HOUR,
                EXPIRE_IN_ONE_MINUTE,
                TokenClaims::new(),
                TokenClaims::new().with("rol", "Admin"),
            )
            .unwrap();

        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 300);

        let auth = payload(&pair.auth_token);
        let refresh = payload(&pair.refresh_token);
        assert_eq!(auth["exp"], now.timestamp() + 300);
        assert_eq!(refresh["exp"], now.timestamp() + 1800);
        assert_eq!(auth["rol"], "User");
        assert_eq!(refresh["rol"], "Admin");
        assert_eq!(auth["sub"], refresh["sub"]);
        assert_ne!(auth["jti"], refresh["jti"]);
    }
}
