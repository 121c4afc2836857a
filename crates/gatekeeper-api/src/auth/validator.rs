//! 토큰 검증.
//!
//! 검사 순서는 고정입니다: 구조 → 서명 → 발급자 → 만료.
//! 각 단계의 실패는 서로 다른 [`ValidationError`] 변형으로 구분됩니다.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{crypto, Header};
use serde_json::Value;

use super::claims::TokenClaims;
use super::{KeyMaterial, Role};

/// 토큰 검증 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("토큰 형식이 올바르지 않습니다: {0}")]
    MalformedToken(String),
    #[error("토큰 서명이 유효하지 않습니다")]
    SignatureInvalid,
    #[error("토큰 발급자가 일치하지 않습니다: expected={expected}, actual={actual}")]
    IssuerMismatch { expected: String, actual: String },
    #[error("토큰이 만료되었습니다 (exp={expired_at})")]
    TokenExpired { expired_at: i64 },
}

/// 서명·발급자·만료를 검사하는 토큰 검증기.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    keys: Arc<KeyMaterial>,
    issuer: String,
}

/// 서명 검사 전의 분해된 토큰.
struct Segments<'a> {
    message: &'a str,
    signature: &'a str,
    header: Header,
    claims: TokenClaims,
}

fn split(token: &str) -> Result<Segments<'_>, ValidationError> {
    let mut parts = token.splitn(4, '.');
    let (Some(raw_header), Some(raw_payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ValidationError::MalformedToken(
            "세 개의 구간으로 나뉘지 않습니다".to_string(),
        ));
    };

    let header_bytes = URL_SAFE_NO_PAD
        .decode(raw_header)
        .map_err(|e| ValidationError::MalformedToken(format!("헤더 디코딩 실패: {}", e)))?;
    let header: Header = serde_json::from_slice(&header_bytes)
        .map_err(|e| ValidationError::MalformedToken(format!("헤더 파싱 실패: {}", e)))?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(raw_payload)
        .map_err(|e| ValidationError::MalformedToken(format!("페이로드 디코딩 실패: {}", e)))?;
    let payload: Value = serde_json::from_slice(&payload_bytes)
        .map_err(|e| ValidationError::MalformedToken(format!("페이로드 파싱 실패: {}", e)))?;
    let Value::Object(map) = payload else {
        return Err(ValidationError::MalformedToken(
            "페이로드가 JSON 객체가 아닙니다".to_string(),
        ));
    };

    // 서명 대상은 "header.payload" 원문
    let message = &token[..raw_header.len() + 1 + raw_payload.len()];

    Ok(Segments {
        message,
        signature,
        header,
        claims: TokenClaims::from(map),
    })
}

/// 서명을 확인하지 않고 `sub` 클레임만 읽습니다.
///
/// 사용자 조회 단계에서만 사용하며, 결과를 신뢰하기 전에 반드시
/// [`TokenValidator::parse_and_verify`]를 거쳐야 합니다.
pub fn peek_subject(token: &str) -> Result<String, ValidationError> {
    let segments = split(token)?;
    segments
        .claims
        .subject()
        .map(str::to_string)
        .ok_or_else(|| ValidationError::MalformedToken("sub 클레임이 없습니다".to_string()))
}

impl TokenValidator {
    /// 새 검증기 생성.
    ///
    /// * `issuer` - 허용되는 `iss` 값
    pub fn new(keys: Arc<KeyMaterial>, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// 현재 시각 기준으로 토큰 검증.
    pub fn parse_and_verify(&self, token: &str) -> Result<TokenClaims, ValidationError> {
        self.parse_and_verify_at(token, Utc::now().timestamp())
    }

    /// 주어진 시각(Unix timestamp) 기준으로 토큰 검증.
    pub fn parse_and_verify_at(&self, token: &str, now: i64) -> Result<TokenClaims, ValidationError> {
        let Segments {
            message,
            signature,
            header,
            claims,
        } = split(token)?;

        if header.alg != self.keys.algorithm() {
            return Err(ValidationError::SignatureInvalid);
        }
        let verified = crypto::verify(
            signature,
            message.as_bytes(),
            self.keys.decoding_key(),
            header.alg,
        )
        .unwrap_or(false);
        if !verified {
            return Err(ValidationError::SignatureInvalid);
        }

        let actual = claims.issuer().unwrap_or_default();
        if actual != self.issuer {
            return Err(ValidationError::IssuerMismatch {
                expected: self.issuer.clone(),
                actual: actual.to_string(),
            });
        }

        let expires_at = claims.expires_at().ok_or_else(|| {
            ValidationError::MalformedToken("exp 클레임이 없거나 숫자가 아닙니다".to_string())
        })?;
        if now >= expires_at {
            return Err(ValidationError::TokenExpired {
                expired_at: expires_at,
            });
        }

        Ok(claims)
    }

    /// 토큰이 만료되었는지 확인.
    ///
    /// 검증 자체가 실패한 토큰도 만료된 것으로 간주합니다.
    pub fn is_expired(&self, token: &str) -> bool {
        self.parse_and_verify(token).is_err()
    }

    pub fn subject_of(&self, token: &str) -> Result<Option<String>, ValidationError> {
        Ok(self.parse_and_verify(token)?.subject().map(str::to_string))
    }

    pub fn role_of(&self, token: &str) -> Result<Option<Role>, ValidationError> {
        Ok(self.parse_and_verify(token)?.role())
    }

    pub fn issuer_of(&self, token: &str) -> Result<Option<String>, ValidationError> {
        Ok(self.parse_and_verify(token)?.issuer().map(str::to_string))
    }

    pub fn audience_of(&self, token: &str) -> Result<Vec<String>, ValidationError> {
        Ok(self.parse_and_verify(token)?.audience())
    }

    pub fn expiry_of(&self, token: &str) -> Result<Option<i64>, ValidationError> {
        Ok(self.parse_and_verify(token)?.expires_at())
    }

    pub fn issued_at_of(&self, token: &str) -> Result<Option<i64>, ValidationError> {
        Ok(self.parse_and_verify(token)?.issued_at())
    }
}
