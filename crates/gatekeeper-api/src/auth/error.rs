//! 인가 실패.
//!
//! 인터셉터와 리프레시 흐름이 반환하는 에러와 HTTP 응답 매핑.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::issuer::IssueError;
use super::validator::ValidationError;
use super::Role;
use crate::error::ApiErrorResponse;

/// 인가 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("인증 헤더가 없거나 Bearer 형식이 아닙니다: {header}")]
    MissingOrMalformedHeader { header: String },
    #[error("토큰 형식이 올바르지 않습니다: {reason}")]
    MalformedToken { reason: String },
    #[error("토큰 서명이 유효하지 않습니다")]
    SignatureInvalid,
    #[error("토큰 발급자가 일치하지 않습니다: {actual}")]
    IssuerMismatch { actual: String },
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("알 수 없는 사용자입니다")]
    UnknownSubject,
    #[error("토큰 종류가 맞지 않습니다: expected={expected}")]
    TokenKindMismatch {
        expected: &'static str,
        actual: Option<String>,
    },
    #[error("권한이 부족합니다: required={required}")]
    RoleMismatch { required: Role, actual: Option<Role> },
    #[error("사용자 저장소를 사용할 수 없습니다")]
    LookupUnavailable,
    #[error("토큰 재발급 실패")]
    IssueFailed,
}

impl From<ValidationError> for AuthorizationError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MalformedToken(reason) => AuthorizationError::MalformedToken { reason },
            ValidationError::SignatureInvalid => AuthorizationError::SignatureInvalid,
            // 기대 발급자는 설정값이므로 응답에 싣지 않음
            ValidationError::IssuerMismatch { actual, .. } => {
                AuthorizationError::IssuerMismatch { actual }
            }
            ValidationError::TokenExpired { .. } => AuthorizationError::TokenExpired,
        }
    }
}

impl From<IssueError> for AuthorizationError {
    fn from(_: IssueError) -> Self {
        AuthorizationError::IssueFailed
    }
}

impl AuthorizationError {
    /// 응답 본문과 메트릭 라벨에 쓰는 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            AuthorizationError::MissingOrMalformedHeader { .. } => "MISSING_OR_MALFORMED_HEADER",
            AuthorizationError::MalformedToken { .. } => "MALFORMED_TOKEN",
            AuthorizationError::SignatureInvalid => "SIGNATURE_INVALID",
            AuthorizationError::IssuerMismatch { .. } => "ISSUER_MISMATCH",
            AuthorizationError::TokenExpired => "TOKEN_EXPIRED",
            AuthorizationError::UnknownSubject => "UNKNOWN_SUBJECT",
            AuthorizationError::TokenKindMismatch { .. } => "TOKEN_KIND_MISMATCH",
            AuthorizationError::RoleMismatch { .. } => "ROLE_MISMATCH",
            AuthorizationError::LookupUnavailable => "LOOKUP_UNAVAILABLE",
            AuthorizationError::IssueFailed => "ISSUE_FAILED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthorizationError::RoleMismatch { .. } => StatusCode::FORBIDDEN,
            AuthorizationError::LookupUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthorizationError::IssueFailed => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// 통합 에러 응답으로 변환.
    ///
    /// 역할·토큰 종류 불일치는 기대값과 실제값을 `details`에 담습니다.
    pub fn to_api_error(&self) -> ApiErrorResponse {
        match self {
            AuthorizationError::RoleMismatch { required, actual } => ApiErrorResponse::with_details(
                self.code(),
                self.to_string(),
                json!({
                    "required": required.as_str(),
                    "actual": actual.as_ref().map(Role::as_str),
                }),
            ),
            AuthorizationError::TokenKindMismatch { expected, actual } => {
                ApiErrorResponse::with_details(
                    self.code(),
                    self.to_string(),
                    json!({ "expected": expected, "actual": actual }),
                )
            }
            _ => ApiErrorResponse::new(self.code(), self.to_string()),
        }
    }
}

impl IntoResponse for AuthorizationError {
    fn into_response(self) -> Response {
        self.to_api_error().into_response_with(self.status())
    }
}
