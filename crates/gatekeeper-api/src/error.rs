//! 통합 API 에러 응답 타입.
//!
//! 인증·인가 실패와 그 밖의 핸들러 에러가 같은 형식으로 응답됩니다.

use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 통합 API 에러 응답.
///
/// 응답 본문에서는 `error` 필드 아래에 놓입니다.
///
/// # 예시
///
/// ```json
/// {
///   "error": {
///     "code": "TOKEN_EXPIRED",
///     "message": "토큰이 만료되었습니다",
///     "timestamp": 1738300800,
///     "method": "GET",
///     "path": "/api/v1/me"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "TOKEN_EXPIRED", "ROLE_MISMATCH")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// HTTP 메서드 (GET, POST 등)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// 요청 경로
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// `{ "error": ... }` 응답 본문.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorResponse,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
            method: None,
            path: None,
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// 요청 정보(메서드, 경로)를 추가합니다.
    #[must_use]
    pub fn with_request_info(mut self, method: &Method, uri: &Uri) -> Self {
        self.method = Some(method.to_string());
        self.path = Some(uri.path().to_string());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 상태 코드와 함께 응답으로 변환.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(ApiErrorBody { error: self })).into_response()
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_has_timestamp() {
        let err = ApiErrorResponse::new("TOKEN_EXPIRED", "expired");
        assert_eq!(err.code(), "TOKEN_EXPIRED");
        assert_eq!(err.message(), "expired");
        assert!(err.timestamp.is_some());
        assert_eq!(err.to_string(), "[TOKEN_EXPIRED] expired");
    }

    #[test]
    fn test_envelope_serialization() {
        let err = ApiErrorResponse::with_details("ROLE_MISMATCH", "denied", json!({ "required": "Admin" }))
            .with_request_info(&Method::DELETE, &"/api/v1/users/7?x=1".parse::<Uri>().unwrap());
        let value = serde_json::to_value(ApiErrorBody { error: err }).unwrap();

        assert_eq!(value["error"]["code"], "ROLE_MISMATCH");
        assert_eq!(value["error"]["details"]["required"], "Admin");
        assert_eq!(value["error"]["method"], "DELETE");
        assert_eq!(value["error"]["path"], "/api/v1/users/7");
    }

    #[test]
    fn test_optional_fields_skipped() {
        let mut err = ApiErrorResponse::new("X", "y");
        err.timestamp = None;
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value, json!({ "code": "X", "message": "y" }));
    }
}
