//! JWT 클레임 집합.
//!
//! 클레임 이름 → JSON 값 맵으로, 예약 클레임에 대한 타입 있는 접근자를 제공합니다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Role;

/// Subject - 사용자 ID
pub const SUBJECT: &str = "sub";
/// Issuer - 발급자
pub const ISSUER: &str = "iss";
/// Audience - 대상 서비스
pub const AUDIENCE: &str = "aud";
/// JWT ID - 토큰 고유 식별자
pub const TOKEN_ID: &str = "jti";
/// Role - 사용자 역할
pub const ROLE: &str = "rol";
/// Issued At - 발급 시각 (Unix timestamp)
pub const ISSUED_AT: &str = "iat";
/// Expiration - 만료 시각 (Unix timestamp)
pub const EXPIRES_AT: &str = "exp";
/// Not Before - 사용 시작 시각
pub const NOT_BEFORE: &str = "nbf";
/// Token kind - `auth` 또는 `refresh`
pub const TOKEN_KIND: &str = "tkn";

/// 토큰 페이로드의 클레임 집합.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenClaims(Map<String, Value>);

impl TokenClaims {
    /// 빈 클레임 집합 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 클레임 추가 (빌더 형식).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// 클레임 설정. 기존 값은 덮어씁니다.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// 클레임이 없을 때만 설정.
    pub fn insert_if_absent(&mut self, name: &str, value: impl FnOnce() -> Value) {
        if !self.0.contains_key(name) {
            self.0.insert(name.to_string(), value());
        }
    }

    /// 클레임 제거.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// 클레임 조회.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// 클레임 존재 여부.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// 클레임 개수.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 모든 클레임 순회.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    fn str_claim(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    fn timestamp_claim(&self, name: &str) -> Option<i64> {
        let value = self.0.get(name)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f.floor() as i64))
    }

    pub fn subject(&self) -> Option<&str> {
        self.str_claim(SUBJECT)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.str_claim(ISSUER)
    }

    pub fn token_id(&self) -> Option<&str> {
        self.str_claim(TOKEN_ID)
    }

    /// `tkn` 클레임 원문.
    pub fn token_kind(&self) -> Option<&str> {
        self.str_claim(TOKEN_KIND)
    }

    /// `rol` 클레임을 역할로 변환. 문자열이 아니면 `None`.
    pub fn role(&self) -> Option<Role> {
        self.str_claim(ROLE).map(Role::parse)
    }

    /// `aud` 클레임. 문자열 하나 또는 문자열 배열을 모두 허용합니다.
    pub fn audience(&self) -> Vec<String> {
        match self.0.get(AUDIENCE) {
            Some(Value::String(aud)) => vec![aud.clone()],
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.timestamp_claim(ISSUED_AT)
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.timestamp_claim(EXPIRES_AT)
    }

    /// 주어진 시각(Unix timestamp)에 만료되었는지 확인. `exp`가 없으면 만료로 간주합니다.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at().is_none_or(|exp| now >= exp)
    }

    /// 예약 클레임을 제외한 사용자 정의 클레임.
    pub fn custom(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter().filter(|(name, _)| !is_registered(name))
    }

    /// 내부 맵 반환.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for TokenClaims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for TokenClaims {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// 발급기가 관리하는 클레임인지 확인.
pub fn is_registered(name: &str) -> bool {
    matches!(
        name,
        SUBJECT
            | ISSUER
            | AUDIENCE
            | TOKEN_ID
            | ROLE
            | ISSUED_AT
            | EXPIRES_AT
            | NOT_BEFORE
            | TOKEN_KIND
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_accessors() {
        let claims = TokenClaims::new()
            .with(SUBJECT, "jane.doe")
            .with(ISSUER, "org-a")
            .with(ROLE, "admin")
            .with(AUDIENCE, "payments")
            .with(ISSUED_AT, 1_700_000_000)
            .with(EXPIRES_AT, 1_700_000_300);

        assert_eq!(claims.subject(), Some("jane.doe"));
        assert_eq!(claims.issuer(), Some("org-a"));
        assert_eq!(claims.role(), Some(Role::Admin));
        assert_eq!(claims.audience(), vec!["payments".to_string()]);
        assert_eq!(claims.issued_at(), Some(1_700_000_000));
        assert_eq!(claims.expires_at(), Some(1_700_000_300));
    }

    #[test]
    fn test_audience_array() {
        let claims = TokenClaims::new().with(AUDIENCE, json!(["a", "b", 3]));
        assert_eq!(claims.audience(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_insert_if_absent_keeps_existing() {
        let mut claims = TokenClaims::new().with(ROLE, "Admin");
        claims.insert_if_absent(ROLE, || json!("User"));
        claims.insert_if_absent(AUDIENCE, || json!("general"));

        assert_eq!(claims.role(), Some(Role::Admin));
        assert_eq!(claims.audience(), vec!["general".to_string()]);
    }

    #[test]
    fn test_expiry_boundary() {
        let claims = TokenClaims::new().with(EXPIRES_AT, 100);
        assert!(!claims.is_expired_at(99));
        assert!(claims.is_expired_at(100));
        assert!(TokenClaims::new().is_expired_at(0));
    }

    #[test]
    fn test_custom_claims_exclude_registered() {
        let claims = TokenClaims::new()
            .with(SUBJECT, "jane.doe")
            .with("did", "device-1");

        let custom: Vec<_> = claims.custom().map(|(k, _)| k.as_str()).collect();
        assert_eq!(custom, vec!["did"]);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let claims = TokenClaims::new().with(SUBJECT, "jane.doe");
        assert_eq!(
            serde_json::to_value(&claims).unwrap(),
            json!({ "sub": "jane.doe" })
        );
    }
}
