//! 역할 기반 접근 제어 (RBAC).
//!
//! 토큰의 `rol` 클레임과 라우트 요구 역할을 비교하는 규칙을 정의합니다.

use serde::{Deserialize, Serialize};

/// 사용자 역할.
///
/// 알려진 역할 외의 값은 [`Role::Custom`]으로 보존되며, 비교는 항상
/// 대소문자를 구분하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// 역할 검사를 건너뛰는 센티널 역할 (인증은 여전히 필요)
    Public,
    /// 일반 사용자 - 발급 시 기본 역할
    User,
    /// 관리자
    Admin,
    /// 그 밖의 서비스 정의 역할
    Custom(String),
}

impl Role {
    /// 역할 문자열 반환.
    pub fn as_str(&self) -> &str {
        match self {
            Role::Public => "Public",
            Role::User => "User",
            Role::Admin => "Admin",
            Role::Custom(name) => name,
        }
    }

    /// 문자열에서 역할 파싱. 앞뒤 공백은 무시합니다.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("public") {
            Role::Public
        } else if trimmed.eq_ignore_ascii_case("user") {
            Role::User
        } else if trimmed.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Custom(trimmed.to_string())
        }
    }

    /// 센티널 역할 "Public"인지 확인.
    pub fn is_public(&self) -> bool {
        self.as_str().trim().eq_ignore_ascii_case("public")
    }

    /// 대소문자를 구분하지 않고 두 역할이 같은지 확인.
    pub fn matches(&self, other: &Role) -> bool {
        self.as_str().trim().eq_ignore_ascii_case(other.as_str().trim())
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl Eq for Role {}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::parse(&s)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::parse(s)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 보호된 라우트 하나의 요구 역할.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSecurityRequirement {
    required_role: Role,
}

impl RouteSecurityRequirement {
    /// 새 요구 사항 생성.
    pub fn new(required_role: impl Into<Role>) -> Self {
        Self {
            required_role: required_role.into(),
        }
    }

    /// 인증만 요구하고 역할 검사는 건너뛰는 요구 사항.
    pub fn public() -> Self {
        Self::new(Role::Public)
    }

    /// 요구 역할 반환.
    pub fn required_role(&self) -> &Role {
        &self.required_role
    }

    /// 토큰 역할이 이 요구 사항을 만족하는지 확인.
    ///
    /// 토큰 역할 또는 요구 역할이 "Public"이면 비교를 건너뜁니다.
    /// 역할이 없는 토큰은 "Public" 라우트만 통과합니다.
    pub fn is_satisfied_by(&self, token_role: Option<&Role>) -> bool {
        if self.required_role.is_public() {
            return true;
        }
        match token_role {
            Some(role) if role.is_public() => true,
            Some(role) => role.matches(&self.required_role),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse(" USER "), Role::User);
        assert_eq!(Role::parse("Public"), Role::Public);
        assert!(matches!(Role::parse("Auditor"), Role::Custom(ref name) if name == "Auditor"));
    }

    #[test]
    fn test_role_matches_case_insensitive() {
        assert!(Role::Admin.matches(&Role::Custom("ADMIN".to_string())));
        assert!(Role::Custom("auditor".into()).matches(&Role::Custom("Auditor".into())));
        assert!(!Role::User.matches(&Role::Admin));
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"Admin\"");

        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);

        let custom: Role = serde_json::from_str("\"Billing\"").unwrap();
        assert_eq!(custom.as_str(), "Billing");
    }

    #[test]
    fn test_public_token_role_bypasses_requirement() {
        let admin_route = RouteSecurityRequirement::new(Role::Admin);

        assert!(admin_route.is_satisfied_by(Some(&Role::Public)));
        assert!(admin_route.is_satisfied_by(Some(&Role::parse(" public "))));
        assert!(admin_route.is_satisfied_by(Some(&Role::Admin)));
        assert!(!admin_route.is_satisfied_by(Some(&Role::User)));
    }

    #[test]
    fn test_public_route_accepts_any_role() {
        let route = RouteSecurityRequirement::public();

        assert!(route.is_satisfied_by(Some(&Role::User)));
        assert!(route.is_satisfied_by(None));
    }

    #[test]
    fn test_missing_role_fails_protected_route() {
        let route = RouteSecurityRequirement::new("User");
        assert!(!route.is_satisfied_by(None));
    }
}
