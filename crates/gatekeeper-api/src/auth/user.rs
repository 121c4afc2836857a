//! 사용자 조회.
//!
//! 인터셉터는 토큰의 `sub`로 사용자를 조회해 역할을 확인합니다.
//! 저장소는 [`UserLookup`] 트레이트 뒤에 숨겨집니다.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::SecretString;

use super::Role;

/// 조회된 사용자 정보.
///
/// `credentials`는 인증 코어에서 해석하지 않습니다.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub role: Role,
    pub credentials: SecretString,
}

impl UserRecord {
    pub fn new(
        username: impl Into<String>,
        role: impl Into<Role>,
        credentials: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            role: role.into(),
            credentials: SecretString::from(credentials.into()),
        }
    }
}

/// 사용자 조회 실패 (저장소 장애 등).
#[derive(Debug, thiserror::Error)]
#[error("사용자 조회 실패: {0}")]
pub struct UserLookupError(pub String);

/// 주체 식별자로 사용자를 찾는 기능.
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// 사용자를 찾습니다. 없으면 `Ok(None)`.
    async fn find_user(&self, subject: &str) -> Result<Option<UserRecord>, UserLookupError>;
}

/// 메모리 기반 사용자 저장소.
///
/// 데모 서버와 테스트에서 사용합니다.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: HashMap<String, UserRecord>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 사용자 추가 (빌더 형식).
    #[must_use]
    pub fn with_user(mut self, user: UserRecord) -> Self {
        self.insert(user);
        self
    }

    pub fn insert(&mut self, user: UserRecord) {
        self.users.insert(user.username.clone(), user);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserLookup for InMemoryUserStore {
    async fn find_user(&self, subject: &str) -> Result<Option<UserRecord>, UserLookupError> {
        Ok(self.users.get(subject).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let store = InMemoryUserStore::new()
            .with_user(UserRecord::new("jane.doe", "Admin", "hunter2"))
            .with_user(UserRecord::new("john.roe", "User", "swordfish"));

        let jane = store.find_user("jane.doe").await.unwrap().unwrap();
        assert_eq!(jane.role, Role::Admin);
        assert_eq!(jane.credentials.expose_secret(), "hunter2");

        assert!(store.find_user("nobody").await.unwrap().is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_credentials_not_in_debug_output() {
        let user = UserRecord::new("jane.doe", "User", "hunter2");
        assert!(!format!("{:?}", user).contains("hunter2"));
    }
}
