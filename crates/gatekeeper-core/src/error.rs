//! gatekeeper 전역 에러 타입.
//!
//! 개별 모듈의 세부 에러는 각 모듈에서 정의하고, 이 타입은 부트스트랩과
//! 바이너리 경계에서 사용됩니다.

use thiserror::Error;

/// 핵심 gatekeeper 에러.
#[derive(Debug, Error)]
pub enum GatekeeperError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 서명/검증 키 준비 실패
    #[error("키 에러: {0}")]
    KeyMaterial(String),

    /// 기동 이후 서버 실행 실패
    #[error("서버 에러: {0}")]
    Server(String),
}

/// gatekeeper 작업을 위한 Result 타입.
pub type GatekeeperResult<T> = Result<T, GatekeeperError>;

impl GatekeeperError {
    /// 프로세스가 트래픽을 받기 전에 중단해야 하는 에러인지 확인합니다.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            GatekeeperError::Config(_) | GatekeeperError::KeyMaterial(_)
        )
    }
}

impl From<config::ConfigError> for GatekeeperError {
    fn from(err: config::ConfigError) -> Self {
        GatekeeperError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_fatal() {
        assert!(GatekeeperError::KeyMaterial("corrupt pem".to_string()).is_startup_fatal());
        assert!(GatekeeperError::Config("missing issuer".to_string()).is_startup_fatal());
        assert!(!GatekeeperError::Server("connection reset".to_string()).is_startup_fatal());
    }

    #[test]
    fn test_from_config_error() {
        let err = config::ConfigError::NotFound("auth.issuer".to_string());
        let converted: GatekeeperError = err.into();
        assert!(matches!(converted, GatekeeperError::Config(_)));
        assert!(converted.is_startup_fatal());
    }
}
