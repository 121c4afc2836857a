//! 설정 관리.
//!
//! 기본값 → TOML 파일 → `GATEKEEPER__*` 환경 변수 순으로 설정을 병합합니다.
//!
//! ```text
//! GATEKEEPER__AUTH__ISSUER=fusion-air
//! GATEKEEPER__AUTH__KEY_MODE=asymmetric
//! GATEKEEPER__SERVER__PORT=8080
//! ```

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GatekeeperError, GatekeeperResult};

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 인증 설정
    pub auth: AuthConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// API 경로 접두사 (예: "/api/v1")
    pub api_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_prefix: "/api/v1".to_string(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
    /// span 진입/종료 이벤트 출력 여부
    pub span_events: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            span_events: false,
        }
    }
}

/// 서명 키 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    /// 단일 공유 비밀 키 (HS512)
    #[default]
    Symmetric,
    /// RSA 공개/개인 키 쌍 (RS256)
    Asymmetric,
}

/// 토큰 발급/검증 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 서비스 이름 (`aud` 클레임 기본값)
    pub service_name: String,
    /// 토큰 발급자 (`iss` 클레임)
    pub issuer: String,
    /// 서명 키 방식
    pub key_mode: KeyMode,
    /// 대칭 키 모드의 비밀 값
    #[serde(deserialize_with = "deserialize_secret", skip_serializing)]
    pub secret: Option<SecretString>,
    /// 비대칭 키 모드의 공개 키 파일 경로 (PEM)
    pub public_key_path: PathBuf,
    /// 비대칭 키 모드의 개인 키 파일 경로 (PEM)
    pub private_key_path: PathBuf,
    /// 새 RSA 키 생성 시 키 크기 (비트)
    pub rsa_key_bits: usize,
    /// 인증 토큰 기본 만료 시간 (초)
    pub auth_token_expiry_secs: u64,
    /// 리프레시 토큰 기본 만료 시간 (초)
    pub refresh_token_expiry_secs: u64,
    /// 인증 토큰 만료 시간이 상한을 넘을 때 대신 사용하는 짧은 만료 시간 (초)
    pub auth_token_fallback_secs: u64,
    /// 리프레시 토큰 최소 만료 시간이자 인증 토큰 만료 시간 상한 (초)
    pub refresh_floor_secs: u64,
    /// 인증 토큰 헤더 이름
    pub auth_header: String,
    /// 리프레시 토큰 헤더 이름
    pub refresh_header: String,
    /// 라우트 테이블에 없는 라우트의 요구 역할
    pub default_route_role: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            service_name: "general".to_string(),
            issuer: "gatekeeper".to_string(),
            key_mode: KeyMode::Symmetric,
            secret: None,
            public_key_path: PathBuf::from("keys/public.pem"),
            private_key_path: PathBuf::from("keys/private.pem"),
            rsa_key_bits: 2048,
            auth_token_expiry_secs: 5 * 60,
            refresh_token_expiry_secs: 30 * 60,
            auth_token_fallback_secs: 5 * 60,
            refresh_floor_secs: 30 * 60,
            auth_header: "Authorization".to_string(),
            refresh_header: "Refresh-Token".to_string(),
            default_route_role: "User".to_string(),
        }
    }
}

impl AuthConfig {
    /// 설정 값의 일관성을 검증합니다.
    pub fn validate(&self) -> GatekeeperResult<()> {
        if self.issuer.trim().is_empty() {
            return Err(GatekeeperError::Config("auth.issuer must not be empty".into()));
        }
        if self.service_name.trim().is_empty() {
            return Err(GatekeeperError::Config(
                "auth.service_name must not be empty".into(),
            ));
        }
        if self.auth_header.trim().is_empty() || self.refresh_header.trim().is_empty() {
            return Err(GatekeeperError::Config("auth header names must not be empty".into()));
        }
        if self.auth_header.eq_ignore_ascii_case(&self.refresh_header) {
            return Err(GatekeeperError::Config(
                "auth.refresh_header must differ from auth.auth_header".into(),
            ));
        }
        if self.auth_token_fallback_secs == 0 || self.refresh_floor_secs == 0 {
            return Err(GatekeeperError::Config("token lifetimes must be positive".into()));
        }
        if self.auth_token_fallback_secs > self.refresh_floor_secs {
            return Err(GatekeeperError::Config(format!(
                "auth.auth_token_fallback_secs ({}) exceeds auth.refresh_floor_secs ({})",
                self.auth_token_fallback_secs, self.refresh_floor_secs
            )));
        }
        Ok(())
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.is_empty())
        .map(|s| SecretString::new(s.into_boxed_str())))
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> GatekeeperResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("GATEKEEPER")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.auth.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> GatekeeperResult<Self> {
        Self::load("config/default.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    #[test]
    fn test_auth_defaults_are_consistent() {
        let auth = AuthConfig::default();
        assert!(auth.validate().is_ok());
        assert_eq!(auth.key_mode, KeyMode::Symmetric);
        assert_eq!(auth.auth_header, "Authorization");
        assert_eq!(auth.refresh_header, "Refresh-Token");
        assert_eq!(auth.default_route_role, "User");
    }

    #[test]
    fn test_validate_rejects_fallback_above_floor() {
        let auth = AuthConfig {
            auth_token_fallback_secs: 3600,
            refresh_floor_secs: 1800,
            ..Default::default()
        };
        assert!(matches!(auth.validate(), Err(GatekeeperError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_same_headers() {
        let auth = AuthConfig {
            refresh_header: "authorization".to_string(),
            ..Default::default()
        };
        assert!(auth.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8081

[auth]
issuer = "org-a"
key_mode = "asymmetric"
secret = "s3cr3t"
rsa_key_bits = 3072
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.issuer, "org-a");
        assert_eq!(config.auth.key_mode, KeyMode::Asymmetric);
        assert_eq!(config.auth.rsa_key_bits, 3072);
        assert_eq!(
            config.auth.secret.as_ref().map(|s| s.expose_secret().to_string()),
            Some("s3cr3t".to_string())
        );
        assert_eq!(config.auth.refresh_floor_secs, 1800);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load("does/not/exist.toml").unwrap();
        assert_eq!(config.server.api_prefix, "/api/v1");
        assert!(config.auth.secret.is_none());
    }

    #[test]
    fn test_secret_is_not_serialized() {
        let auth = AuthConfig {
            secret: Some(SecretString::new("hidden".into())),
            ..Default::default()
        };
        let json = serde_json::to_string(&auth).unwrap();
        assert!(!json.contains("hidden"));
        assert!(!json.contains("secret"));
    }
}
