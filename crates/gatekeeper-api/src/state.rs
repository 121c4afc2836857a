//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! 부팅 시 한 번 구성되고 이후에는 변경되지 않습니다. `Arc`로 래핑되어
//! 잠금 없이 요청 간에 공유됩니다.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use gatekeeper_core::{AppConfig, AuthConfig, GatekeeperError, GatekeeperResult};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use crate::auth::{
    obtain_keys, Authorizer, ExpiryPolicy, RefreshFlow, RouteSecurityTable, TokenIssuer,
    TokenValidator, UserLookup,
};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 애플리케이션 설정
    pub config: Arc<AppConfig>,

    /// 토큰 발급기
    pub issuer: Arc<TokenIssuer>,

    /// 요청 인가기 (검증기 + 사용자 조회)
    pub authorizer: Authorizer,

    /// 리프레시 흐름
    pub refresh: RefreshFlow,

    /// 라우트별 요구 역할
    pub routes: Arc<RouteSecurityTable>,

    /// Prometheus 핸들 (설치된 경우)
    pub metrics: Option<PrometheusHandle>,

    /// 서버 시작 시각
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// 설정으로부터 상태 구성.
    ///
    /// 키 준비에 실패하면 [`GatekeeperError::KeyMaterial`]을 반환하며,
    /// 이 에러는 서버 시작을 중단시킵니다.
    pub fn from_config(
        config: AppConfig,
        users: Arc<dyn UserLookup>,
        routes: RouteSecurityTable,
    ) -> GatekeeperResult<Self> {
        config.auth.validate()?;

        let keys = Arc::new(
            obtain_keys(&config.auth).map_err(|e| GatekeeperError::KeyMaterial(e.to_string()))?,
        );
        info!(algorithm = ?keys.algorithm(), issuer = %config.auth.issuer, "Key material ready");

        let issuer = Arc::new(TokenIssuer::new(
            keys.clone(),
            expiry_policy(&config.auth),
            config.auth.service_name.clone(),
        ));
        let validator = Arc::new(TokenValidator::new(keys, config.auth.issuer.clone()));
        let authorizer = Authorizer::new(
            validator,
            users,
            config.auth.auth_header.clone(),
            config.auth.refresh_header.clone(),
        );
        let refresh = RefreshFlow::new(
            authorizer.clone(),
            issuer.clone(),
            secs(config.auth.auth_token_expiry_secs),
            secs(config.auth.refresh_token_expiry_secs),
        );

        Ok(Self {
            config: Arc::new(config),
            issuer,
            authorizer,
            refresh,
            routes: Arc::new(routes),
            metrics: None,
            started_at: Utc::now(),
        })
    }

    /// Prometheus 핸들 설정.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// 설정된 기본 만료 시간.
    pub fn default_expiries(&self) -> (Duration, Duration) {
        (
            secs(self.config.auth.auth_token_expiry_secs),
            secs(self.config.auth.refresh_token_expiry_secs),
        )
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

fn secs(value: u64) -> Duration {
    i64::try_from(value)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

fn expiry_policy(config: &AuthConfig) -> ExpiryPolicy {
    ExpiryPolicy {
        refresh_floor: secs(config.refresh_floor_secs),
        auth_fallback: secs(config.auth_token_fallback_secs),
    }
}

/// 테스트용 AppState 생성.
///
/// 대칭 키와 메모리 사용자 저장소(`jane.doe`=Admin, `john.roe`=User)를 사용합니다.
#[cfg(test)]
pub fn create_test_state(routes: RouteSecurityTable) -> AppState {
    use crate::auth::{InMemoryUserStore, UserRecord};
    use secrecy::SecretString;

    let mut config = AppConfig::default();
    config.auth.issuer = "org-a".to_string();
    config.auth.secret = Some(SecretString::from(
        "test-secret-key-for-jwt-testing-minimum-32-chars".to_string(),
    ));

    let users = InMemoryUserStore::new()
        .with_user(UserRecord::new("jane.doe", "Admin", "pw"))
        .with_user(UserRecord::new("john.roe", "User", "pw"));

    match AppState::from_config(config, Arc::new(users), routes) {
        Ok(state) => state,
        Err(e) => panic!("test state must build: {}", e),
    }
}
