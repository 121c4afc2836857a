//! 라우트별 요구 역할 테이블.
//!
//! 서버 시작 시 한 번 구성되고 이후에는 읽기 전용으로 공유됩니다.

use std::collections::HashMap;

use axum::http::Method;

use super::{Role, RouteSecurityRequirement};

/// 인증 토큰과 리프레시 토큰 중 어느 헤더를 읽을지.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenSource {
    /// `Authorization` 헤더의 인증 토큰
    #[default]
    AuthHeader,
    /// `Refresh-Token` 헤더의 리프레시 토큰
    RefreshHeader,
}

#[derive(Debug, Clone)]
struct RouteEntry {
    requirement: RouteSecurityRequirement,
    source: TokenSource,
}

/// `(HTTP 메서드, 라우트 템플릿)` → 요구 역할.
///
/// 등록되지 않은 라우트는 기본 요구 사항을 따릅니다.
#[derive(Debug, Clone)]
pub struct RouteSecurityTable {
    routes: HashMap<(Method, String), RouteEntry>,
    default_requirement: RouteSecurityRequirement,
}

impl RouteSecurityTable {
    /// 기본 요구 역할로 빈 테이블 생성.
    pub fn new(default_role: impl Into<Role>) -> Self {
        Self {
            routes: HashMap::new(),
            default_requirement: RouteSecurityRequirement::new(default_role),
        }
    }

    /// 인증 헤더로 보호되는 라우트 등록.
    #[must_use]
    pub fn route(self, method: Method, path: impl Into<String>, role: impl Into<Role>) -> Self {
        self.insert(method, path, RouteSecurityRequirement::new(role), TokenSource::AuthHeader)
    }

    /// 인증은 필요하지만 역할 검사는 건너뛰는 라우트 등록.
    #[must_use]
    pub fn public_route(self, method: Method, path: impl Into<String>) -> Self {
        self.insert(method, path, RouteSecurityRequirement::public(), TokenSource::AuthHeader)
    }

    /// 리프레시 토큰 헤더를 읽는 라우트 등록. 역할 검사는 없습니다.
    #[must_use]
    pub fn refresh_route(self, method: Method, path: impl Into<String>) -> Self {
        self.insert(
            method,
            path,
            RouteSecurityRequirement::public(),
            TokenSource::RefreshHeader,
        )
    }

    fn insert(
        mut self,
        method: Method,
        path: impl Into<String>,
        requirement: RouteSecurityRequirement,
        source: TokenSource,
    ) -> Self {
        self.routes
            .insert((method, path.into()), RouteEntry { requirement, source });
        self
    }

    /// 라우트의 요구 사항 조회. 없으면 기본 요구 사항.
    pub fn requirement_for(&self, method: &Method, path: &str) -> &RouteSecurityRequirement {
        self.entry(method, path)
            .map(|entry| &entry.requirement)
            .unwrap_or(&self.default_requirement)
    }

    /// 라우트가 읽을 토큰 헤더 종류.
    pub fn token_source_for(&self, method: &Method, path: &str) -> TokenSource {
        self.entry(method, path)
            .map(|entry| entry.source)
            .unwrap_or_default()
    }

    pub fn default_requirement(&self) -> &RouteSecurityRequirement {
        &self.default_requirement
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn entry(&self, method: &Method, path: &str) -> Option<&RouteEntry> {
        self.routes.get(&(method.clone(), path.to_string()))
    }
}

impl Default for RouteSecurityTable {
    fn default() -> Self {
        Self::new(Role::User)
    }
}
