//! Identity resolution: worker login codes and admin credentials map to a
//! transient session identity. Nothing here is persisted; a session dies
//! with the process or on logout.

use crate::auth::{AuthError, AuthProvider};
use crate::cache::EntityCache;
use crate::model::{Role, Worker};
use crate::{AppError, AppResult};

pub const ADMIN_DISPLAY_NAME: &str = "관리자";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Admin { name: String, email: String },
    Worker { id: i64, name: String, code: String },
}

impl Identity {
    /// Admin identity as established by a provider sign-in or by the
    /// provider's persisted auth state on reload.
    pub fn admin(email: impl Into<String>) -> Self {
        Identity::Admin {
            name: ADMIN_DISPLAY_NAME.to_string(),
            email: email.into(),
        }
    }

    pub fn from_worker(worker: &Worker) -> Self {
        Identity::Worker {
            id: worker.id,
            name: worker.name.clone(),
            code: worker.code.clone(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Identity::Admin { .. } => Role::Admin,
            Identity::Worker { .. } => Role::Worker,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Identity::Admin { name, .. } => name,
            Identity::Worker { name, .. } => name,
        }
    }

    pub fn worker_id(&self) -> Option<i64> {
        match self {
            Identity::Worker { id, .. } => Some(*id),
            Identity::Admin { .. } => None,
        }
    }
}

/// Exact, case-sensitive match against the cached worker codes. No session
/// is created and nothing is mutated on a miss.
pub fn login_worker(cache: &EntityCache, code: &str) -> AppResult<Identity> {
    cache
        .find_worker_by_code(code)
        .map(|worker| Identity::from_worker(&worker))
        .ok_or_else(|| AppError::new("SESSION/INVALID_CODE", "잘못된 로그인 코드입니다"))
}

/// Delegate credential verification to the external provider and classify
/// its failures into distinct user-facing errors.
pub async fn login_admin(
    auth: &dyn AuthProvider,
    email: &str,
    password: &str,
) -> AppResult<Identity> {
    if email.is_empty() || password.is_empty() {
        return Err(AppError::new(
            "SESSION/CREDENTIALS_REQUIRED",
            "이메일과 비밀번호를 입력해주세요",
        ));
    }
    match auth.sign_in(email, password).await {
        Ok(user) => Ok(Identity::admin(user.email)),
        Err(AuthError::WrongCredentials) => Err(AppError::new(
            "AUTH/WRONG_CREDENTIALS",
            "이메일 또는 비밀번호가 올바르지 않습니다",
        )),
        Err(AuthError::InvalidEmail) => Err(AppError::new(
            "AUTH/INVALID_EMAIL",
            "올바른 이메일 형식이 아닙니다",
        )),
        Err(AuthError::Provider(message)) => Err(AppError::new(
            "AUTH/PROVIDER",
            format!("로그인 중 오류가 발생했습니다: {message}"),
        )),
    }
}

/// Best-effort provider sign-out for admin sessions; provider failures are
/// logged, never surfaced. The caller clears the session unconditionally.
pub async fn logout(auth: &dyn AuthProvider, identity: &Identity) {
    if identity.role() == Role::Admin {
        if let Err(err) = auth.sign_out().await {
            tracing::warn!(event = "auth_sign_out_failed", error = %err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Collection, Document};
    use serde_json::json;

    fn cache_with_worker(code: &str) -> EntityCache {
        let cache = EntityCache::new(true);
        cache.apply(
            Collection::Workers,
            &[Document {
                key: "w1".into(),
                data: json!({"id": 1, "name": "김철수", "code": code}),
            }],
        );
        cache
    }

    #[test]
    fn worker_login_matches_exact_code() {
        let cache = cache_with_worker("HK8X2M");
        let identity = login_worker(&cache, "HK8X2M").unwrap();
        assert_eq!(identity.role(), Role::Worker);
        assert_eq!(identity.display_name(), "김철수");
        assert_eq!(identity.worker_id(), Some(1));
    }

    #[test]
    fn worker_login_is_case_sensitive() {
        let cache = cache_with_worker("HK8X2M");
        let err = login_worker(&cache, "hk8x2m").unwrap_err();
        assert_eq!(err.code(), "SESSION/INVALID_CODE");
    }

    #[test]
    fn admin_identity_uses_fixed_display_name() {
        let identity = Identity::admin("host@example.com");
        assert_eq!(identity.display_name(), ADMIN_DISPLAY_NAME);
        assert_eq!(identity.role(), Role::Admin);
        assert_eq!(identity.worker_id(), None);
    }
}
