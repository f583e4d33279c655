use async_trait::async_trait;
use quiz_core::model::UserId;

/// Authentication collaborator: resolves the caller for the current request.
///
/// Identity and session cookies live outside this core; all it needs per
/// request is "who is calling, if anyone". `None` is reported uniformly as
/// Unauthorized by the operation surface.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_user(&self) -> Option<UserId>;
}

/// Always authenticates as one fixed user. For tests and single-user tools.
#[derive(Debug, Clone, Copy)]
pub struct FixedAuth(pub UserId);

#[async_trait]
impl AuthProvider for FixedAuth {
    async fn current_user(&self) -> Option<UserId> {
        Some(self.0)
    }
}

/// Never authenticates. For exercising the Unauthorized path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl AuthProvider for NoAuth {
    async fn current_user(&self) -> Option<UserId> {
        None
    }
}
