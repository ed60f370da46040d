//! Authentication: provider trait and the PocketBase client.

pub mod pocketbase;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

pub use pocketbase::PocketBaseAuth;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    /// Display name chosen at registration, if any.
    #[serde(rename = "displayName", alias = "name", default)]
    pub name: Option<String>,
}

impl AuthUser {
    /// Name to show on the user's messages.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// An identity provider. Auth is the first onboarding gate.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Create an account and sign in with it.
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthUser, AuthError>;

    async fn login(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Sign in through a third-party identity provider such as `google`.
    async fn login_with_provider(&self, provider: &str) -> Result<AuthUser, AuthError>;

    async fn logout(&self);

    async fn current_user(&self) -> Option<AuthUser>;

    async fn is_logged_in(&self) -> bool {
        self.current_user().await.is_some()
    }
}
