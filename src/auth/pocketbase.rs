//! PocketBase auth client: the `users` auth collection over REST.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::AuthError;

use super::{AuthProvider, AuthUser};

const USERS_COLLECTION: &str = "users";

/// Token and record from a successful sign-in.
struct AuthSession {
    token: SecretString,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    record: AuthUser,
}

/// PocketBase error body: `{"code":400,"message":"...","data":{...}}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Email/password auth against a PocketBase server.
pub struct PocketBaseAuth {
    base_url: String,
    client: reqwest::Client,
    session: RwLock<Option<AuthSession>>,
}

impl PocketBaseAuth {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            session: RwLock::new(None),
        }
    }

    fn collection_url(&self, path: &str) -> String {
        format!(
            "{}/api/collections/{USERS_COLLECTION}/{path}",
            self.base_url
        )
    }

    /// Auth token of the current session, if signed in.
    pub async fn token(&self) -> Option<SecretString> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| SecretString::from(s.token.expose_secret().to_string()))
    }
}

#[async_trait]
impl AuthProvider for PocketBaseAuth {
    fn name(&self) -> &str {
        "pocketbase"
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthUser, AuthError> {
        info!(email = email, "Registering new user");
        let password = SecretString::from(password.to_string());

        let body = serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
            "passwordConfirm": password.expose_secret(),
            "displayName": display_name,
            "emailVisibility": true,
        });

        let resp = self
            .client
            .post(self.collection_url("records"))
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let reason = error_message(&resp.text().await.unwrap_or_default())
                .unwrap_or_else(|| format!("status {status}"));
            warn!(email = email, %status, "Registration rejected");
            return Err(AuthError::RegistrationRejected { reason });
        }

        self.login(email, password.expose_secret()).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        info!(email = email, "Logging in");
        let body = serde_json::json!({
            "identity": email,
            "password": password,
        });

        let resp = self
            .client
            .post(self.collection_url("auth-with-password"))
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = resp.status();
        if status.is_client_error() {
            warn!(email = email, %status, "Login rejected");
            return Err(AuthError::InvalidCredentials {
                email: email.to_string(),
            });
        }
        if !status.is_success() {
            return Err(AuthError::Request(format!("status {status}")));
        }

        let auth: AuthResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        let user = auth.record.clone();
        *self.session.write().await = Some(AuthSession {
            token: SecretString::from(auth.token),
            user: auth.record,
        });
        info!(user_id = %user.id, "Login successful");
        Ok(user)
    }

    async fn login_with_provider(&self, provider: &str) -> Result<AuthUser, AuthError> {
        // OAuth2 needs a browser redirect back to the app.
        Err(AuthError::ProviderUnavailable {
            provider: provider.to_string(),
            reason: "OAuth2 sign-in requires a browser redirect".to_string(),
        })
    }

    async fn logout(&self) {
        if self.session.write().await.take().is_some() {
            info!("Logged out");
        }
    }

    async fn current_user(&self) -> Option<AuthUser> {
        self.session.read().await.as_ref().map(|s| s.user.clone())
    }
}

/// Pull the human-readable message out of a PocketBase error body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_use_users_collection() {
        let auth = PocketBaseAuth::new("http://127.0.0.1:8090/");
        assert_eq!(
            auth.collection_url("auth-with-password"),
            "http://127.0.0.1:8090/api/collections/users/auth-with-password"
        );
        assert_eq!(
            auth.collection_url("records"),
            "http://127.0.0.1:8090/api/collections/users/records"
        );
    }

    #[test]
    fn parses_auth_response() {
        let json = r#"{"token":"abc","record":{"id":"u1","email":"a@b.c","displayName":"Sam","verified":false}}"#;
        let resp: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.token, "abc");
        assert_eq!(resp.record.display_name(), Some("Sam"));
    }

    #[test]
    fn extracts_error_message() {
        assert_eq!(
            error_message(r#"{"code":400,"message":"Failed to create record.","data":{}}"#)
                .as_deref(),
            Some("Failed to create record.")
        );
        assert_eq!(error_message("not json"), None);
        assert_eq!(error_message(r#"{"code":400}"#), None);
    }

    #[tokio::test]
    async fn oauth_is_unavailable() {
        let auth = PocketBaseAuth::new("http://127.0.0.1:8090");
        let err = auth.login_with_provider("google").await.unwrap_err();
        assert!(matches!(err, AuthError::ProviderUnavailable { .. }));
    }

    #[tokio::test]
    async fn starts_logged_out() {
        let auth = PocketBaseAuth::new("http://127.0.0.1:8090");
        assert!(!auth.is_logged_in().await);
        assert!(auth.current_user().await.is_none());
        assert!(auth.token().await.is_none());
        auth.logout().await;
    }
}
