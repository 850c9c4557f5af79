use serde::{Deserialize, Serialize};

use crate::io::store::{SESSION_KEY, Store};

/// Error type for the auth gate.
///
/// Validation failures are caught locally before any network call; a
/// service failure carries the identity service's message verbatim.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("enter a valid email address")]
    InvalidEmail,
    #[error("password must be at least 6 characters")]
    ShortPassword,
    #[error("no identity service configured (set [auth] base_url in config.toml)")]
    NotConfigured,
    #[error("{0}")]
    Service(String),
    #[error("could not reach the identity service: {0}")]
    Network(#[from] reqwest::Error),
}

/// A signed-in session, persisted in the store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub email: String,
    pub token: String,
}

impl Session {
    pub fn load(store: &Store) -> Option<Session> {
        store.read(SESSION_KEY)
    }

    pub fn save(&self, store: &Store) {
        store.write(SESSION_KEY, self);
    }

    pub fn clear(store: &Store) {
        store.remove(SESSION_KEY);
    }
}

/// Reject malformed credentials before any network call.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    let (local, domain) = email.split_once('@').ok_or(AuthError::InvalidEmail)?;
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') {
        return Err(AuthError::InvalidEmail);
    }
    if password.chars().count() < 6 {
        return Err(AuthError::ShortPassword);
    }
    Ok(())
}

#[derive(Serialize)]
struct CredentialBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct ServiceError {
    error: String,
}

/// Thin client for the hosted identity service.
pub struct AuthGate {
    client: reqwest::Client,
    base_url: String,
}

impl AuthGate {
    pub fn new(base_url: String) -> AuthGate {
        AuthGate {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.call("signin", email, password).await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.call("signup", email, password).await
    }

    async fn call(&self, path: &str, email: &str, password: &str) -> Result<Session, AuthError> {
        validate_credentials(email, password)?;

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .post(&url)
            .json(&CredentialBody { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            // Surface the service's message verbatim; no retry
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ServiceError>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            return Err(AuthError::Service(message));
        }

        let token: TokenResponse = response.json().await?;
        Ok(Session {
            email: email.to_string(),
            token: token.token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn malformed_email_rejected_locally() {
        assert!(matches!(
            validate_credentials("not-an-email", "secret1"),
            Err(AuthError::InvalidEmail)
        ));
        assert!(matches!(
            validate_credentials("@nope.com", "secret1"),
            Err(AuthError::InvalidEmail)
        ));
        assert!(matches!(
            validate_credentials("user@nodot", "secret1"),
            Err(AuthError::InvalidEmail)
        ));
    }

    #[test]
    fn short_password_rejected_locally() {
        assert!(matches!(
            validate_credentials("user@example.com", "12345"),
            Err(AuthError::ShortPassword)
        ));
        assert!(validate_credentials("user@example.com", "123456").is_ok());
    }

    #[test]
    fn session_round_trips_through_store() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        assert!(Session::load(&store).is_none());

        let session = Session {
            email: "user@example.com".into(),
            token: "tok-123".into(),
        };
        session.save(&store);
        let loaded = Session::load(&store).unwrap();
        assert_eq!(loaded.token, "tok-123");

        Session::clear(&store);
        assert!(Session::load(&store).is_none());
    }
}
