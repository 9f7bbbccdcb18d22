//! Client for the managed identity service (Identity Toolkit REST API).

use std::fmt;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BackendConfig;
use crate::util::{compact_text, unix_timestamp_now};

const EXPIRY_SKEW_SECONDS: i64 = 60;

/// The signed-in user as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl AuthUser {
    /// Name shown in the protected screens' header.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or("Guest")
    }
}

/// An authenticated session: tokens plus the user they belong to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("The identity backend is not configured for this build.")]
    NotConfigured,
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Session storage error: {0}")]
    SessionStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Where a signed-in session is kept between runs.
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// REST client for sign-up, sign-in, token refresh and session restore.
#[derive(Clone)]
pub struct FirebaseAuthClient<S: SessionPersistence> {
    api_key: String,
    identity_url: String,
    token_url: String,
    client: Client,
    store: S,
}

impl<S: SessionPersistence> FirebaseAuthClient<S> {
    pub fn new(config: &BackendConfig, store: S) -> AuthResult<Self> {
        let api_key = config.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Identity API key must not be empty",
            ));
        }

        Ok(Self {
            api_key,
            identity_url: config.identity_url(),
            token_url: config.token_url(),
            client: Client::builder().build()?,
            store,
        })
    }

    /// Load the persisted session, refreshing it when expired.
    ///
    /// A session that fails to refresh is cleared rather than surfaced as
    /// an error; the caller sees a signed-out state.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored_session) = self.store.load_session()? else {
            return Ok(None);
        };

        if !stored_session.is_expired() {
            return Ok(Some(stored_session));
        }

        match self.refresh_session(&stored_session).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) => {
                tracing::warn!("Failed to refresh persisted session: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.credentials_request("accounts:signUp", email, password)
            .await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.credentials_request("accounts:signInWithPassword", email, password)
            .await
    }

    /// Exchange the refresh token for fresh tokens, keeping the session's
    /// user identity (the token endpoint reports only the user id).
    pub async fn refresh_session(&self, stale: &AuthSession) -> AuthResult<AuthSession> {
        if stale.refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Refresh token must not be empty",
            ));
        }

        let request = self
            .client
            .post(format!("{}/token", self.token_url))
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", stale.refresh_token.as_str()),
            ]);

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        let payload = response.json::<SecureTokenResponse>().await?;
        let session = payload.into_session(stale.user.clone())?;
        self.store.save_session(&session)?;
        Ok(session)
    }

    /// Discard the persisted session. Password sessions have no
    /// server-side state to revoke.
    pub fn sign_out(&self) -> AuthResult<()> {
        self.store.clear_session()
    }

    async fn credentials_request(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let request = self.keyed_request(
            self.client
                .post(format!("{}/{}", self.identity_url, endpoint))
                .json(&payload),
        );

        let response = self.send_auth_request(request).await?;
        let session = response.into_session()?;
        self.store.save_session(&session)?;
        Ok(session)
    }

    fn keyed_request(&self, request: RequestBuilder) -> RequestBuilder {
        request.query(&[("key", self.api_key.as_str())])
    }

    async fn send_auth_request(&self, request: RequestBuilder) -> AuthResult<IdentityAuthResponse> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }
        Ok(response.json::<IdentityAuthResponse>().await?)
    }
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::Api("Email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(AuthError::Api("Password is required".to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityAuthResponse {
    id_token: Option<String>,
    refresh_token: Option<String>,
    /// Seconds until expiry, as a decimal string.
    expires_in: Option<String>,
    local_id: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
}

impl IdentityAuthResponse {
    fn into_session(self) -> AuthResult<AuthSession> {
        let (Some(id_token), Some(refresh_token), Some(local_id)) =
            (self.id_token, self.refresh_token, self.local_id)
        else {
            return Err(AuthError::Api(
                "Auth response did not include enough session fields".to_string(),
            ));
        };

        Ok(AuthSession {
            id_token,
            refresh_token,
            expires_at: expiry_timestamp(self.expires_in.as_deref()),
            user: AuthUser {
                id: local_id,
                email: self.email,
                display_name: self.display_name,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct SecureTokenResponse {
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
}

impl SecureTokenResponse {
    fn into_session(self, user: AuthUser) -> AuthResult<AuthSession> {
        let (Some(id_token), Some(refresh_token)) = (self.id_token, self.refresh_token) else {
            return Err(AuthError::Api(
                "Refresh response did not include fresh tokens".to_string(),
            ));
        };

        Ok(AuthSession {
            id_token,
            refresh_token,
            expires_at: expiry_timestamp(self.expires_in.as_deref()),
            user,
        })
    }
}

fn expiry_timestamp(expires_in: Option<&str>) -> i64 {
    let seconds = expires_in
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(3600);
    unix_timestamp_now().saturating_add(seconds)
}

#[derive(Debug, Deserialize)]
struct IdentityErrorResponse {
    error: Option<IdentityErrorBody>,
}

#[derive(Debug, Deserialize)]
struct IdentityErrorBody {
    message: Option<String>,
}

/// The backend's message text is surfaced to the user as-is, with the
/// HTTP status appended.
fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<IdentityErrorResponse>(body) {
        if let Some(message) = payload.error.and_then(|error| error.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
