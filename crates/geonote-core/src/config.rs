//! Backend configuration for client apps.
//!
//! Holds the safe-to-ship public values needed to reach the managed
//! identity service and document store. Secret credentials never live
//! here; the id token comes from an authenticated session.

use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, AuthResult};
use crate::util::normalize_text_option;

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const TOKEN_BASE_URL: &str = "https://securetoken.googleapis.com/v1";

/// Public endpoints and keys for the managed backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    pub api_key: String,
    pub project_id: String,
    /// Endpoint overrides for emulators and tests.
    #[serde(default)]
    pub firestore_base_url: Option<String>,
    #[serde(default)]
    pub identity_base_url: Option<String>,
    #[serde(default)]
    pub token_base_url: Option<String>,
}

impl BackendConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            firestore_base_url: None,
            identity_base_url: None,
            token_base_url: None,
        }
    }

    /// Root URL of the project's document collection namespace.
    #[must_use]
    pub fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.firestore_base_url
                .as_deref()
                .unwrap_or(FIRESTORE_BASE_URL)
                .trim_end_matches('/'),
            self.project_id
        )
    }

    #[must_use]
    pub fn identity_url(&self) -> String {
        self.identity_base_url
            .as_deref()
            .unwrap_or(IDENTITY_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }

    #[must_use]
    pub fn token_url(&self) -> String {
        self.token_base_url
            .as_deref()
            .unwrap_or(TOKEN_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }
}

/// Resolve an optional backend configuration from optional inputs.
///
/// Both values present yields a config, both absent yields `None`, and a
/// partial pair is a configuration error.
pub fn resolve_optional_backend_config(
    api_key: Option<String>,
    project_id: Option<String>,
) -> AuthResult<Option<BackendConfig>> {
    let api_key = normalize_text_option(api_key);
    let project_id = normalize_text_option(project_id);

    match (api_key, project_id) {
        (None, None) => Ok(None),
        (Some(api_key), Some(project_id)) => Ok(Some(BackendConfig::new(api_key, project_id))),
        _ => Err(AuthError::NotConfigured),
    }
}

/// Read the backend configuration from `GEONOTE_API_KEY` and
/// `GEONOTE_PROJECT_ID`.
pub fn backend_config_from_env() -> AuthResult<Option<BackendConfig>> {
    resolve_optional_backend_config(
        std::env::var("GEONOTE_API_KEY").ok(),
        std::env::var("GEONOTE_PROJECT_ID").ok(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_url_includes_project_path() {
        let config = BackendConfig::new("key", "demo-project");
        assert_eq!(
            config.documents_url(),
            "https://firestore.googleapis.com/v1/projects/demo-project/databases/(default)/documents"
        );
    }

    #[test]
    fn documents_url_honors_override() {
        let mut config = BackendConfig::new("key", "demo-project");
        config.firestore_base_url = Some("http://localhost:8080/v1/".to_string());
        assert_eq!(
            config.documents_url(),
            "http://localhost:8080/v1/projects/demo-project/databases/(default)/documents"
        );
    }

    #[test]
    fn resolve_requires_both_values() {
        assert!(resolve_optional_backend_config(None, None)
            .unwrap()
            .is_none());
        assert!(resolve_optional_backend_config(
            Some("key".to_string()),
            Some("project".to_string())
        )
        .unwrap()
        .is_some());
        assert!(matches!(
            resolve_optional_backend_config(Some("key".to_string()), None),
            Err(AuthError::NotConfigured)
        ));
        assert!(matches!(
            resolve_optional_backend_config(Some("key".to_string()), Some("  ".to_string())),
            Err(AuthError::NotConfigured)
        ));
    }
}
