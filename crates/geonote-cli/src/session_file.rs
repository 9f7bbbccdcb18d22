//! File-based session storage for the CLI.
//!
//! Sessions are kept as a JSON file under the user's config directory so
//! a login survives across invocations. The file holds tokens; it is
//! written with the process default permissions and can be discarded at
//! any time (the next command simply asks for a login).

use std::fs;
use std::io;
use std::path::PathBuf;

use geonote_core::auth::{AuthError, AuthResult, AuthSession, SessionPersistence};

#[derive(Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("geonote")
            .join("session.json")
    }
}

impl SessionPersistence for FileSessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(storage_error("read", &error)),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|error| storage_error("parse", &error))
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| storage_error("prepare", &error))?;
        }

        let raw = serde_json::to_string_pretty(session)
            .map_err(|error| storage_error("serialize", &error))?;
        fs::write(&self.path, raw).map_err(|error| storage_error("write", &error))
    }

    fn clear_session(&self) -> AuthResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(storage_error("remove", &error)),
        }
    }
}

fn storage_error(action: &str, error: &dyn std::fmt::Display) -> AuthError {
    AuthError::SessionStorage(format!("failed to {action} session file: {error}"))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use geonote_core::auth::AuthUser;
    use pretty_assertions::assert_eq;

    use super::*;

    fn unique_session_path() -> PathBuf {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_nanos());
        let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir()
            .join(format!("geonote-session-test-{timestamp}-{sequence}"))
            .join("session.json")
    }

    fn sample_session() -> AuthSession {
        AuthSession {
            id_token: "id-token".to_string(),
            refresh_token: "refresh-token".to_string(),
            expires_at: 1_900_000_000,
            user: AuthUser {
                id: "uid-1".to_string(),
                email: Some("a@b.c".to_string()),
                display_name: None,
            },
        }
    }

    #[test]
    fn missing_file_loads_as_no_session() {
        let store = FileSessionStore::new(unique_session_path());
        assert_eq!(store.load_session().unwrap(), None);
    }

    #[test]
    fn save_load_clear_cycle() {
        let path = unique_session_path();
        let store = FileSessionStore::new(path.clone());

        store.save_session(&sample_session()).unwrap();
        assert_eq!(store.load_session().unwrap(), Some(sample_session()));

        store.clear_session().unwrap();
        assert_eq!(store.load_session().unwrap(), None);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn clear_of_missing_file_succeeds() {
        let store = FileSessionStore::new(unique_session_path());
        store.clear_session().unwrap();
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let path = unique_session_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let store = FileSessionStore::new(path.clone());
        assert!(matches!(
            store.load_session(),
            Err(AuthError::SessionStorage(_))
        ));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
