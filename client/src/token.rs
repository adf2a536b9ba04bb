//! Token store adapters: a scoped file with expiry for real use and an
//! in-memory store for tests and embedders with their own persistence.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::auth::BearerToken;
use crate::domain::ports::{TokenStore, TokenStoreError};

/// Default credential lifetime: seven days.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Serialize, Deserialize)]
struct StoredToken {
    token: String,
    stored_at: DateTime<Utc>,
}

/// File-backed token store scoped to one path, with owner-only permissions
/// on Unix and a configurable expiry.
pub struct FileTokenStore {
    path: PathBuf,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl FileTokenStore {
    /// Store at `path` with an explicit lifetime.
    #[must_use]
    pub fn new(path: PathBuf, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { path, ttl, clock }
    }

    /// Store at `path` with the default seven-day lifetime.
    #[must_use]
    pub fn with_default_ttl(path: PathBuf, clock: Arc<dyn Clock>) -> Self {
        Self::new(path, DEFAULT_TOKEN_TTL, clock)
    }

    fn read(&self) -> Option<StoredToken> {
        let raw = std::fs::read(&self.path).ok()?;
        match serde_json::from_slice(&raw) {
            Ok(stored) => Some(stored),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "unreadable token file");
                None
            }
        }
    }

    fn is_expired(&self, stored: &StoredToken) -> bool {
        let age = self.clock.utc() - stored.stored_at;
        age.to_std().map_or(true, |age| age > self.ttl)
    }

    #[cfg(unix)]
    fn restrict_permissions(&self) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
    }

    #[cfg(not(unix))]
    fn restrict_permissions(&self) -> std::io::Result<()> {
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<BearerToken> {
        let stored = self.read()?;
        if self.is_expired(&stored) {
            debug!(path = %self.path.display(), "stored token has expired");
            return None;
        }
        BearerToken::parse(&stored.token).ok()
    }

    fn set(&self, raw: &str) -> Result<(), TokenStoreError> {
        let token = BearerToken::parse(raw)?;
        let stored = StoredToken {
            token: token.as_str().to_owned(),
            stored_at: self.clock.utc(),
        };
        let payload =
            serde_json::to_vec(&stored).map_err(|error| TokenStoreError::Storage {
                message: error.to_string(),
            })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| TokenStoreError::Storage {
                message: error.to_string(),
            })?;
        }
        std::fs::write(&self.path, payload).map_err(|error| TokenStoreError::Storage {
            message: error.to_string(),
        })?;
        self.restrict_permissions()
            .map_err(|error| TokenStoreError::Storage {
                message: error.to_string(),
            })
    }

    fn remove(&self) {
        if let Err(error) = std::fs::remove_file(&self.path) {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), %error, "failed to remove token file");
            }
        }
    }

    fn exists(&self) -> bool {
        self.get().is_some()
    }
}

/// Process-local token store.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<BearerToken>>,
}

impl MemoryTokenStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<BearerToken>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<BearerToken> {
        self.slot().clone()
    }

    fn set(&self, raw: &str) -> Result<(), TokenStoreError> {
        let token = BearerToken::parse(raw)?;
        *self.slot() = Some(token);
        Ok(())
    }

    fn remove(&self) {
        *self.slot() = None;
    }

    fn exists(&self) -> bool {
        self.slot().is_some()
    }
}

#[cfg(test)]
mod tests {
    //! File and memory store coverage, with a pinned clock for expiry.

    use super::*;
    use chrono::Local;

    const TOKEN: &str = "1|abcdefghijklmnopqrstuvwxyz";

    struct FixtureClock {
        utc_now: DateTime<Utc>,
    }

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.utc_now.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.utc_now
        }
    }

    fn clock_at(timestamp: &str) -> Arc<dyn Clock> {
        let utc_now = timestamp
            .parse::<DateTime<Utc>>()
            .expect("valid fixture timestamp");
        Arc::new(FixtureClock { utc_now })
    }

    fn store_in(dir: &tempfile::TempDir, clock: Arc<dyn Clock>) -> FileTokenStore {
        FileTokenStore::new(dir.path().join("token.json"), DEFAULT_TOKEN_TTL, clock)
    }

    #[test]
    fn round_trips_a_valid_token() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = store_in(&dir, clock_at("2024-05-01T08:00:00Z"));

        store.set(TOKEN).expect("valid token persists");
        assert!(store.exists());
        assert_eq!(
            store.get().map(|token| token.as_str().to_owned()),
            Some(TOKEN.to_owned()),
        );

        store.remove();
        assert!(!store.exists());
    }

    #[test]
    fn rejects_malformed_tokens_without_touching_storage() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = store_in(&dir, clock_at("2024-05-01T08:00:00Z"));

        let error = store.set("short").expect_err("short token must fail");
        assert!(matches!(error, TokenStoreError::InvalidFormat(_)));
        assert!(!store.exists(), "nothing may be persisted on failure");
    }

    #[test]
    fn expired_tokens_read_as_absent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("token.json");

        let writer = FileTokenStore::new(
            path.clone(),
            DEFAULT_TOKEN_TTL,
            clock_at("2024-05-01T08:00:00Z"),
        );
        writer.set(TOKEN).expect("token persists");

        // Eight days later the entry has outlived its ttl.
        let reader = FileTokenStore::new(path, DEFAULT_TOKEN_TTL, clock_at("2024-05-09T08:00:01Z"));
        assert_eq!(reader.get(), None);
        assert!(!reader.exists());
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryTokenStore::new();
        assert!(!store.exists());

        store.set(TOKEN).expect("valid token stores");
        assert!(store.exists());

        store.remove();
        assert_eq!(store.get(), None);
    }
}
