// Key-based persistent storage for the signed-in session.

use async_trait::async_trait;
use log::{info, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tokio::sync::Mutex;

use super::crypto::secret_fingerprint;
use super::secret_protector::SecretProtector;
use super::token;
use crate::models::state::Session;

pub const SESSION_KEY: &str = "session";

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session store contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Crypto(#[from] anyhow::Error),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError>;
    async fn remove(&self, key: &str) -> Result<(), SessionStoreError>;
    async fn clear(&self) -> Result<(), SessionStoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionStoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

/// JSON object on disk; every value is sealed by the [`SecretProtector`].
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    protector: SecretProtector,
    // Serializes read-modify-write cycles within the process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf, protector: SecretProtector) -> Self {
        Self {
            path,
            protector,
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, SessionStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let _guard = self.lock.lock().await;
        let entries = self.read_all().await?;
        match entries.get(key) {
            Some(sealed) => Ok(Some(self.protector.decrypt(sealed).await?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), self.protector.encrypt(value).await?);
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), SessionStoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

pub async fn save_session(store: &dyn KeyValueStore, session: &Session) -> Result<(), SessionStoreError> {
    store.set(SESSION_KEY, &serde_json::to_string(session)?).await?;
    info!(
        "[PHASE: session] [STEP: save] session stored (token_fingerprint={})",
        secret_fingerprint(&session.token)
    );
    Ok(())
}

/// The stored session, if it is readable and its token has not expired.
/// Unreadable or expired entries are removed.
pub async fn load_session(store: &dyn KeyValueStore) -> Result<Option<Session>, SessionStoreError> {
    let raw = match store.get(SESSION_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Ok(None),
        Err(SessionStoreError::Crypto(e)) => {
            warn!("[PHASE: session] [STEP: load] stored session unreadable, discarding: {}", e);
            store.remove(SESSION_KEY).await?;
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let session: Session = match serde_json::from_str(&raw) {
        Ok(session) => session,
        Err(e) => {
            warn!("[PHASE: session] [STEP: load] stored session malformed, discarding: {}", e);
            store.remove(SESSION_KEY).await?;
            return Ok(None);
        }
    };

    if token::is_expired(&session.token) {
        info!(
            "[PHASE: session] [STEP: load] stored session expired (token_fingerprint={})",
            secret_fingerprint(&session.token)
        );
        store.remove(SESSION_KEY).await?;
        return Ok(None);
    }
    Ok(Some(session))
}

pub async fn clear_session(store: &dyn KeyValueStore) -> Result<(), SessionStoreError> {
    store.remove(SESSION_KEY).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::responses::User;
    use crate::security::secret_protector::default_key_path;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn file_store(dir: &std::path::Path) -> FileStore {
        FileStore::new(
            dir.join("session.json"),
            SecretProtector::new(default_key_path(dir)),
        )
    }

    fn jwt(exp: i64) -> String {
        let claims = token::Claims {
            exp: Some(exp),
            ..Default::default()
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap()
    }

    fn session(token: String) -> Session {
        Session::new(
            token,
            User {
                id: "u-1".to_string(),
                full_name: "Rosa Diaz".to_string(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn file_store_keeps_values_sealed_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let store = file_store(tmp.path());
        store.set("theme", "dark").await.unwrap();
        store.set("lang", "pt").await.unwrap();

        let on_disk = std::fs::read_to_string(tmp.path().join("session.json")).unwrap();
        assert!(!on_disk.contains("dark"));
        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("dark"));

        store.remove("theme").await.unwrap();
        assert_eq!(store.get("theme").await.unwrap(), None);
        assert_eq!(store.get("lang").await.unwrap().as_deref(), Some("pt"));

        store.clear().await.unwrap();
        assert_eq!(store.get("lang").await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn live_session_survives_a_restart() {
        let tmp = tempfile::tempdir().unwrap();
        let live = session(jwt(chrono::Utc::now().timestamp() + 3600));
        save_session(&file_store(tmp.path()), &live).await.unwrap();

        let reopened = file_store(tmp.path());
        let loaded = load_session(&reopened).await.unwrap().unwrap();
        assert_eq!(loaded.greeting(), "Welcome back, Rosa Diaz");
    }

    #[tokio::test]
    async fn expired_session_is_dropped() {
        let store = MemoryStore::default();
        save_session(&store, &session(jwt(1_000))).await.unwrap();
        assert!(load_session(&store).await.unwrap().is_none());
        assert_eq!(store.get(SESSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_session_is_dropped() {
        let store = MemoryStore::default();
        store.set(SESSION_KEY, "{not json").await.unwrap();
        assert!(load_session(&store).await.unwrap().is_none());
        assert_eq!(store.get(SESSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_session_signs_out() {
        let store = MemoryStore::default();
        save_session(&store, &session("opaque".to_string())).await.unwrap();
        assert!(load_session(&store).await.unwrap().is_some());
        clear_session(&store).await.unwrap();
        assert!(load_session(&store).await.unwrap().is_none());
    }
}
