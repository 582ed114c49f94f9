// Encryption at rest for the session store.
//
// AES-256-GCM with a random nonce per value; the stored form is
// `FAv1:` + base64(nonce || ciphertext+tag). The 32-byte key is created lazily
// in a file next to the store and reused afterwards.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use anyhow::{Context, Result};
use base64::Engine;
use log::info;
use ring::rand::{SecureRandom, SystemRandom};
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

const ENC_PREFIX: &str = "FAv1:";
const KEY_BYTES: usize = 32;
const NONCE_BYTES: usize = 12;

#[derive(Debug)]
pub struct SecretProtector {
    key_path: PathBuf,
    key: OnceCell<[u8; KEY_BYTES]>,
}

impl SecretProtector {
    pub fn new(key_path: PathBuf) -> Self {
        Self {
            key_path,
            key: OnceCell::new(),
        }
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    pub fn is_encrypted(&self, value: &str) -> bool {
        value.starts_with(ENC_PREFIX)
    }

    pub async fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = self.cipher().await?;

        let mut nonce_bytes = [0u8; NONCE_BYTES];
        SystemRandom::new()
            .fill(&mut nonce_bytes)
            .map_err(|_| anyhow::anyhow!("Failed to generate nonce"))?;

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| anyhow::anyhow!("Encryption failed"))?;

        let mut blob = Vec::with_capacity(NONCE_BYTES + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);

        Ok(format!(
            "{}{}",
            ENC_PREFIX,
            base64::engine::general_purpose::STANDARD.encode(blob)
        ))
    }

    /// Decrypts a value produced by [`encrypt`](Self::encrypt). Anything
    /// without the prefix is rejected; the store never holds plaintext.
    pub async fn decrypt(&self, value: &str) -> Result<String> {
        let Some(encoded) = value.strip_prefix(ENC_PREFIX) else {
            anyhow::bail!("Value is not encrypted");
        };

        let blob = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .context("Failed to base64-decode encrypted value")?;
        if blob.len() < NONCE_BYTES {
            anyhow::bail!("Encrypted value is too short");
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_BYTES);

        let plaintext = self
            .cipher()
            .await?
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| anyhow::anyhow!("Decryption failed (wrong key or tampered value)"))?;
        String::from_utf8(plaintext).context("Decrypted value is not valid UTF-8")
    }

    async fn cipher(&self) -> Result<Aes256Gcm> {
        let key = self.get_or_init_key().await?;
        Aes256Gcm::new_from_slice(key).map_err(|_| anyhow::anyhow!("Invalid AES-256 key length"))
    }

    async fn get_or_init_key(&self) -> Result<&[u8; KEY_BYTES]> {
        self.key
            .get_or_try_init(|| async {
                if tokio::fs::try_exists(&self.key_path).await.unwrap_or(false) {
                    return read_key(&self.key_path).await;
                }

                if let Some(parent) = self.key_path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Failed to create key directory: {:?}", parent))?;
                }

                let mut key_bytes = [0u8; KEY_BYTES];
                SystemRandom::new()
                    .fill(&mut key_bytes)
                    .map_err(|_| anyhow::anyhow!("Failed to generate key"))?;

                let encoded = base64::engine::general_purpose::STANDARD.encode(key_bytes);
                let write_action = || async {
                    use tokio::io::AsyncWriteExt;
                    let mut file = tokio::fs::OpenOptions::new()
                        .write(true)
                        .create_new(true)
                        .open(&self.key_path)
                        .await
                        .with_context(|| format!("Failed to create key file: {:?}", self.key_path))?;
                    file.write_all(encoded.as_bytes()).await?;
                    file.flush().await?;
                    Ok::<(), anyhow::Error>(())
                };

                let retry_strategy = ExponentialBackoff::from_millis(50)
                    .factor(2)
                    .max_delay(std::time::Duration::from_millis(750))
                    .take(3)
                    .map(jitter);

                match RetryIf::spawn(retry_strategy, write_action, is_transient_io_error).await {
                    Ok(()) => {
                        info!(
                            "[PHASE: security] [STEP: key] created session key at {:?}",
                            self.key_path
                        );
                        Ok(key_bytes)
                    }
                    // Another process won the race; use its key.
                    Err(e) if io_kind(&e) == Some(std::io::ErrorKind::AlreadyExists) => {
                        read_key(&self.key_path).await
                    }
                    Err(e) => Err(e),
                }
            })
            .await
    }
}

async fn read_key(path: &Path) -> Result<[u8; KEY_BYTES]> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read key file: {:?}", path))?;
    let text = String::from_utf8_lossy(&bytes);
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(text.trim())
        .context("Failed to decode key file (base64)")?;
    if decoded.len() != KEY_BYTES {
        anyhow::bail!("Key file has invalid length (expected {KEY_BYTES} bytes)");
    }
    let mut key = [0u8; KEY_BYTES];
    key.copy_from_slice(&decoded);
    Ok(key)
}

fn io_kind(err: &anyhow::Error) -> Option<std::io::ErrorKind> {
    err.downcast_ref::<std::io::Error>().map(std::io::Error::kind)
}

fn is_transient_io_error(err: &anyhow::Error) -> bool {
    matches!(
        io_kind(err),
        Some(std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut)
    )
}

/// Key file location inside the data folder.
pub fn default_key_path(data_dir: &Path) -> PathBuf {
    data_dir.join("keys").join("session.key")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_creates_the_key_once() {
        let tmp = tempfile::tempdir().unwrap();
        let key_path = default_key_path(tmp.path());
        let protector = SecretProtector::new(key_path.clone());

        let sealed = protector.encrypt("eyJhbGciOi.token").await.unwrap();
        assert!(protector.is_encrypted(&sealed));
        assert!(!sealed.contains("eyJhbGciOi"));
        assert!(key_path.exists());
        assert_eq!(protector.decrypt(&sealed).await.unwrap(), "eyJhbGciOi.token");

        // A second protector over the same key file reads the same key.
        let again = SecretProtector::new(key_path);
        assert_eq!(again.decrypt(&sealed).await.unwrap(), "eyJhbGciOi.token");
    }

    #[tokio::test]
    async fn nonces_differ_per_call() {
        let tmp = tempfile::tempdir().unwrap();
        let protector = SecretProtector::new(default_key_path(tmp.path()));
        let a = protector.encrypt("same").await.unwrap();
        let b = protector.encrypt("same").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn foreign_key_or_plaintext_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let one = SecretProtector::new(tmp.path().join("one.key"));
        let two = SecretProtector::new(tmp.path().join("two.key"));
        let sealed = one.encrypt("secret").await.unwrap();
        assert!(two.decrypt(&sealed).await.is_err());
        assert!(one.decrypt("plain text").await.is_err());
    }
}
