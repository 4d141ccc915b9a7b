use thiserror::Error;
use uuid::Uuid;

use crate::config;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A freshly generated secret and its bcrypt hash. Only the hash is stored;
/// the key goes back to the client once.
#[derive(Debug, Clone)]
pub struct KeyHash {
    pub key: String,
    pub hash: String,
}

/// bcrypt hash at the configured cost, computed off the async runtime
pub async fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let plain = plain.to_string();
    let cost = config::config().auth.bcrypt_cost;
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;
    Ok(hash)
}

/// Compare a candidate against a stored hash. A malformed hash never matches.
pub async fn verify_password(plain: &str, hash: &str) -> Result<bool, PasswordError> {
    let plain = plain.to_string();
    let hash = hash.to_string();
    let matched = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash).unwrap_or(false)).await?;
    Ok(matched)
}

/// New random key (UUID v4) with its hash; used for session keys and reset tokens
pub async fn generate_key_hash() -> Result<KeyHash, PasswordError> {
    let key = Uuid::new_v4().to_string();
    let hash = hash_password(&key).await?;
    Ok(KeyHash { key, hash })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("bighandshake").await.unwrap();
        assert_ne!(hash, "bighandshake");
        assert!(verify_password("bighandshake", &hash).await.unwrap());
        assert!(!verify_password("littlehandshake", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash").await.unwrap());
    }

    #[tokio::test]
    async fn key_hash_matches_its_key() {
        let key_hash = generate_key_hash().await.unwrap();
        assert_eq!(key_hash.key.len(), 36);
        assert!(verify_password(&key_hash.key, &key_hash.hash).await.unwrap());
    }
}
