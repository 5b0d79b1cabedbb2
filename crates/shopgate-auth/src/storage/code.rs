//! Authorization code store.
//!
//! Codes are single-use and short-lived (10 minutes). The store is a
//! key-value table keyed by the code string with an absolute per-record
//! expiry; expired records are reaped by the store's own TTL sweep, so
//! callers must not rely on synchronous deletion at the exact expiry
//! instant.
//!
//! # Security
//!
//! - `mark_used` must be atomic per key: of two token exchanges racing on
//!   the same code, exactly one observes the unused→used transition.
//! - Never log authorization codes.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::AuthResult;
use crate::secret::generate_authorization_code;

/// A one-time authorization code record.
///
/// Persisted layout: `{authCode, clientId, expiresAt (epoch seconds), used,
/// createdAt}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCode {
    /// The code value (`authcode_` prefix), unique per issuance.
    #[serde(rename = "authCode")]
    pub code: String,

    /// Client the code was issued to.
    pub client_id: String,

    /// Absolute expiry, issuance + code lifetime.
    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,

    /// Set exactly once, on redemption.
    pub used: bool,

    /// Issuance timestamp.
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}

impl AuthorizationCode {
    /// Mints a fresh, unused code for `client_id` expiring after `lifetime`.
    #[must_use]
    pub fn new(client_id: impl Into<String>, lifetime: Duration) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            code: generate_authorization_code(),
            client_id: client_id.into(),
            expires_at: now + lifetime,
            used: false,
            created_at: now,
        }
    }

    /// Returns `true` if the code is past its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }
}

/// Storage operations for authorization codes.
///
/// `get` returns records regardless of their used/expired status (until the
/// TTL sweep reaps them); callers inspect `used` and `expires_at`
/// themselves, so expiry and replay each surface with their own side
/// effects.
#[async_trait]
pub trait AuthorizationCodeStore: Send + Sync {
    /// Persists a freshly minted code.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn put(&self, code: AuthorizationCode) -> AuthResult<()>;

    /// Looks up a code. Returns `None` once the record has been deleted or
    /// reaped.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get(&self, code: &str) -> AuthResult<Option<AuthorizationCode>>;

    /// Atomically flips the record from unused to used.
    ///
    /// Returns `Ok(true)` only for the call that made the transition;
    /// `Ok(false)` if the record was already used or is absent. A marked
    /// record keeps a short residual expiry so the TTL sweep still reaps
    /// it.
    ///
    /// The transition is visible to any `get` that starts after this call
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn mark_used(&self, code: &str) -> AuthResult<bool>;

    /// Removes a record. Deleting an absent code is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete(&self, code: &str) -> AuthResult<()>;

    /// Reaps expired records. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn purge_expired(&self) -> AuthResult<u64>;
}

/// Default residual lifetime kept on a redeemed code.
pub const DEFAULT_USED_RESIDUAL: Duration = Duration::seconds(60);

/// In-memory authorization code store backed by a `DashMap`.
///
/// Per-key atomicity comes from DashMap's shard locking: `mark_used` holds
/// the entry lock for the whole check-and-set.
pub struct MemoryAuthorizationCodeStore {
    codes: DashMap<String, AuthorizationCode>,
    used_residual: Duration,
}

impl MemoryAuthorizationCodeStore {
    /// Creates an empty store with the default 60-second residual expiry
    /// for redeemed codes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_residual(DEFAULT_USED_RESIDUAL)
    }

    /// Creates an empty store with a custom residual expiry.
    #[must_use]
    pub fn with_residual(used_residual: Duration) -> Self {
        Self {
            codes: DashMap::new(),
            used_residual,
        }
    }

    /// Number of records currently held, including expired ones not yet
    /// reaped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for MemoryAuthorizationCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthorizationCodeStore for MemoryAuthorizationCodeStore {
    async fn put(&self, code: AuthorizationCode) -> AuthResult<()> {
        self.codes.insert(code.code.clone(), code);
        Ok(())
    }

    async fn get(&self, code: &str) -> AuthResult<Option<AuthorizationCode>> {
        Ok(self.codes.get(code).map(|entry| entry.clone()))
    }

    async fn mark_used(&self, code: &str) -> AuthResult<bool> {
        let now = OffsetDateTime::now_utc();
        match self.codes.get_mut(code) {
            Some(mut entry) => {
                if entry.used {
                    return Ok(false);
                }
                entry.used = true;
                entry.expires_at = now + self.used_residual;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, code: &str) -> AuthResult<()> {
        self.codes.remove(code);
        Ok(())
    }

    async fn purge_expired(&self) -> AuthResult<u64> {
        let now = OffsetDateTime::now_utc();
        let mut removed = 0u64;
        self.codes.retain(|_, record| {
            if record.expires_at <= now {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_code_shape() {
        let code = AuthorizationCode::new("abc", Duration::minutes(10));
        assert!(code.code.starts_with("authcode_"));
        assert!(!code.used);
        assert_eq!(code.expires_at - code.created_at, Duration::minutes(10));
        assert!(!code.is_expired());
    }

    #[test]
    fn test_persisted_layout() {
        let code = AuthorizationCode::new("abc", Duration::minutes(10));
        let json = serde_json::to_value(&code).unwrap();
        assert!(json["authCode"].is_string());
        assert_eq!(json["clientId"], "abc");
        assert!(json["expiresAt"].is_i64());
        assert_eq!(json["used"], false);
        assert!(json["createdAt"].is_i64());
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryAuthorizationCodeStore::new();
        let code = AuthorizationCode::new("abc", Duration::minutes(10));
        let key = code.code.clone();

        store.put(code).await.unwrap();
        assert!(store.get(&key).await.unwrap().is_some());

        store.delete(&key).await.unwrap();
        assert!(store.get(&key).await.unwrap().is_none());

        // Deleting again is a no-op.
        store.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_mark_used_single_transition() {
        let store = MemoryAuthorizationCodeStore::new();
        let code = AuthorizationCode::new("abc", Duration::minutes(10));
        let key = code.code.clone();
        store.put(code).await.unwrap();

        assert!(store.mark_used(&key).await.unwrap());
        assert!(!store.mark_used(&key).await.unwrap());

        let record = store.get(&key).await.unwrap().unwrap();
        assert!(record.used);
        // Residual expiry keeps the record reapable.
        assert!(record.expires_at <= OffsetDateTime::now_utc() + DEFAULT_USED_RESIDUAL);
    }

    #[tokio::test]
    async fn test_mark_used_absent_code() {
        let store = MemoryAuthorizationCodeStore::new();
        assert!(!store.mark_used("authcode_missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_mark_used_exactly_one_wins() {
        let store = Arc::new(MemoryAuthorizationCodeStore::new());
        let code = AuthorizationCode::new("abc", Duration::minutes(10));
        let key = code.code.clone();
        store.put(code).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            let key = key.clone();
            handles.push(tokio::spawn(
                async move { store.mark_used(&key).await.unwrap() },
            ));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryAuthorizationCodeStore::new();
        let mut expired = AuthorizationCode::new("abc", Duration::minutes(10));
        expired.expires_at = OffsetDateTime::now_utc() - Duration::seconds(1);
        let expired_key = expired.code.clone();
        let live = AuthorizationCode::new("abc", Duration::minutes(10));
        let live_key = live.code.clone();

        store.put(expired).await.unwrap();
        store.put(live).await.unwrap();

        // Expired records are still visible until the sweep runs.
        assert!(store.get(&expired_key).await.unwrap().is_some());

        let removed = store.purge_expired().await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(&expired_key).await.unwrap().is_none());
        assert!(store.get(&live_key).await.unwrap().is_some());
    }
}
