//! Single-slot credential cache for the request authorizer.
//!
//! There is exactly one registered client, so the cache is one slot: the
//! current credential record plus a monotonic expiry. Refresh is lazy (on
//! the next read after expiry) and there is no invalidation API; a rotated
//! secret becomes visible within one TTL.
//!
//! Races on population are benign: concurrent fills write the same record,
//! last writer wins.

use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::storage::CredentialRecord;

/// Default time a cached record is served before a refresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

struct Slot {
    record: CredentialRecord,
    expires_at: Instant,
}

/// One-slot cache with a fixed TTL.
pub struct CredentialCache {
    slot: RwLock<Option<Slot>>,
    ttl: Duration,
}

impl CredentialCache {
    /// Creates an empty cache with the default 5-minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    /// Creates an empty cache with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
        }
    }

    /// Returns the cached record if the slot is filled and fresh.
    pub async fn get(&self) -> Option<CredentialRecord> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|s| Instant::now() < s.expires_at)
            .map(|s| s.record.clone())
    }

    /// Stores `record`, stamping a fresh expiry.
    pub async fn put(&self, record: CredentialRecord) {
        let mut slot = self.slot.write().await;
        *slot = Some(Slot {
            record,
            expires_at: Instant::now() + self.ttl,
        });
    }
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::generate_client_secret;

    fn record() -> CredentialRecord {
        CredentialRecord {
            client_id: "abc".to_string(),
            client_secret: generate_client_secret(),
            redirect_uri: "https://app.example.com/callback".to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_cache_misses() {
        let cache = CredentialCache::new();
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = CredentialCache::new();
        let rec = record();
        cache.put(rec.clone()).await;
        assert_eq!(cache.get().await, Some(rec));
    }

    #[tokio::test]
    async fn test_expired_slot_misses() {
        let cache = CredentialCache::with_ttl(Duration::ZERO);
        cache.put(record()).await;
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_slot() {
        let cache = CredentialCache::new();
        cache.put(record()).await;
        let newer = record();
        cache.put(newer.clone()).await;
        assert_eq!(cache.get().await, Some(newer));
    }
}
