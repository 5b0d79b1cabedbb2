//! Bearer-token request authorizer.
//!
//! Gates every protected call: the authorization header must carry a
//! `Bearer` token with the access-token prefix and a minimum length. Tokens
//! are validated by format only; there is no revocation table. A passing
//! token resolves the registered client (through a 5-minute single-slot
//! cache) as the principal, and the resulting allow decision covers every
//! method and resource beneath the request's two leading path segments.
//!
//! Every failure collapses to the same deny decision. Callers learn nothing
//! about which check failed.

pub mod cache;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::secret::{ACCESS_TOKEN_PREFIX, MIN_ACCESS_TOKEN_LEN};
use crate::storage::CredentialStore;

pub use cache::{CredentialCache, DEFAULT_CACHE_TTL};

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The caller may proceed.
    Allow,
    /// The caller is rejected.
    Deny,
}

/// Access-control decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    /// Allow or deny.
    pub effect: Effect,

    /// The authenticated principal; `None` on deny.
    pub principal_id: Option<String>,

    /// Resource the decision covers. On allow this is the wildcard scope;
    /// on deny it is the resource exactly as requested.
    pub resource: String,
}

impl AccessDecision {
    /// Returns `true` for an allow decision.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }

    fn deny(resource: &str) -> Self {
        Self {
            effect: Effect::Deny,
            principal_id: None,
            resource: resource.to_string(),
        }
    }
}

/// Validates bearer tokens and produces access decisions.
pub struct RequestAuthorizer {
    credentials: Arc<dyn CredentialStore>,
    cache: CredentialCache,
}

impl RequestAuthorizer {
    /// Creates an authorizer over `credentials` with the default cache TTL.
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self::with_cache(credentials, CredentialCache::new())
    }

    /// Creates an authorizer with a caller-provided cache (tests tune the
    /// TTL through this).
    pub fn with_cache(credentials: Arc<dyn CredentialStore>, cache: CredentialCache) -> Self {
        Self { credentials, cache }
    }

    /// Checks `authorization` and decides access to `resource`.
    ///
    /// `resource` is the path of the protected request, e.g.
    /// `/admin/orders/123`. An allow decision is scoped to
    /// `/admin/orders/*`.
    pub async fn authorize_request(
        &self,
        authorization: Option<&str>,
        resource: &str,
    ) -> AccessDecision {
        let Some(header) = authorization else {
            return AccessDecision::deny(resource);
        };
        let Some(token) = header.strip_prefix("Bearer ") else {
            return AccessDecision::deny(resource);
        };
        if !token.starts_with(ACCESS_TOKEN_PREFIX) || token.len() < MIN_ACCESS_TOKEN_LEN {
            return AccessDecision::deny(resource);
        }

        let record = match self.resolve_credential().await {
            Some(record) => record,
            None => return AccessDecision::deny(resource),
        };

        debug!(client_id = %record.client_id, "request authorized");
        AccessDecision {
            effect: Effect::Allow,
            principal_id: Some(record.client_id),
            resource: wildcard_scope(resource),
        }
    }

    async fn resolve_credential(&self) -> Option<crate::storage::CredentialRecord> {
        if let Some(record) = self.cache.get().await {
            return Some(record);
        }
        match self.credentials.get_current().await {
            Ok(record) => {
                self.cache.put(record.clone()).await;
                Some(record)
            }
            Err(error) => {
                warn!(error = %error, "credential lookup failed during authorization");
                None
            }
        }
    }
}

/// Collapses `resource` to a wildcard under its two leading path segments.
///
/// `/admin/orders/123` becomes `/admin/orders/*`; a path with fewer than two
/// segments keeps what it has before the wildcard.
fn wildcard_scope(resource: &str) -> String {
    let prefix: Vec<&str> = resource
        .split('/')
        .filter(|segment| !segment.is_empty())
        .take(2)
        .collect();
    if prefix.is_empty() {
        "/*".to_string()
    } else {
        format!("/{}/*", prefix.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::{generate_access_token, generate_client_secret};
    use crate::storage::{CredentialRecord, MemoryCredentialStore};

    fn authorizer() -> RequestAuthorizer {
        let record = CredentialRecord {
            client_id: "abc".to_string(),
            client_secret: generate_client_secret(),
            redirect_uri: "https://app.example.com/callback".to_string(),
        };
        RequestAuthorizer::new(Arc::new(MemoryCredentialStore::new(record)))
    }

    #[test]
    fn test_wildcard_scope() {
        assert_eq!(wildcard_scope("/admin/orders/123"), "/admin/orders/*");
        assert_eq!(wildcard_scope("/admin/orders"), "/admin/orders/*");
        assert_eq!(wildcard_scope("/admin"), "/admin/*");
        assert_eq!(wildcard_scope("/"), "/*");
    }

    #[tokio::test]
    async fn test_valid_token_allows() {
        let authorizer = authorizer();
        let header = format!("Bearer {}", generate_access_token());
        let decision = authorizer
            .authorize_request(Some(&header), "/admin/orders/123")
            .await;
        assert!(decision.is_allowed());
        assert_eq!(decision.principal_id.as_deref(), Some("abc"));
        assert_eq!(decision.resource, "/admin/orders/*");
    }

    #[tokio::test]
    async fn test_missing_header_denies() {
        let decision = authorizer()
            .authorize_request(None, "/admin/orders/123")
            .await;
        assert_eq!(decision.effect, Effect::Deny);
        assert!(decision.principal_id.is_none());
        // Deny keeps the resource exactly as requested.
        assert_eq!(decision.resource, "/admin/orders/123");
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_denies() {
        let decision = authorizer()
            .authorize_request(Some("Basic abc123"), "/admin/orders")
            .await;
        assert_eq!(decision.effect, Effect::Deny);
    }

    #[tokio::test]
    async fn test_wrong_prefix_denies() {
        let decision = authorizer()
            .authorize_request(
                Some("Bearer authcode_0123456789012345678901234567890"),
                "/admin/orders",
            )
            .await;
        assert_eq!(decision.effect, Effect::Deny);
    }

    #[tokio::test]
    async fn test_short_token_denies() {
        let decision = authorizer()
            .authorize_request(Some("Bearer token_short"), "/admin/orders")
            .await;
        assert_eq!(decision.effect, Effect::Deny);
    }

    #[tokio::test]
    async fn test_cache_serves_second_lookup() {
        let record = CredentialRecord {
            client_id: "abc".to_string(),
            client_secret: generate_client_secret(),
            redirect_uri: "https://app.example.com/callback".to_string(),
        };
        let store = Arc::new(MemoryCredentialStore::new(record));
        let authorizer = RequestAuthorizer::new(store);
        let header = format!("Bearer {}", generate_access_token());

        let first = authorizer
            .authorize_request(Some(&header), "/admin/orders")
            .await;
        assert!(first.is_allowed());

        // Second call is served from the cache slot.
        assert!(authorizer.cache.get().await.is_some());
        let second = authorizer
            .authorize_request(Some(&header), "/admin/products")
            .await;
        assert!(second.is_allowed());
        assert_eq!(second.resource, "/admin/products/*");
    }
}
