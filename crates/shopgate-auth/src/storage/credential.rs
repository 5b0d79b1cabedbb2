//! Credential store: the single versioned client registration.
//!
//! The store holds exactly one record marked *current* and, while a rotation
//! is in flight, at most one *pending* version tagged with the rotation
//! attempt's idempotency token. Validation (token endpoint, request
//! authorizer) only ever reads the current version; a pending version never
//! serves validation until it is promoted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::error::AuthError;
use crate::secret::{CLIENT_SECRET_LEN, is_charset_valid};

/// The registered client's authentication material.
///
/// Persisted layout: `{client_id, client_secret, redirect_uri}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Opaque identifier of the one registered client. Immutable.
    pub client_id: String,

    /// Shared secret, 32 characters from `[A-Za-z0-9_-]`. The only field
    /// that changes across versions.
    pub client_secret: String,

    /// Registered callback URL. Immutable.
    pub redirect_uri: String,
}

/// Validation failures for a credential record.
///
/// This is the gate the rotation controller applies before promoting a
/// pending version.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialValidationError {
    /// A required field is empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The secret is not exactly the expected length.
    #[error("client_secret must be exactly {expected} characters, got {actual}")]
    SecretLength {
        /// Required length.
        expected: usize,
        /// Observed length.
        actual: usize,
    },

    /// The secret contains characters outside `[A-Za-z0-9_-]`.
    #[error("client_secret contains characters outside the allowed charset")]
    SecretCharset,
}

impl CredentialRecord {
    /// Checks that all three fields are present and the secret is exactly
    /// 32 charset-valid characters.
    pub fn validate(&self) -> Result<(), CredentialValidationError> {
        if self.client_id.is_empty() {
            return Err(CredentialValidationError::MissingField("client_id"));
        }
        if self.client_secret.is_empty() {
            return Err(CredentialValidationError::MissingField("client_secret"));
        }
        if self.redirect_uri.is_empty() {
            return Err(CredentialValidationError::MissingField("redirect_uri"));
        }
        if self.client_secret.len() != CLIENT_SECRET_LEN {
            return Err(CredentialValidationError::SecretLength {
                expected: CLIENT_SECRET_LEN,
                actual: self.client_secret.len(),
            });
        }
        if !is_charset_valid(&self.client_secret) {
            return Err(CredentialValidationError::SecretCharset);
        }
        Ok(())
    }
}

/// Storage operations for the versioned credential record.
///
/// Implementations must make `promote_pending` atomic with respect to
/// concurrent reads: a reader observes either the old current version or
/// the new one, never a mixture.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the current (validating) credential record.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_current(&self) -> AuthResult<CredentialRecord>;

    /// Returns the pending version staged under `token`, if any.
    ///
    /// A pending version staged under a *different* rotation token is not
    /// returned; each rotation attempt only sees its own staging.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_pending(&self, token: &str) -> AuthResult<Option<CredentialRecord>>;

    /// Stages `record` as the pending version tagged with `token`,
    /// replacing any previously staged version.
    ///
    /// The current version is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn stage_pending(&self, token: &str, record: CredentialRecord) -> AuthResult<()>;

    /// Atomically promotes the pending version tagged with `token` to
    /// current, clearing the pending slot.
    ///
    /// # Errors
    ///
    /// Returns an error if no pending version exists for `token` or the
    /// storage operation fails. On error the current version is unchanged.
    async fn promote_pending(&self, token: &str) -> AuthResult<()>;
}

struct PendingVersion {
    token: String,
    record: CredentialRecord,
}

struct CredentialState {
    current: CredentialRecord,
    pending: Option<PendingVersion>,
}

/// In-memory credential store.
///
/// A `tokio::sync::RwLock` around the current/pending pair gives the
/// single-key atomicity the design requires: promote takes the write lock,
/// so readers see the swap as one step.
pub struct MemoryCredentialStore {
    state: RwLock<CredentialState>,
}

impl MemoryCredentialStore {
    /// Creates a store seeded with `current` and no pending version.
    #[must_use]
    pub fn new(current: CredentialRecord) -> Self {
        Self {
            state: RwLock::new(CredentialState {
                current,
                pending: None,
            }),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get_current(&self) -> AuthResult<CredentialRecord> {
        Ok(self.state.read().await.current.clone())
    }

    async fn get_pending(&self, token: &str) -> AuthResult<Option<CredentialRecord>> {
        let state = self.state.read().await;
        Ok(state
            .pending
            .as_ref()
            .filter(|p| p.token == token)
            .map(|p| p.record.clone()))
    }

    async fn stage_pending(&self, token: &str, record: CredentialRecord) -> AuthResult<()> {
        let mut state = self.state.write().await;
        state.pending = Some(PendingVersion {
            token: token.to_string(),
            record,
        });
        Ok(())
    }

    async fn promote_pending(&self, token: &str) -> AuthResult<()> {
        let mut state = self.state.write().await;
        match state.pending.take() {
            Some(pending) if pending.token == token => {
                state.current = pending.record;
                Ok(())
            }
            other => {
                // Leave an unrelated pending version in place for its own
                // rotation attempt.
                state.pending = other;
                Err(AuthError::internal(format!(
                    "no pending credential version for rotation token {token}"
                )))
            }
        }
    }
}
