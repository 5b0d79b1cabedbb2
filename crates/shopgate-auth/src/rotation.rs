//! Credential rotation state machine.
//!
//! Four steps, invoked in order by a scheduler, replace the client secret
//! with zero downtime:
//!
//! 1. `createSecret` — stage a fresh secret as the pending version
//! 2. `setSecret`    — no-op (no external system owns this secret)
//! 3. `testSecret`   — validate the pending version, the sole gate
//! 4. `finishSecret` — atomically promote pending to current
//!
//! Each attempt carries an idempotency token; retried steps are safe to
//! re-run under the same token. The scheduler guarantees the four steps of
//! one attempt run serially and never overlap another attempt — the
//! controller does not enforce that itself.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::AuthResult;
use crate::error::AuthError;
use crate::secret::generate_client_secret;
use crate::storage::CredentialStore;

/// One of the four rotation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RotationStep {
    /// Stage a freshly generated secret as pending.
    CreateSecret,
    /// Deliberate no-op, kept for the four-step contract.
    SetSecret,
    /// Validate the pending version before promotion.
    TestSecret,
    /// Promote the pending version to current.
    FinishSecret,
}

/// A scheduler invocation of one rotation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationEvent {
    /// Which step to run.
    pub step: RotationStep,

    /// Identifier of the secret being rotated. With a single credential
    /// record the store needs no routing by it, but the scheduler contract
    /// carries it on every invocation.
    pub secret_id: String,

    /// Idempotency token identifying the rotation attempt.
    pub token: String,
}

/// Drives the rotation steps against the credential store.
pub struct RotationController {
    credentials: Arc<dyn CredentialStore>,
}

impl RotationController {
    /// Creates a controller over `credentials`.
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self { credentials }
    }

    /// Dispatches one step.
    ///
    /// # Errors
    ///
    /// Propagates step failures to the scheduler; a failed `test_secret`
    /// aborts the rotation with the current secret untouched.
    pub async fn handle(&self, event: &RotationEvent) -> AuthResult<()> {
        info!(secret_id = %event.secret_id, step = ?event.step, "handling rotation step");
        match event.step {
            RotationStep::CreateSecret => self.create_secret(&event.token).await,
            RotationStep::SetSecret => self.set_secret(&event.token),
            RotationStep::TestSecret => self.test_secret(&event.token).await,
            RotationStep::FinishSecret => self.finish_secret(&event.token).await,
        }
    }

    /// Stages a new secret as the pending version for `token`.
    ///
    /// Re-entry with the same token is a no-op, so a retried step does not
    /// discard the already-staged secret.
    pub async fn create_secret(&self, token: &str) -> AuthResult<()> {
        if self.credentials.get_pending(token).await?.is_some() {
            info!("pending credential version already staged, skipping");
            return Ok(());
        }

        let mut record = self.credentials.get_current().await?;
        record.client_secret = generate_client_secret();
        self.credentials.stage_pending(token, record).await?;
        info!("staged pending credential version");
        Ok(())
    }

    /// No external system holds this secret, so there is nothing to set.
    pub fn set_secret(&self, _token: &str) -> AuthResult<()> {
        info!("setSecret is a no-op for this credential");
        Ok(())
    }

    /// Validates the pending version. This is the only gate before
    /// promotion.
    ///
    /// # Errors
    ///
    /// Fails if no pending version exists for `token` or the staged record
    /// is invalid; in both cases no state changes.
    pub async fn test_secret(&self, token: &str) -> AuthResult<()> {
        let Some(pending) = self.credentials.get_pending(token).await? else {
            return Err(AuthError::internal(
                "no pending credential version to test",
            ));
        };

        if let Err(reason) = pending.validate() {
            warn!(%reason, "pending credential version failed validation");
            return Err(AuthError::internal(format!(
                "pending credential version failed validation: {reason}"
            )));
        }
        info!("pending credential version validated");
        Ok(())
    }

    /// Promotes the pending version tagged with `token` to current.
    ///
    /// From the moment this returns, validation uses the new secret
    /// exclusively; there is no overlap window.
    pub async fn finish_secret(&self, token: &str) -> AuthResult<()> {
        self.credentials.promote_pending(token).await?;
        info!("promoted pending credential version to current");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::{CLIENT_SECRET_LEN, is_charset_valid};
    use crate::storage::{CredentialRecord, MemoryCredentialStore};

    fn seeded_store() -> (Arc<MemoryCredentialStore>, CredentialRecord) {
        let record = CredentialRecord {
            client_id: "abc".to_string(),
            client_secret: generate_client_secret(),
            redirect_uri: "https://app.example.com/callback".to_string(),
        };
        (Arc::new(MemoryCredentialStore::new(record.clone())), record)
    }

    #[test]
    fn test_step_serde_names() {
        assert_eq!(
            serde_json::to_string(&RotationStep::CreateSecret).unwrap(),
            r#""createSecret""#
        );
        assert_eq!(
            serde_json::from_str::<RotationStep>(r#""finishSecret""#).unwrap(),
            RotationStep::FinishSecret
        );
    }

    #[test]
    fn test_event_layout() {
        let event = RotationEvent {
            step: RotationStep::CreateSecret,
            secret_id: "shopgate/client-credential".to_string(),
            token: "rot-1".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["step"], "createSecret");
        assert_eq!(json["secretId"], "shopgate/client-credential");
        assert_eq!(json["token"], "rot-1");
    }

    #[tokio::test]
    async fn test_full_sequence_promotes_new_secret() {
        let (store, seed) = seeded_store();
        let controller = RotationController::new(Arc::clone(&store) as Arc<dyn CredentialStore>);

        for step in [
            RotationStep::CreateSecret,
            RotationStep::SetSecret,
            RotationStep::TestSecret,
            RotationStep::FinishSecret,
        ] {
            controller
                .handle(&RotationEvent {
                    step,
                    secret_id: "shopgate/client-credential".to_string(),
                    token: "rot-1".to_string(),
                })
                .await
                .unwrap();
        }

        let current = store.get_current().await.unwrap();
        assert_ne!(current.client_secret, seed.client_secret);
        assert_eq!(current.client_secret.len(), CLIENT_SECRET_LEN);
        assert!(is_charset_valid(&current.client_secret));
        // Immutable fields survive rotation.
        assert_eq!(current.client_id, seed.client_id);
        assert_eq!(current.redirect_uri, seed.redirect_uri);
        assert!(store.get_pending("rot-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_secret_idempotent_per_token() {
        let (store, _) = seeded_store();
        let controller = RotationController::new(Arc::clone(&store) as Arc<dyn CredentialStore>);

        controller.create_secret("rot-1").await.unwrap();
        let first = store.get_pending("rot-1").await.unwrap().unwrap();

        controller.create_secret("rot-1").await.unwrap();
        let second = store.get_pending("rot-1").await.unwrap().unwrap();
        assert_eq!(first, second, "re-entry must not regenerate the secret");
    }

    #[tokio::test]
    async fn test_test_secret_rejects_short_pending() {
        let (store, seed) = seeded_store();
        let controller = RotationController::new(Arc::clone(&store) as Arc<dyn CredentialStore>);

        let mut bad = seed.clone();
        bad.client_secret = "a".repeat(31);
        store.stage_pending("rot-1", bad).await.unwrap();

        assert!(controller.test_secret("rot-1").await.is_err());
        // Current secret untouched by the failed gate.
        assert_eq!(store.get_current().await.unwrap(), seed);
    }

    #[tokio::test]
    async fn test_test_secret_without_pending_fails() {
        let (store, _) = seeded_store();
        let controller = RotationController::new(store as Arc<dyn CredentialStore>);
        assert!(controller.test_secret("rot-1").await.is_err());
    }

    #[tokio::test]
    async fn test_finish_secret_wrong_token_fails() {
        let (store, seed) = seeded_store();
        let controller = RotationController::new(Arc::clone(&store) as Arc<dyn CredentialStore>);

        controller.create_secret("rot-1").await.unwrap();
        assert!(controller.finish_secret("rot-other").await.is_err());
        assert_eq!(store.get_current().await.unwrap(), seed);
    }
}
