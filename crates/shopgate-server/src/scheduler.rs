//! Background tasks: credential rotation and code reaping.
//!
//! The rotation scheduler drives the four-step state machine strictly
//! sequentially with one fresh idempotency token per attempt, which is the
//! serialization contract the controller relies on. A failed step aborts
//! the attempt; the next tick starts a new one.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use shopgate_auth::rotation::{RotationController, RotationEvent, RotationStep};
use shopgate_auth::storage::AuthorizationCodeStore;

const ROTATION_STEPS: [RotationStep; 4] = [
    RotationStep::CreateSecret,
    RotationStep::SetSecret,
    RotationStep::TestSecret,
    RotationStep::FinishSecret,
];

/// Spawns the periodic rotation task for the secret named `secret_id`.
pub fn spawn_rotation(
    controller: Arc<RotationController>,
    secret_id: String,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The immediate first tick would rotate at startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            run_rotation_attempt(&controller, &secret_id).await;
        }
    })
}

/// Runs one full four-step attempt under a fresh token.
pub async fn run_rotation_attempt(controller: &RotationController, secret_id: &str) {
    let token = Uuid::new_v4().to_string();
    info!(secret_id, "starting credential rotation attempt");
    for step in ROTATION_STEPS {
        let event = RotationEvent {
            step,
            secret_id: secret_id.to_string(),
            token: token.clone(),
        };
        if let Err(err) = controller.handle(&event).await {
            error!(?step, error = %err, "rotation step failed, aborting attempt");
            return;
        }
    }
    info!(secret_id, "credential rotation completed");
}

/// Spawns the periodic sweep that reaps expired authorization codes.
pub fn spawn_code_reaper(
    codes: Arc<dyn AuthorizationCodeStore>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match codes.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "reaped expired authorization codes"),
                Err(err) => error!(error = %err, "authorization code sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopgate_auth::secret::generate_client_secret;
    use shopgate_auth::storage::{CredentialRecord, CredentialStore, MemoryCredentialStore};

    #[tokio::test]
    async fn test_rotation_attempt_replaces_secret() {
        let seed = CredentialRecord {
            client_id: "abc".to_string(),
            client_secret: generate_client_secret(),
            redirect_uri: "https://app.example.com/callback".to_string(),
        };
        let store = Arc::new(MemoryCredentialStore::new(seed.clone()));
        let controller =
            RotationController::new(Arc::clone(&store) as Arc<dyn CredentialStore>);

        run_rotation_attempt(&controller, "shopgate/client-credential").await;

        let current = store.get_current().await.unwrap();
        assert_ne!(current.client_secret, seed.client_secret);
        assert_eq!(current.client_id, "abc");
    }
}
