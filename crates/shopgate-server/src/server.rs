//! Application state and router assembly.

use std::sync::Arc;

use axum::Router;
use axum::extract::FromRef;
use axum::routing::{any, get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use shopgate_auth::authorizer::{CredentialCache, RequestAuthorizer};
use shopgate_auth::http::{
    OAuthState, authorize_get_handler, authorize_post_handler, token_handler,
};
use shopgate_auth::oauth::{AuthorizationService, OAuthConfig};
use shopgate_auth::secret::generate_client_secret;
use shopgate_auth::storage::{
    AuthorizationCodeStore, CredentialRecord, CredentialStore, MemoryAuthorizationCodeStore,
    MemoryCredentialStore,
};

use crate::config::AppConfig;
use crate::gateway;
use crate::handlers;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub credentials: Arc<dyn CredentialStore>,
    pub codes: Arc<dyn AuthorizationCodeStore>,
    pub oauth: OAuthState,
    pub authorizer: Arc<RequestAuthorizer>,
    /// Client used to reach the upstream Shopify Admin API.
    pub upstream: reqwest::Client,
}

// Lets the OAuth handlers take State<OAuthState> directly.
impl FromRef<AppState> for OAuthState {
    fn from_ref(state: &AppState) -> Self {
        state.oauth.clone()
    }
}

impl AppState {
    /// Wires stores, service, and authorizer from `config`.
    ///
    /// When no client secret is configured a fresh one is generated, which
    /// is fine for local development but means issued credentials do not
    /// survive a restart.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let client_secret = match config.client.client_secret.clone() {
            Some(secret) => secret,
            None => {
                info!("no client secret configured, generating one for this process");
                generate_client_secret()
            }
        };

        let seed = CredentialRecord {
            client_id: config.client.client_id.clone(),
            client_secret,
            redirect_uri: config.client.redirect_uri.clone(),
        };
        seed.validate()
            .map_err(|e| anyhow::anyhow!("client credential configuration invalid: {e}"))?;

        let credentials: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new(seed));
        let codes: Arc<dyn AuthorizationCodeStore> = Arc::new(MemoryAuthorizationCodeStore::new());

        let code_lifetime = time::Duration::try_from(config.oauth.code_lifetime)
            .map_err(|e| anyhow::anyhow!("oauth.code_lifetime out of range: {e}"))?;
        let service = Arc::new(AuthorizationService::new(
            Arc::clone(&credentials),
            Arc::clone(&codes),
            OAuthConfig {
                code_lifetime,
                token_lifetime_secs: config.oauth.token_lifetime_secs,
                scope: config.oauth.scope.clone(),
            },
        ));

        let authorizer = Arc::new(RequestAuthorizer::with_cache(
            Arc::clone(&credentials),
            CredentialCache::with_ttl(config.cache.credential_ttl),
        ));

        Ok(Self {
            config: Arc::new(config),
            credentials,
            codes,
            oauth: OAuthState::new(service),
            authorizer,
            upstream: reqwest::Client::new(),
        })
    }
}

/// Builds the full router over `state`.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route(
            "/oauth/authorize",
            get(authorize_get_handler).post(authorize_post_handler),
        )
        .route("/oauth/token", post(token_handler))
        .route("/admin/{*path}", any(gateway::admin_proxy))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
