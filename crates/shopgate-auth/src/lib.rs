//! OAuth 2.0 authentication for the Shopify Admin gateway.
//!
//! This crate implements the authorization code flow for a single
//! registered client:
//!
//! - **Authorization endpoint** — validates the client and mints a
//!   single-use, 10-minute authorization code
//! - **Token endpoint** — redeems a code (exactly once) for a bearer token
//! - **Request authorizer** — format-validates bearer tokens on protected
//!   calls, with a cached credential lookup
//! - **Rotation controller** — the four-step state machine that replaces
//!   the client secret with zero downtime
//!
//! Storage is behind traits ([`storage::CredentialStore`],
//! [`storage::AuthorizationCodeStore`]) with in-memory defaults.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use shopgate_auth::oauth::{AuthorizationService, AuthorizeRequest, OAuthConfig};
//! use shopgate_auth::secret::generate_client_secret;
//! use shopgate_auth::storage::{
//!     CredentialRecord, MemoryAuthorizationCodeStore, MemoryCredentialStore,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let credential = CredentialRecord {
//!     client_id: "abc".to_string(),
//!     client_secret: generate_client_secret(),
//!     redirect_uri: "https://app.example.com/callback".to_string(),
//! };
//! let service = AuthorizationService::new(
//!     Arc::new(MemoryCredentialStore::new(credential)),
//!     Arc::new(MemoryAuthorizationCodeStore::new()),
//!     OAuthConfig::default(),
//! );
//!
//! let request = AuthorizeRequest {
//!     client_id: Some("abc".to_string()),
//!     response_type: Some("code".to_string()),
//!     ..Default::default()
//! };
//! let issued = service.authorize(&request).await.unwrap();
//! assert!(issued.authorization_code.starts_with("authcode_"));
//! # }
//! ```

pub mod authorizer;
pub mod error;
pub mod http;
pub mod oauth;
pub mod rotation;
pub mod secret;
pub mod storage;

pub use authorizer::{AccessDecision, Effect, RequestAuthorizer};
pub use error::AuthError;
pub use oauth::{AuthorizationService, OAuthConfig};
pub use rotation::{RotationController, RotationEvent, RotationStep};
pub use storage::{
    AuthorizationCode, AuthorizationCodeStore, CredentialRecord, CredentialStore,
    MemoryAuthorizationCodeStore, MemoryCredentialStore,
};

/// Result alias used across the crate.
pub type AuthResult<T> = Result<T, AuthError>;
