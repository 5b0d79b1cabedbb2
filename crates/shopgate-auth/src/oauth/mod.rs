//! OAuth 2.0 authorization code flow.
//!
//! Request/response types for the two endpoints plus the service that
//! implements their semantics over the storage traits.

pub mod authorize;
pub mod service;
pub mod token;

pub use authorize::{AuthorizeRequest, AuthorizeResponse, build_redirect_url};
pub use service::{AuthorizationService, OAuthConfig};
pub use token::{OAuthErrorBody, TokenRequest, TokenResponse};
