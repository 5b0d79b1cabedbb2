//! HTTP handlers for the OAuth endpoints.
//!
//! Handlers are thin: they parse the request, delegate to
//! [`AuthorizationService`](crate::oauth::AuthorizationService), and render
//! the protocol's JSON envelopes and cache-control headers.

pub mod authorize;
pub mod token;

use std::sync::Arc;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::AuthError;
use crate::oauth::{AuthorizationService, OAuthErrorBody};

pub use authorize::{authorize_get_handler, authorize_post_handler};
pub use token::token_handler;

/// Shared state for the OAuth handlers.
#[derive(Clone)]
pub struct OAuthState {
    /// The flow service, shared across handlers.
    pub service: Arc<AuthorizationService>,
}

impl OAuthState {
    /// Creates handler state over `service`.
    pub fn new(service: Arc<AuthorizationService>) -> Self {
        Self { service }
    }
}

/// Renders an [`AuthError`] as the token endpoint's error envelope, with
/// a 401 for a client-credential mismatch.
///
/// Internal faults are collapsed to a bare `server_error` so store
/// diagnostics never reach the caller.
pub(crate) fn oauth_error_response(error: &AuthError) -> Response {
    let status = StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(error_body(error))).into_response()
}

/// Renders an [`AuthError`] for the authorization endpoint, where every
/// client error is a 400. Only the token endpoint answers 401.
pub(crate) fn authorize_error_response(error: &AuthError) -> Response {
    let status = if error.is_server_error() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(error_body(error))).into_response()
}

fn error_body(error: &AuthError) -> OAuthErrorBody {
    if error.is_server_error() {
        OAuthErrorBody {
            error: "server_error".to_string(),
            error_description: Some("internal server error".to_string()),
        }
    } else {
        OAuthErrorBody::from(error)
    }
}
