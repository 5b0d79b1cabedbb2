//! Token endpoint handler.
//!
//! Accepts `POST /oauth/token` with either a form-encoded or JSON body.
//! Client credentials may arrive in the body or via HTTP Basic auth; body
//! values take precedence when both are present.
//!
//! # Example
//!
//! ```ignore
//! POST /oauth/token
//! Content-Type: application/x-www-form-urlencoded
//! Authorization: Basic <base64(client_id:client_secret)>
//!
//! grant_type=authorization_code
//! &code=authcode_WgzA...
//! ```

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::http::{OAuthState, oauth_error_response};
use crate::oauth::{TokenRequest, TokenResponse};

/// `POST /oauth/token`.
///
/// The body is parsed once, by content type: `application/json` as JSON,
/// anything else as a form. Parse failures surface as `invalid_request`
/// before any protocol validation runs.
pub async fn token_handler(
    State(state): State<OAuthState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut request = match parse_token_body(&headers, &body) {
        Ok(request) => request,
        Err(error) => {
            warn!(error = %error, "malformed token request body");
            return oauth_error_response(&error);
        }
    };

    // Basic auth fills in whatever the body left out.
    if let Some((client_id, client_secret)) = extract_basic_auth(&headers) {
        if request.client_id.is_none() {
            request.client_id = Some(client_id);
        }
        if request.client_secret.is_none() {
            request.client_secret = Some(client_secret);
        }
    }

    debug!(client_id = ?request.client_id, "processing token request");

    match state.service.exchange(&request).await {
        Ok(response) => token_success_response(response),
        Err(error) => {
            warn!(error = %error, "token request rejected");
            oauth_error_response(&error)
        }
    }
}

/// Parses the token request body according to its declared content type.
fn parse_token_body(headers: &HeaderMap, body: &Bytes) -> Result<TokenRequest, AuthError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        serde_json::from_slice(body)
            .map_err(|_| AuthError::invalid_request("request body is not valid JSON"))
    } else {
        serde_urlencoded::from_bytes(body)
            .map_err(|_| AuthError::invalid_request("request body is not a valid form"))
    }
}

/// Extracts `(client_id, client_secret)` from an HTTP Basic header.
///
/// The decoded value is split on the first colon, so secrets containing
/// colons survive intact.
fn extract_basic_auth(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (client_id, client_secret) = decoded.split_once(':')?;
    Some((client_id.to_string(), client_secret.to_string()))
}

fn token_success_response(response: TokenResponse) -> Response {
    (
        StatusCode::OK,
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(response),
    )
        .into_response()
}
