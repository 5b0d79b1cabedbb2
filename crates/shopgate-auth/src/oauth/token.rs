//! Token endpoint types.
//!
//! The token endpoint redeems a one-time authorization code for a bearer
//! access token. Client authentication is accepted either in the request
//! body or via HTTP Basic; body credentials win when both are present.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Token request parameters.
///
/// Accepted as a JSON or form-encoded body. Fields are optional at the
/// transport layer; the service enforces presence so a missing field maps
/// to `invalid_request` rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// Must be `"authorization_code"`. Required.
    #[serde(default)]
    pub grant_type: Option<String>,

    /// The one-time code being redeemed. Required.
    #[serde(default)]
    pub code: Option<String>,

    /// Client identifier. Required here or via Basic auth.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client secret. Required here or via Basic auth.
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Successful token response.
///
/// # Example response
///
/// ```json
/// {
///   "access_token": "token_kF9s...",
///   "token_type": "Bearer",
///   "expires_in": 3600,
///   "scope": "read write"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer token (`token_` prefix).
    pub access_token: String,

    /// Always `"Bearer"`.
    pub token_type: String,

    /// Token lifetime in seconds.
    pub expires_in: u64,

    /// Space-separated granted scopes.
    pub scope: String,
}

impl TokenResponse {
    /// Builds a bearer response for `access_token`.
    #[must_use]
    pub fn bearer(access_token: String, expires_in: u64, scope: impl Into<String>) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            scope: scope.into(),
        }
    }
}

/// OAuth error envelope shared by both endpoints.
///
/// ```json
/// {"error": "invalid_grant", "error_description": "authorization code expired"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthErrorBody {
    /// RFC 6749 error code.
    pub error: String,

    /// Human-readable detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl From<&AuthError> for OAuthErrorBody {
    fn from(err: &AuthError) -> Self {
        Self {
            error: err.oauth_error_code().to_string(),
            error_description: Some(err.to_string()),
        }
    }
}
