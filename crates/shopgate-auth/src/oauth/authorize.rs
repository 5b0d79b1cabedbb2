//! Authorization endpoint types.
//!
//! The authorization endpoint is the first step of the authorization code
//! flow: the client is validated, a one-time code is minted and persisted,
//! and the code is either redirected back to the caller or returned in the
//! response body for out-of-band flows.
//!
//! # Example
//!
//! ```ignore
//! GET /oauth/authorize?
//!   response_type=code
//!   &client_id=my-app
//!   &redirect_uri=https://app.example.com/callback
//!   &state=abc123xyz
//! ```

use serde::{Deserialize, Serialize};

/// Authorization request parameters.
///
/// Received as query parameters (GET) or a form body (POST). Every field is
/// optional at the transport layer; presence requirements are enforced by
/// the service so that a missing field maps to `invalid_request` rather
/// than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeRequest {
    /// Client identifier. Required.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Callback the code should be redirected to. Optional; without it the
    /// code is returned directly in the response body.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Opaque CSRF state echoed back to the client. Optional.
    #[serde(default)]
    pub state: Option<String>,

    /// Must be `"code"`. Required.
    #[serde(default)]
    pub response_type: Option<String>,
}

/// Body returned when no `redirect_uri` was supplied (out-of-band and test
/// flows).
///
/// # Example response
///
/// ```json
/// {
///   "authorization_code": "authcode_WgzA...",
///   "expires_in": 600,
///   "state": "abc123xyz"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    /// The freshly minted one-time code.
    pub authorization_code: String,

    /// Seconds until the code expires.
    pub expires_in: u64,

    /// Echoed state parameter, when one was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Builds the redirect URL carrying `code` and optional `state`.
///
/// Query parameters are appended to any query string already present on the
/// registered redirect URI (`&` vs `?` handled by the URL parser).
///
/// # Errors
///
/// Returns an error if `redirect_uri` is not a parseable absolute URL.
pub fn build_redirect_url(
    redirect_uri: &str,
    code: &str,
    state: Option<&str>,
) -> Result<String, url::ParseError> {
    let mut url = url::Url::parse(redirect_uri)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("code", code);
        if let Some(state) = state {
            pairs.append_pair("state", state);
        }
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialize_from_query() {
        let request: AuthorizeRequest = serde_urlencoded::from_str(
            "client_id=my-app&response_type=code&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb&state=xyz",
        )
        .unwrap();
        assert_eq!(request.client_id.as_deref(), Some("my-app"));
        assert_eq!(request.response_type.as_deref(), Some("code"));
        assert_eq!(
            request.redirect_uri.as_deref(),
            Some("https://app.example.com/cb")
        );
        assert_eq!(request.state.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_request_tolerates_missing_fields() {
        let request: AuthorizeRequest = serde_urlencoded::from_str("client_id=my-app").unwrap();
        assert!(request.response_type.is_none());
        assert!(request.redirect_uri.is_none());
        assert!(request.state.is_none());
    }

    #[test]
    fn test_response_serialize() {
        let response = AuthorizeResponse {
            authorization_code: "authcode_123".to_string(),
            expires_in: 600,
            state: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""authorization_code":"authcode_123""#));
        assert!(json.contains(r#""expires_in":600"#));
        assert!(!json.contains("state"));
    }

    #[test]
    fn test_redirect_url_bare_uri() {
        let url =
            build_redirect_url("https://app.example.com/callback", "authcode_1", Some("s1"))
                .unwrap();
        assert!(url.starts_with("https://app.example.com/callback?"));
        assert!(url.contains("code=authcode_1"));
        assert!(url.contains("state=s1"));
    }

    #[test]
    fn test_redirect_url_appends_to_existing_query() {
        let url =
            build_redirect_url("https://app.example.com/cb?shop=demo", "authcode_2", None).unwrap();
        assert!(url.contains("shop=demo&code=authcode_2"));
        assert!(!url.contains("state="));
    }

    #[test]
    fn test_redirect_url_rejects_invalid_uri() {
        assert!(build_redirect_url("not a url", "authcode_3", None).is_err());
    }
}
