//! Authorization code flow service.
//!
//! `AuthorizationService` owns the protocol semantics of the two OAuth
//! endpoints: it validates requests in a fixed order against the credential
//! store, mints and redeems one-time codes, and issues bearer tokens. HTTP
//! concerns (parsing, Basic auth, status codes) live in `crate::http`.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::authorize::{AuthorizeRequest, AuthorizeResponse};
use crate::oauth::token::{TokenRequest, TokenResponse};
use crate::secret::generate_access_token;
use crate::storage::{AuthorizationCode, AuthorizationCodeStore, CredentialStore};

/// Tunables for the authorization code flow.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Lifetime of a minted authorization code.
    pub code_lifetime: Duration,

    /// Lifetime advertised for issued access tokens, in seconds.
    pub token_lifetime_secs: u64,

    /// Scope string granted to every issued token.
    pub scope: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            code_lifetime: Duration::minutes(10),
            token_lifetime_secs: 3600,
            scope: "read write".to_string(),
        }
    }
}

/// Implements the authorization and token operations over the two stores.
pub struct AuthorizationService {
    credentials: Arc<dyn CredentialStore>,
    codes: Arc<dyn AuthorizationCodeStore>,
    config: OAuthConfig,
}

impl AuthorizationService {
    /// Creates a service over the given stores.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        codes: Arc<dyn AuthorizationCodeStore>,
        config: OAuthConfig,
    ) -> Self {
        Self {
            credentials,
            codes,
            config,
        }
    }

    /// Lifetime of minted codes, for response building.
    #[must_use]
    pub fn code_lifetime(&self) -> Duration {
        self.config.code_lifetime
    }

    /// Handles an authorization request: validates the client and mints a
    /// one-time code.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidRequest`] if `client_id` or `response_type` is
    ///   missing
    /// - [`AuthError::UnsupportedResponseType`] if `response_type` is not
    ///   `"code"`
    /// - [`AuthError::InvalidClient`] if `client_id` does not match the
    ///   registered client
    pub async fn authorize(&self, request: &AuthorizeRequest) -> AuthResult<AuthorizeResponse> {
        // 1. Required parameters
        let client_id = request
            .client_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::invalid_request("client_id is required"))?;
        let response_type = request
            .response_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::invalid_request("response_type is required"))?;

        // 2. Response type
        if response_type != "code" {
            return Err(AuthError::unsupported_response_type(response_type));
        }

        // 3. Client identity
        let current = self.credentials.get_current().await?;
        if client_id != current.client_id {
            warn!(client_id, "authorization attempt with unknown client_id");
            return Err(AuthError::invalid_client("unknown client_id"));
        }

        // 4. Mint and persist the code
        let code = AuthorizationCode::new(client_id, self.config.code_lifetime);
        let expires_in = self.config.code_lifetime.whole_seconds().max(0) as u64;
        self.codes.put(code.clone()).await?;
        debug!(client_id, "issued authorization code");

        Ok(AuthorizeResponse {
            authorization_code: code.code,
            expires_in,
            state: request.state.clone(),
        })
    }

    /// Redeems a one-time code for a bearer token.
    ///
    /// `request` must already carry the effective client credentials (body
    /// values, or Basic auth values merged in by the HTTP layer).
    ///
    /// # Errors
    ///
    /// Follows the token endpoint's fixed validation order:
    /// [`AuthError::UnsupportedGrantType`], then
    /// [`AuthError::InvalidRequest`] for missing parameters, then
    /// [`AuthError::InvalidClient`] for a credential mismatch, then
    /// [`AuthError::InvalidGrant`] for an unknown, expired, replayed, or
    /// mismatched code.
    pub async fn exchange(&self, request: &TokenRequest) -> AuthResult<TokenResponse> {
        // a. Grant type
        let grant_type = request.grant_type.as_deref().unwrap_or_default();
        if grant_type != "authorization_code" {
            return Err(AuthError::unsupported_grant_type(grant_type));
        }

        // b. Required parameters
        let code_value = request
            .code
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::invalid_request("code is required"))?;
        let client_id = request
            .client_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::invalid_request("client_id is required"))?;
        let client_secret = request
            .client_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::invalid_request("client_secret is required"))?;

        // c. Client credentials
        let current = self.credentials.get_current().await?;
        if client_id != current.client_id || client_secret != current.client_secret {
            warn!(client_id, "token request with invalid client credentials");
            return Err(AuthError::invalid_client("invalid client credentials"));
        }

        // d. Code lookup
        let Some(record) = self.codes.get(code_value).await? else {
            return Err(AuthError::invalid_grant("authorization code not found"));
        };

        // e. Expiry
        if OffsetDateTime::now_utc() > record.expires_at {
            self.codes.delete(code_value).await?;
            return Err(AuthError::invalid_grant("authorization code expired"));
        }

        // f. Replay
        if record.used {
            self.codes.delete(code_value).await?;
            warn!(client_id, "replayed authorization code");
            return Err(AuthError::invalid_grant("authorization code already used"));
        }

        // g. Code / client binding
        if record.client_id != client_id {
            return Err(AuthError::invalid_grant(
                "authorization code was issued to a different client",
            ));
        }

        // Atomic consume: a racing exchange that lost the unused→used
        // transition is a replay.
        if !self.codes.mark_used(code_value).await? {
            self.codes.delete(code_value).await?;
            return Err(AuthError::invalid_grant("authorization code already used"));
        }

        debug!(client_id, "issued access token");
        Ok(TokenResponse::bearer(
            generate_access_token(),
            self.config.token_lifetime_secs,
            self.config.scope.clone(),
        ))
    }
}
