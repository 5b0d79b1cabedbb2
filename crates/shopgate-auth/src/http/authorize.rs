//! Authorization endpoint handler.
//!
//! Accepts `GET /oauth/authorize` with query parameters or `POST` with a
//! form body. On success the minted code is delivered by 302 redirect when
//! the request carries a `redirect_uri`, otherwise as a 200 JSON body.

use axum::Form;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::error::AuthError;
use crate::http::{OAuthState, authorize_error_response};
use crate::oauth::{AuthorizeRequest, build_redirect_url};

/// `GET /oauth/authorize`.
pub async fn authorize_get_handler(
    State(state): State<OAuthState>,
    Query(request): Query<AuthorizeRequest>,
) -> Response {
    handle_authorize(&state, request).await
}

/// `POST /oauth/authorize` with a form body.
pub async fn authorize_post_handler(
    State(state): State<OAuthState>,
    Form(request): Form<AuthorizeRequest>,
) -> Response {
    handle_authorize(&state, request).await
}

async fn handle_authorize(state: &OAuthState, request: AuthorizeRequest) -> Response {
    let redirect_uri = request.redirect_uri.clone().filter(|uri| !uri.is_empty());

    let authorized = match state.service.authorize(&request).await {
        Ok(authorized) => authorized,
        Err(error) => {
            warn!(error = %error, "authorization request rejected");
            return authorize_error_response(&error);
        }
    };

    match redirect_uri {
        Some(uri) => {
            let location = match build_redirect_url(
                &uri,
                &authorized.authorization_code,
                authorized.state.as_deref(),
            ) {
                Ok(location) => location,
                Err(error) => {
                    warn!(error = %error, "unparseable redirect_uri");
                    return authorize_error_response(&AuthError::invalid_request(
                        "redirect_uri is not a valid URL",
                    ));
                }
            };
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        None => (StatusCode::OK, Json(authorized)).into_response(),
    }
}
