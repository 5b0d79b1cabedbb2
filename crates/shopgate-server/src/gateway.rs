//! Protected gateway routes: bearer-token check, then a thin proxy to the
//! Shopify Admin API.
//!
//! Every `/admin` request passes through the request authorizer first. A
//! deny is a bare 403; the caller learns nothing about which check failed.

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, warn};

use crate::server::AppState;

const MAX_PROXY_BODY_BYTES: usize = 10_000_000;

/// Header carrying the upstream Admin API token.
const SHOPIFY_TOKEN_HEADER: &str = "x-shopify-access-token";

/// `ANY /admin/{*path}` — authorize, then forward upstream.
pub async fn admin_proxy(State(state): State<AppState>, request: Request<Body>) -> Response {
    let resource = request.uri().path().to_string();
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let decision = state
        .authorizer
        .authorize_request(authorization.as_deref(), &resource)
        .await;
    if !decision.is_allowed() {
        debug!(resource, "denied gateway request");
        return forbidden();
    }

    debug!(
        principal = ?decision.principal_id,
        scope = %decision.resource,
        "forwarding gateway request"
    );
    match forward(&state, request).await {
        Ok(response) => response,
        Err(error) => {
            warn!(error = %error, "upstream request failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "message": "Bad Gateway" })),
            )
                .into_response()
        }
    }
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "message": "Forbidden" })),
    )
        .into_response()
}

async fn forward(state: &AppState, request: Request<Body>) -> anyhow::Result<Response> {
    let method = request.method().clone();
    let path_and_query = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_string(), ToString::to_string);
    let target = format!(
        "{}{}",
        state.config.shopify.base_url.trim_end_matches('/'),
        path_and_query
    );

    let mut headers = HeaderMap::new();
    for (name, value) in request.headers() {
        // Hop-by-hop and caller-auth headers stay on this side.
        if is_hop_by_hop_header(name.as_str()) || is_auth_header(name.as_str()) {
            continue;
        }
        headers.insert(name.clone(), value.clone());
    }
    if let Some(token) = &state.config.shopify.access_token {
        headers.insert(SHOPIFY_TOKEN_HEADER, HeaderValue::try_from(token.as_str())?);
    }

    let body = axum::body::to_bytes(request.into_body(), MAX_PROXY_BODY_BYTES).await?;

    let method = reqwest::Method::from_bytes(method.as_str().as_bytes())?;
    let upstream = state
        .upstream
        .request(method, &target)
        .headers(headers)
        .body(body.to_vec())
        .send()
        .await?;

    let status = StatusCode::from_u16(upstream.status().as_u16())?;
    let mut builder = Response::builder().status(status);
    for (name, value) in upstream.headers() {
        if is_hop_by_hop_header(name.as_str()) {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_bytes());
    }
    let bytes = upstream.bytes().await?;
    Ok(builder.body(Body::from(bytes))?)
}

/// RFC 2616 hop-by-hop headers, plus `host` which reqwest sets itself.
fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
            | "host"
            | "content-length"
    )
}

fn is_auth_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "authorization" | "cookie"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hop_by_hop_headers() {
        assert!(is_hop_by_hop_header("Connection"));
        assert!(is_hop_by_hop_header("transfer-encoding"));
        assert!(!is_hop_by_hop_header("accept"));
    }

    #[test]
    fn test_auth_headers_stripped() {
        assert!(is_auth_header("Authorization"));
        assert!(is_auth_header("cookie"));
        assert!(!is_auth_header("x-request-id"));
    }
}
