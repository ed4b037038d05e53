use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{FromRequestParts, Query, RawPathParams, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use serde_json::Value;

use super::chain::ValidationChain;
use super::context::RequestContext;
use super::entity::EntityLookup;
use super::outcome::{Rejection, ValidationError};
use crate::error::ApiError;
use crate::metrics;
use crate::redaction::redact;

/// A route's validation chain together with the lookup it runs against
#[derive(Clone)]
pub struct RouteGuard {
    chain: Arc<ValidationChain>,
    lookup: Arc<dyn EntityLookup>,
    body_limit: usize,
}

impl RouteGuard {
    pub fn new(chain: ValidationChain, lookup: Arc<dyn EntityLookup>, body_limit: usize) -> Self {
        Self {
            chain: Arc::new(chain),
            lookup,
            body_limit,
        }
    }
}

/// Route layer running the guard's chain before the handler.
///
/// ```ignore
/// get(handlers::get_ticket)
///     .route_layer(middleware::from_fn_with_state(guard, validate_request))
/// ```
pub async fn validate_request(
    State(guard): State<RouteGuard>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let params: HashMap<String, String> = match RawPathParams::from_request_parts(&mut parts, &()).await {
        Ok(raw) => raw
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        Err(_) => HashMap::new(),
    };

    let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(q)| q)
        .unwrap_or_default();

    let bytes = match axum::body::to_bytes(body, guard.body_limit).await {
        Ok(bytes) => bytes,
        Err(err) if exceeds_limit(&err) => {
            tracing::debug!(limit = guard.body_limit, "request body over limit");
            return ApiError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "PayloadTooLarge",
                format!("Request body exceeds {} bytes", guard.body_limit),
            )
            .into_response();
        }
        Err(err) => {
            tracing::debug!(error = %err, "failed to buffer request body");
            return ApiError::bad_request("BadRequest", "Request body could not be read").into_response();
        }
    };

    let body_json = match parse_body(&bytes) {
        Ok(value) => value,
        Err(rejection) => return reject(rejection),
    };

    let ctx = RequestContext::new(body_json)
        .with_query(query)
        .with_params(params);

    match guard.chain.run(&ctx, guard.lookup.as_ref()).await {
        Ok(entities) => {
            tracing::debug!(uri = %parts.uri, attached = ?entities.keys(), "request validated");
            parts.extensions.insert(entities);
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(err) => {
            if let ValidationError::Rejected(rejection) = &err {
                tracing::debug!(
                    method = %parts.method,
                    uri = %parts.uri,
                    kind = rejection.kind.as_str(),
                    message = %rejection.message,
                    body = %redact(&ctx.body),
                    "request rejected"
                );
                metrics::observe_rejection(rejection.kind.as_str());
            }
            err.into_response()
        }
    }
}

/// Empty body is `{}`; anything else must be JSON
fn parse_body(bytes: &Bytes) -> Result<Value, Rejection> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(bytes).map_err(|e| {
        Rejection::validation(format!("Invalid JSON payload: {}", e))
    })
}

/// Whether buffering stopped at the configured body limit
fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return true;
        }
        source = err.source();
    }
    false
}

fn reject(rejection: Rejection) -> Response {
    metrics::observe_rejection(rejection.kind.as_str());
    rejection.into_response()
}
