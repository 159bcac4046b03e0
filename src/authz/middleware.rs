use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{FromRequestParts, MatchedPath, Query, RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::gate::PermissionGate;
use super::principal::{Principal, RequestAttributes, RequestTenant, RequestView};
use crate::errors::AppError;

/// Gate every matched route through its registered policy.
///
/// Install with `route_layer(middleware::from_fn_with_state(gate, enforce_permissions))`
/// so the matched route pattern and path parameters are available. Routes
/// without a policy are forwarded untouched. On success the
/// [`AccessDecision`](crate::models::permission::AccessDecision) is left in
/// the request extensions for the handler.
pub async fn enforce_permissions(State(gate): State<Arc<PermissionGate>>, request: Request, next: Next) -> Response {
    let Some(route) = request.extensions().get::<MatchedPath>().map(|path| path.as_str().to_owned()) else {
        return next.run(request).await;
    };
    let Some(policy) = gate.policy_for(request.method(), &route) else {
        return next.run(request).await;
    };

    let (mut parts, body) = request.into_parts();

    let params = RawPathParams::from_request_parts(&mut parts, &()).await.ok();
    let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(query)| query)
        .unwrap_or_default();

    let view = RequestView::new()
        .params(params.iter().flat_map(|params| params.iter()))
        .query(query)
        .headers(&parts.headers)
        .user(parts.extensions.get::<Principal>())
        .tenant(parts.extensions.get::<RequestTenant>())
        .attributes(parts.extensions.get::<RequestAttributes>())
        .into_value();

    match gate.authorize(policy, &view).await {
        Ok(decision) => {
            parts.extensions.insert(decision);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(denied) => AppError::from(denied).into_response(),
    }
}
