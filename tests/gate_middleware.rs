mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::body::{self, Body};
use axum::extract::Path;
use axum::http::{Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

use common::{CheckReply, MockPermify};
use permify_gate::authz::{Principal, RequestAttributes, RequestTenant};
use permify_gate::{enforce_permissions, PermissionGate, PolicyMetadata, PolicyRegistry};

/// Host authentication stand-in: trusts `x-user-*`, `x-tenant` and `x-org-id` headers.
async fn authenticate(mut request: Request<Body>, next: Next) -> Response {
    let (user_id, user_sub, tenant, org) = {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        (
            header("x-user-id"),
            header("x-user-sub"),
            header("x-tenant"),
            header("x-org-id"),
        )
    };

    if user_id.is_some() || user_sub.is_some() {
        request.extensions_mut().insert(Principal {
            id: user_id,
            sub: user_sub,
            ..Principal::default()
        });
    }
    if let Some(tenant) = tenant {
        request.extensions_mut().insert(RequestTenant(tenant));
    }
    if let Some(org) = org {
        request
            .extensions_mut()
            .insert(RequestAttributes::new().with("org", json!({"id": org})));
    }

    next.run(request).await
}

struct TestApp {
    router: Router,
    hits: Arc<AtomicUsize>,
}

fn app(client: permify_gate::PermifyClient, registry: PolicyRegistry) -> TestApp {
    let gate = Arc::new(PermissionGate::new(Arc::new(client), registry));
    let hits = Arc::new(AtomicUsize::new(0));

    let show = {
        let hits = hits.clone();
        move |Path(id): Path<String>| async move {
            hits.fetch_add(1, Ordering::SeqCst);
            Json(json!({"id": id, "title": "Quarterly report"}))
        }
    };
    let remove = {
        let hits = hits.clone();
        move || async move {
            hits.fetch_add(1, Ordering::SeqCst);
            StatusCode::NO_CONTENT
        }
    };
    let list = {
        let hits = hits.clone();
        move || async move {
            hits.fetch_add(1, Ordering::SeqCst);
            Json(json!([]))
        }
    };
    let public = {
        let hits = hits.clone();
        move || async move {
            hits.fetch_add(1, Ordering::SeqCst);
            "public"
        }
    };

    let router = Router::new()
        .route("/documents", get(list))
        .route("/documents/:documentId", get(show).delete(remove))
        .route("/public", get(public))
        .route_layer(middleware::from_fn_with_state(gate, enforce_permissions))
        .layer(middleware::from_fn(authenticate));

    TestApp { router, hits }
}

fn document_policies() -> Result<PolicyRegistry> {
    Ok(PolicyRegistry::new()
        .handler(
            Method::GET,
            "/documents/:documentId",
            PolicyMetadata::new("document", "read")
                .id_param("documentId")
                .context_fields(["org.id"]),
        )?
        .handler(
            Method::GET,
            "/documents",
            PolicyMetadata::new("document", "list").id_param("documentId"),
        )?)
}

fn request(method: Method, uri: &str, headers: &[(&str, &str)]) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    Ok(builder.body(Body::empty())?)
}

async fn json_body(resp: Response) -> Result<Value> {
    let body_bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    Ok(serde_json::from_slice(&body_bytes)?)
}

const AUTHENTICATED: &[(&str, &str)] = &[("x-user-id", "u1"), ("x-tenant", "t1"), ("x-org-id", "o1")];

#[tokio::test]
async fn route_without_policy_passes_through() -> Result<()> {
    let mock = MockPermify::start().await?;
    let app = app(mock.client()?, document_policies()?);

    let resp = app.router.oneshot(request(Method::GET, "/public", &[])?).await?;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(app.hits.load(Ordering::SeqCst), 1);
    assert!(mock.calls().is_empty(), "no remote call expected, got {:?}", mock.calls());

    Ok(())
}

#[tokio::test]
async fn missing_entity_id_is_denied_without_remote_call() -> Result<()> {
    let mock = MockPermify::start().await?;
    let app = app(mock.client()?, document_policies()?);

    let resp = app.router.oneshot(request(Method::GET, "/documents", AUTHENTICATED)?).await?;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = json_body(resp).await?;
    assert_eq!(body["error"], "forbidden");
    assert!(body["message"].as_str().unwrap_or_default().contains("missing entity id parameter"));
    assert_eq!(app.hits.load(Ordering::SeqCst), 0);
    assert!(mock.check_calls().is_empty());

    Ok(())
}

#[tokio::test]
async fn unauthenticated_request_is_denied_without_remote_call() -> Result<()> {
    let mock = MockPermify::start().await?;
    let app = app(mock.client()?, document_policies()?);

    let resp = app
        .router
        .oneshot(request(Method::GET, "/documents/d1", &[("x-tenant", "t1")])?)
        .await?;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = json_body(resp).await?;
    assert!(body["message"].as_str().unwrap_or_default().contains("subject not authenticated"));
    assert!(mock.check_calls().is_empty());

    Ok(())
}

#[tokio::test]
async fn missing_tenant_is_denied_without_remote_call() -> Result<()> {
    let mock = MockPermify::start().await?;
    let app = app(mock.client()?, document_policies()?);

    let resp = app
        .router
        .oneshot(request(Method::GET, "/documents/d1", &[("x-user-id", "u1")])?)
        .await?;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = json_body(resp).await?;
    assert!(body["message"].as_str().unwrap_or_default().contains("tenant id not provided"));
    assert!(mock.check_calls().is_empty());

    Ok(())
}

#[tokio::test]
async fn allowed_request_reaches_handler_unchanged() -> Result<()> {
    let mock = MockPermify::start().await?;
    let app = app(mock.client()?, document_policies()?);

    let resp = app
        .router
        .oneshot(request(Method::GET, "/documents/d1", AUTHENTICATED)?)
        .await?;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await?, json!({"id": "d1", "title": "Quarterly report"}));
    assert_eq!(app.hits.load(Ordering::SeqCst), 1);

    let checks = mock.check_calls();
    assert_eq!(checks.len(), 1);
    let check = &checks[0];
    assert_eq!(check.path, "/v1/tenants/t1/permissions/check");
    assert_eq!(check.body["entity"], json!({"type": "document", "id": "d1"}));
    assert_eq!(check.body["permission"], "read");
    assert_eq!(check.body["subject"], json!({"type": "user", "id": "u1"}));
    assert_eq!(check.body["metadata"]["depth"], 20);
    assert_eq!(check.body["context"]["data"], json!({"userId": "u1", "org": {"id": "o1"}}));

    Ok(())
}

#[tokio::test]
async fn denied_request_names_permission_and_entity() -> Result<()> {
    let mock = MockPermify::start().await?;
    mock.set_check_reply(CheckReply::Deny);
    let app = app(mock.client()?, document_policies()?);

    let resp = app
        .router
        .oneshot(request(Method::GET, "/documents/d1", AUTHENTICATED)?)
        .await?;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let message = json_body(resp).await?["message"].as_str().unwrap_or_default().to_string();
    assert!(message.contains("read"), "unexpected message: {message}");
    assert!(message.contains("document:d1"), "unexpected message: {message}");
    assert_eq!(app.hits.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn upstream_failure_is_a_generic_denial_without_retry() -> Result<()> {
    let mock = MockPermify::start().await?;
    mock.set_check_reply(CheckReply::Fail);
    let app = app(mock.client()?, document_policies()?);

    let resp = app
        .router
        .oneshot(request(Method::GET, "/documents/d1", AUTHENTICATED)?)
        .await?;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let message = json_body(resp).await?["message"].as_str().unwrap_or_default().to_string();
    assert!(message.contains("error checking permissions"));
    assert!(!message.contains("database"), "upstream detail leaked: {message}");
    assert_eq!(mock.check_calls().len(), 1);
    assert_eq!(app.hits.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn malformed_check_reply_is_a_check_failure() -> Result<()> {
    for raw in ["", "{}", r#"{"unexpected":1}"#, r#"{"can":"garbage"}"#] {
        let mock = MockPermify::start().await?;
        mock.set_check_reply(CheckReply::Malformed(raw));
        let app = app(mock.client()?, document_policies()?);

        let resp = app
            .router
            .oneshot(request(Method::GET, "/documents/d1", AUTHENTICATED)?)
            .await?;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let message = json_body(resp).await?["message"].as_str().unwrap_or_default().to_string();
        assert!(message.contains("error checking permissions"), "body {raw:?} gave {message}");
        assert_eq!(mock.check_calls().len(), 1);
        assert_eq!(app.hits.load(Ordering::SeqCst), 0);
    }

    Ok(())
}

#[tokio::test]
async fn tenant_cannot_redirect_the_check_path() -> Result<()> {
    let mock = MockPermify::start().await?;
    let app = app(mock.client()?, document_policies()?);

    for tenant in ["attacker/../victim", "t1/permissions/check?x=", "a#b", "..", "a%2F..%2Fb"] {
        let headers = [("x-user-id", "u1"), ("x-tenant", tenant), ("x-org-id", "o1")];
        let resp = app
            .router
            .clone()
            .oneshot(request(Method::GET, "/documents/d1", &headers)?)
            .await?;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "tenant {tenant:?} was let through");
        let message = json_body(resp).await?["message"].as_str().unwrap_or_default().to_string();
        assert!(message.contains("error checking permissions"), "tenant {tenant:?} gave {message}");
    }

    assert!(mock.calls().is_empty(), "unexpected remote calls: {:?}", mock.calls());
    assert_eq!(app.hits.load(Ordering::SeqCst), 0);

    let resp = app
        .router
        .oneshot(request(Method::GET, "/documents/d1", AUTHENTICATED)?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let paths: Vec<String> = mock.calls().into_iter().map(|call| call.path).collect();
    assert_eq!(paths, vec!["/v1/tenants/t1/permissions/check".to_string()]);

    Ok(())
}

#[tokio::test]
async fn subject_falls_back_to_sub_claim() -> Result<()> {
    let mock = MockPermify::start().await?;
    let app = app(mock.client()?, document_policies()?);

    let resp = app
        .router
        .oneshot(request(
            Method::GET,
            "/documents/d1",
            &[("x-user-sub", "auth0|42"), ("x-tenant", "t1")],
        )?)
        .await?;

    assert_eq!(resp.status(), StatusCode::OK);
    let checks = mock.check_calls();
    assert_eq!(checks[0].body["subject"]["id"], "auth0|42");

    Ok(())
}

#[tokio::test]
async fn policy_tenant_overrides_request_tenant() -> Result<()> {
    let mock = MockPermify::start().await?;
    let registry = PolicyRegistry::new()
        .handler(
            Method::GET,
            "/documents/:documentId",
            PolicyMetadata::new("document", "read")
                .id_param("documentId")
                .tenant("req.org.id"),
        )?
        .handler(
            Method::DELETE,
            "/documents/:documentId",
            PolicyMetadata::new("document", "delete")
                .id_param("documentId")
                .tenant("archive"),
        )?;
    let app = app(mock.client()?, registry);

    let resp = app
        .router
        .clone()
        .oneshot(request(Method::GET, "/documents/d1", AUTHENTICATED)?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .router
        .oneshot(request(Method::DELETE, "/documents/d1", AUTHENTICATED)?)
        .await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let paths: Vec<String> = mock.check_calls().into_iter().map(|call| call.path).collect();
    assert_eq!(
        paths,
        vec![
            "/v1/tenants/o1/permissions/check".to_string(),
            "/v1/tenants/archive/permissions/check".to_string(),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn handler_policy_wins_over_group_policy() -> Result<()> {
    let mock = MockPermify::start().await?;
    let registry = PolicyRegistry::new()
        .group(
            "/documents",
            PolicyMetadata::new("document", "view").id_param("documentId"),
        )?
        .handler(
            Method::DELETE,
            "/documents/:documentId",
            PolicyMetadata::new("document", "delete").id_param("documentId"),
        )?;
    let app = app(mock.client()?, registry);

    app.router
        .clone()
        .oneshot(request(Method::GET, "/documents/d1", AUTHENTICATED)?)
        .await?;
    app.router
        .oneshot(request(Method::DELETE, "/documents/d1", AUTHENTICATED)?)
        .await?;

    let permissions: Vec<Value> = mock
        .check_calls()
        .into_iter()
        .map(|call| call.body["permission"].clone())
        .collect();
    assert_eq!(permissions, vec![json!("view"), json!("delete")]);

    Ok(())
}
