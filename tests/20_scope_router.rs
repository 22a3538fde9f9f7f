mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use siteops_api::app::{router, AppState};
use siteops_api::auth::JwtDecoder;
use siteops_api::config::AppConfig;
use siteops_api::services::{InMemoryDirectory, WorkerRecord};

fn worker(id: i64, site: Option<i64>, subsite: Option<i64>) -> WorkerRecord {
    WorkerRecord {
        id,
        username: Some(format!("w{}", id)),
        name: format!("Worker {}", id),
        dni: None,
        phone: None,
        status: Some("ACTIVE".to_string()),
        role: "GH".to_string(),
        id_site: site,
        id_subsite: subsite,
    }
}

fn app() -> Router {
    let decoder = JwtDecoder::new(common::TEST_SECRET).expect("decoder");
    let directory = InMemoryDirectory::new(vec![
        worker(42, Some(5), Some(2)),
        worker(43, Some(5), Some(3)),
        worker(44, Some(6), Some(1)),
    ]);
    let state = AppState::new(Arc::new(decoder), Arc::new(directory));

    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    router(state, &config)
}

async fn get(uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
    send(app(), uri, token).await
}

async fn send(app: Router, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    let resp = app.oneshot(builder.body(Body::empty())?).await?;

    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, body))
}

#[tokio::test]
async fn scope_endpoint_reports_supervisor_filters() -> Result<()> {
    let token = common::token_for(42, "SUPERVISOR", Some(5), Some(2));
    let (status, body) = get("/api/scope", Some(&token)).await?;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    let data = &body["data"];
    assert_eq!(data["scope"]["role"], "SUPERVISOR");
    assert_eq!(data["siteFilter"], json!({ "siteId": 5 }));
    assert_eq!(data["subsiteFilter"], json!({ "siteId": 5, "subsiteId": 2 }));
    assert_eq!(data["sql"]["subsite"]["params"], json!([5, 2]));
    Ok(())
}

#[tokio::test]
async fn superadmin_filters_are_empty() -> Result<()> {
    let token = common::token_for(1, "SUPERADMIN", None, None);
    let (status, body) = get("/api/scope", Some(&token)).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["siteFilter"], json!({}));
    assert_eq!(body["data"]["subsiteFilter"], json!({}));
    assert_eq!(body["data"]["sql"]["site"]["where"], "1=1");
    Ok(())
}

#[tokio::test]
async fn unknown_role_is_treated_as_unauthenticated() -> Result<()> {
    let token = common::token_for(1, "OWNER", Some(5), None);
    let (status, body) = get("/api/scope", Some(&token)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn forged_token_is_treated_as_unauthenticated() -> Result<()> {
    let forged = siteops_api::auth::mint_token(
        &siteops_api::auth::Claims::new(1, "SUPERADMIN", None, None, 1),
        "some-other-secret",
    )?;
    let (status, _) = get("/api/workers", Some(&forged)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn supervisor_lists_only_own_subsite() -> Result<()> {
    let token = common::token_for(42, "SUPERVISOR", Some(5), Some(2));
    let (status, body) = get("/api/workers", Some(&token)).await?;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["data"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .filter_map(|w| w["id"].as_i64())
        .collect();
    assert_eq!(ids, vec![42]);
    Ok(())
}

#[tokio::test]
async fn admin_cannot_ask_for_another_site() -> Result<()> {
    let token = common::token_for(7, "ADMIN", Some(5), Some(2));

    let (status, body) = get("/api/workers?siteId=5", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(|a| a.len()), Some(2));

    let (status, body) = get("/api/workers?siteId=6", Some(&token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn subsite_access_truth_table() -> Result<()> {
    let supervisor = common::token_for(42, "SUPERVISOR", Some(5), Some(2));
    let admin = common::token_for(7, "ADMIN", Some(5), None);
    let root = common::token_for(1, "SUPERADMIN", None, None);

    let cases = [
        (&root, "/api/sites/9/subsites/9/access", true),
        (&admin, "/api/sites/5/subsites/77/access", true),
        (&admin, "/api/sites/6/subsites/77/access", false),
        (&supervisor, "/api/sites/5/subsites/2/access", true),
        (&supervisor, "/api/sites/5/subsites/3/access", false),
        (&supervisor, "/api/sites/6/access", false),
        (&admin, "/api/sites/5/access", true),
    ];

    for (token, uri, expected) in cases {
        let (status, body) = get(uri, Some(token.as_str())).await?;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body["data"]["allowed"], expected, "{}", uri);
    }
    Ok(())
}

#[tokio::test]
async fn whoami_includes_persisted_record() -> Result<()> {
    let token = common::token_for(43, "GH", Some(5), Some(3));
    let (status, body) = get("/api/auth/whoami", Some(&token)).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["userId"], 43);
    assert_eq!(body["data"]["isGH"], true);
    assert_eq!(body["data"]["record"]["name"], "Worker 43");
    Ok(())
}

#[tokio::test]
async fn health_needs_no_token() -> Result<()> {
    let (status, body) = get("/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["directory"], "ok");
    Ok(())
}

#[tokio::test]
async fn concurrent_requests_keep_their_own_scope() -> Result<()> {
    let app = app();
    let supervisor = common::token_for(42, "SUPERVISOR", Some(5), Some(2));
    let admin = common::token_for(7, "ADMIN", Some(6), None);

    let (a, b, anon) = tokio::join!(
        send(app.clone(), "/api/scope", Some(&supervisor)),
        send(app.clone(), "/api/scope", Some(&admin)),
        send(app.clone(), "/api/scope", None),
    );
    let (a, b, anon) = (a?, b?, anon?);

    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(a.1["data"]["scope"]["userId"], 42);
    assert_eq!(a.1["data"]["subsiteFilter"], json!({ "siteId": 5, "subsiteId": 2 }));

    assert_eq!(b.0, StatusCode::OK);
    assert_eq!(b.1["data"]["scope"]["userId"], 7);
    assert_eq!(b.1["data"]["subsiteFilter"], json!({ "siteId": 6 }));

    assert_eq!(anon.0, StatusCode::UNAUTHORIZED);

    // A later request on the same router starts from an empty slot
    let (status, _) = send(app, "/api/scope", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
