mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/health")).await?;

    // OK with a database, SERVICE_UNAVAILABLE without one
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );
    let body = res.json::<Value>().await?;
    assert!(body["data"]["status"].is_string());
    Ok(())
}

#[tokio::test]
async fn api_index_welcomes() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/api")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["message"], "Welcome to the plot device.");
    Ok(())
}

#[tokio::test]
async fn home_page_renders() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let html = res.text().await?;
    assert!(html.contains("<html"));
    Ok(())
}

#[tokio::test]
async fn contact_form_is_accepted() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/contact"))
        .json(&json!({ "name": "Ren Hoek", "email": "ren@stimpy.show", "message": "You eediot!" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["message"], "Success.");
    Ok(())
}

#[tokio::test]
async fn contact_requires_every_field() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/contact"))
        .json(&json!({ "name": "Ren Hoek", "email": "ren@stimpy.show" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert!(body["field_errors"]["message"].is_string());
    Ok(())
}
