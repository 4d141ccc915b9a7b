mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn protected_route_requires_credentials() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/api/users")).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let challenge = res
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(challenge.starts_with("Basic realm="), "challenge was {:?}", challenge);

    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn malformed_basic_header_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .get(server.url("/api/accounts/my"))
        .header(header::AUTHORIZATION, "Basic !!!not-base64!!!")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_requires_username_and_password() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/login"))
        .json(&json!({ "username": "ren" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["password"].is_string());
    Ok(())
}

#[tokio::test]
async fn signup_rejects_bad_usernames() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/signup"))
        .json(&json!({
            "name": "Ren Hoek",
            "email": "ren@stimpy.show",
            "username": "ren hoek",
            "password": "eediot"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn logout_without_credentials_succeeds() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new().delete(server.url("/api/logout")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["message"], "Success.");
    Ok(())
}
