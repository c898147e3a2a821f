mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn session_cookie_authenticates_requests() -> Result<()> {
    let server = common::start_server().await?;
    let client = common::client();
    let email = format!("cookie-{}@agency.test", uuid::Uuid::new_v4().simple());

    let res = client
        .post(server.url("/api/auth/sign-up/email"))
        .json(&json!({"email": email, "name": "Cookie", "password": "password123"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let cookie = res.headers()[header::SET_COOKIE].to_str()?.split(';').next().unwrap_or_default().to_string();

    let res = client.get(server.url("/api/auth/get-session")).header(header::COOKIE, &cookie).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["user"]["email"], email.as_str());

    let res = client.post(server.url("/api/auth/sign-out")).header(header::COOKIE, &cookie).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url("/api/auth/get-session")).header(header::COOKIE, &cookie).send().await?;
    assert_eq!(res.json::<Value>().await?, Value::Null);
    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_rejected() -> Result<()> {
    let server = common::start_server().await?;
    let res = common::client()
        .post(server.url("/api/auth/sign-in/email"))
        .json(&json!({"email": "nobody@agency.test", "password": "password123"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
    Ok(())
}
