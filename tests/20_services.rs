mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn service_and_item_round_trip_over_http() -> Result<()> {
    let server = common::start_server().await?;
    let token = common::sign_up(&server).await?;
    let client = common::client();

    let res = client
        .post(server.url("/api/services"))
        .bearer_auth(&token)
        .json(&json!({"icon": "rocket", "title": "Launch", "description": "Go-to-market"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let service: Value = res.json().await?;
    let service_id = service["id"].as_i64().unwrap();

    let res = client
        .post(server.url(&format!("/api/services/{}/items", service_id)))
        .bearer_auth(&token)
        .json(&json!({"icon": "megaphone", "title": "Campaigns", "items": "[\"Ads\",\"Email\"]"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let item: Value = res.json().await?;

    let res = client.get(server.url(&format!("/api/services/{}", service_id))).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["items"], json!([item]));
    assert_eq!(body["items"][0]["items"], json!(["Ads", "Email"]));
    Ok(())
}

#[tokio::test]
async fn writes_require_a_session() -> Result<()> {
    let server = common::start_server().await?;
    let res = common::client()
        .post(server.url("/api/services"))
        .json(&json!({"icon": "x", "title": "t", "description": "d"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({"success": false, "error": "Authentication required", "code": "UNAUTHORIZED"}));
    Ok(())
}

#[tokio::test]
async fn unknown_service_is_404() -> Result<()> {
    let server = common::start_server().await?;
    let res = common::client().get(server.url("/api/services/999999")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "SERVICE_NOT_FOUND");
    Ok(())
}
