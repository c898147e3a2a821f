mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::start_server().await?;
    let res = common::client().get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn robots_and_sitemap_use_site_url() -> Result<()> {
    let server = common::start_server().await?;

    let robots = common::client().get(server.url("/robots.txt")).send().await?.text().await?;
    assert!(robots.contains("User-agent: GPTBot\nDisallow: /"));
    assert!(robots.contains(&format!("Sitemap: {}/sitemap.xml", common::SITE_URL)));

    let res = common::client().get(server.url("/sitemap.xml")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let xml = res.text().await?;
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains(&format!("<loc>{}/services</loc>", common::SITE_URL)));
    Ok(())
}

#[tokio::test]
async fn dashboard_redirects_anonymous_visitors() -> Result<()> {
    let server = common::start_server().await?;
    let res = common::client().get(server.url("/dashboard")).send().await?;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()[reqwest::header::LOCATION], "/login");

    let token = common::sign_up(&server).await?;
    let res = common::client().get(server.url("/dashboard")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert!(body["counts"]["services"].is_i64());
    Ok(())
}

#[tokio::test]
async fn dropping_the_server_stops_it_and_removes_its_database() -> Result<()> {
    let server = common::start_server().await?;
    let health = server.url("/health");
    let database = server.database.clone();
    assert!(database.exists());

    drop(server);
    assert!(!database.exists());
    assert!(common::client().get(&health).send().await.is_err());
    Ok(())
}
