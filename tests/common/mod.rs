#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

pub const SITE_URL: &str = "https://agency.test";

/// A running server binary with its own database. Dropping it stops the
/// process and deletes the database files.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub database: PathBuf,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port and a throwaway database for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let database = std::env::temp_dir().join(format!("agency-site-test-{}.db", uuid::Uuid::new_v4().simple()));

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_agency-site"));
        cmd.env("AGENCY_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("DATABASE_URL", format!("sqlite://{}?mode=rwc", database.display()))
            .env("SITE_URL", SITE_URL)
            .env("AUTH_ALLOW_SIGN_UP", "true")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, database, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.database.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// Client that does not follow redirects, so gate responses stay visible
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("http client")
}

/// Sign up a fresh staff account and return its bearer token
pub async fn sign_up(server: &TestServer) -> Result<String> {
    let email = format!("staff-{}@agency.test", uuid::Uuid::new_v4().simple());
    let res = client()
        .post(server.url("/api/auth/sign-up/email"))
        .json(&json!({"email": email, "name": "Staff", "password": "correct-horse-battery"}))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "sign-up failed: {}", res.status());
    let body: Value = res.json().await?;
    body["token"].as_str().map(String::from).context("sign-up returned no token")
}
