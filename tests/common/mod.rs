#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use attendance_api_rust::config::AppConfig;
use attendance_api_rust::database::MemoryStore;
use attendance_api_rust::{app, AppState};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Start the real router over a fresh memory store on an unused port.
    /// The server lives as long as the calling test's runtime.
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = AppState::new(Arc::new(MemoryStore::new()), AppConfig::development());
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", port))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self { port, base_url, client: reqwest::Client::new() };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register an account and return its bearer token
    pub async fn login_as(&self, login: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "username": format!("Teacher {}", login), "userId": login, "password": "secret" }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let body: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "userId": login, "password": "secret" }))
            .send()
            .await?
            .json()
            .await?;
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response carried no token")
    }

    pub async fn get(&self, token: &str, path: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn post(&self, token: &str, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self.client.post(self.url(path)).bearer_auth(token).json(&body).send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn put(&self, token: &str, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self.client.put(self.url(path)).bearer_auth(token).json(&body).send().await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn delete(&self, token: &str, path: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.delete(self.url(path)).bearer_auth(token).send().await?;
        Ok((res.status(), res.json().await?))
    }

    /// Create a record through POST and return its `data.id`
    pub async fn create(&self, token: &str, path: &str, body: Value) -> Result<String> {
        let (status, body) = self.post(token, path, body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "POST {} failed: {} {}", path, status, body);
        body["data"]["id"].as_str().map(str::to_string).context("created record has no id")
    }
}

/// Ids of the standard fixture: class 10A with Alice, Bob and Carol, and
/// subject Math assigned to 10A with Bob excluded.
pub struct Roster {
    pub class_id: String,
    pub subject_id: String,
    pub alice: String,
    pub bob: String,
    pub carol: String,
}

pub async fn seed_roster(server: &TestServer, token: &str) -> Result<Roster> {
    let class_id = server.create(token, "/api/classes", json!({ "name": "10A" })).await?;
    let alice = server.create(token, "/api/students", json!({ "name": "Alice", "classId": class_id })).await?;
    let bob = server.create(token, "/api/students", json!({ "name": "Bob", "classId": class_id })).await?;
    let carol = server.create(token, "/api/students", json!({ "name": "Carol", "classId": class_id })).await?;
    let subject_id = server.create(token, "/api/subjects", json!({ "name": "Math" })).await?;

    let (status, _) = server
        .put(
            token,
            &format!("/api/subjects/{}", subject_id),
            json!({
                "assignedClasses": ["10A"],
                "excludedStudents": [{ "className": "10A", "studentIds": [bob] }]
            }),
        )
        .await?;
    anyhow::ensure!(status == StatusCode::OK, "subject update failed: {}", status);

    Ok(Roster { class_id, subject_id, alice, bob, carol })
}

/// Names from a `data` array of students
pub fn names(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|items| items.iter().filter_map(|s| s["name"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}
