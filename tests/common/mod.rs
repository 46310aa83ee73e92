#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// Fixed signing secret for the test server instance.
pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Apply the schema first when a database is configured; the script
        // is idempotent so repeated runs are harmless.
        if database_configured() {
            let status = Command::new("target/debug/migrate")
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status();
            if let Ok(status) = status {
                if !status.success() {
                    eprintln!("warning: migrate exited with {}", status);
                }
            }
        }

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests.
        // Memory blob backend: no object-storage credentials needed.
        let mut cmd = Command::new("target/debug/smartcount-api");
        cmd.env("SMARTCOUNT_API_PORT", port.to_string())
            .env("JWT_SECRET", TEST_JWT_SECRET)
            .env("STORAGE_BACKEND", "memory")
            // Keep health checks snappy when no database is reachable
            .env("DATABASE_ACQUIRE_TIMEOUT_SECS", "2")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL when set
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // Ready on either healthy or degraded; degraded just means
                // the database is not reachable yet
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// End-to-end scenarios need a real Postgres; they skip themselves when
/// DATABASE_URL is not configured.
pub fn database_configured() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

/// Unique email per call so tests never collide across runs.
pub fn unique_email(tag: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}-{}@example.com", tag, std::process::id(), nanos)
}

/// Register a fresh user, returning (token, email).
pub async fn register_user(
    client: &reqwest::Client,
    base_url: &str,
    tag: &str,
) -> Result<(String, String)> {
    let email = unique_email(tag);
    let res = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&serde_json::json!({ "email": email, "password": "pw123456" }))
        .send()
        .await?;

    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "register failed with {}",
        res.status()
    );

    let body = res.json::<serde_json::Value>().await?;
    let token = body["token"]
        .as_str()
        .context("register response missing token")?
        .to_string();

    Ok((token, email))
}
