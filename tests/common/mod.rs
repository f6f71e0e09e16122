//! Common test utilities - CodeshotTest harness for end-to-end testing

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use codeshot::agent::{AgentError, ChatPlan, SnippetPlanner};
use codeshot::config::Config;
use codeshot::Server;
use reqwest::Client;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// PNG signature plus a marker payload, as a shell `printf`
const FAKE_PNG_PRINTF: &str = r"printf '\211PNG\r\n\032\nfake-image'";

/// Planner that always answers with the same plan
pub struct FixedPlanner(pub ChatPlan);

#[async_trait]
impl SnippetPlanner for FixedPlanner {
    async fn plan(&self, _message: &str) -> Result<ChatPlan, AgentError> {
        Ok(self.0.clone())
    }
}

/// Planner that always fails
pub struct FailingPlanner;

#[async_trait]
impl SnippetPlanner for FailingPlanner {
    async fn plan(&self, _message: &str) -> Result<ChatPlan, AgentError> {
        Err(AgentError::Api { status: 503 })
    }
}

/// Write an executable shell script
pub fn write_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write tool");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod tool");
    }
    path
}

/// Code renderer stand-in writing a PNG into `--save-to`
pub fn code_tool(dir: &Path) -> PathBuf {
    let body = format!(
        r#"out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --save-to) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
{} > "$out/render.png""#,
        FAKE_PNG_PRINTF
    );
    write_tool(dir, "carbon-now", &body)
}

/// Diagram renderer stand-in writing a PNG to `-o`
pub fn diagram_tool(dir: &Path) -> PathBuf {
    let body = format!(
        r#"out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
{} > "$out""#,
        FAKE_PNG_PRINTF
    );
    write_tool(dir, "mmdc", &body)
}

/// Test harness that spawns a real codeshot server on a random port
pub struct CodeshotTest {
    pub addr: SocketAddr,
    pub client: Client,
    pub dirs: TestDirs,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
}

/// Temp directories backing one test server
pub struct TestDirs {
    pub tools: TempDir,
    pub scratch: TempDir,
    pub public: TempDir,
}

impl TestDirs {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tools: TempDir::new()?,
            scratch: TempDir::new()?,
            public: TempDir::new()?,
        })
    }

    /// Config pointing at fake renderers and local storage in temp dirs
    pub fn config(&self, addr: SocketAddr) -> Config {
        let mut config = Config::default();
        config.server.bind_addr = addr;
        config.renderer.code_tool = code_tool(self.tools.path());
        config.renderer.diagram_tool = diagram_tool(self.tools.path());
        config.renderer.scratch_dir = Some(self.scratch.path().to_path_buf());
        config.renderer.timeout_secs = 10;
        config.storage.public_dir = self.public.path().join("generated-images");
        config
    }

    pub fn scratch_is_empty(&self) -> bool {
        std::fs::read_dir(self.scratch.path())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false)
    }
}

impl CodeshotTest {
    /// Start a server whose planner returns `plan`
    pub async fn start(plan: ChatPlan) -> Result<Self> {
        Self::start_with(Arc::new(FixedPlanner(plan)), |_| {}).await
    }

    /// Start a server with a custom planner and config tweaks
    pub async fn start_with(
        planner: Arc<dyn SnippetPlanner>,
        customize: impl FnOnce(&mut Config),
    ) -> Result<Self> {
        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let dirs = TestDirs::new()?;
        let mut config = dirs.config(addr);
        customize(&mut config);

        let server = Arc::new(Server::with_planner(config, planner).await?);
        let server_clone = server.clone();

        // Spawn the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        // Poll until server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 2 seconds");
        }

        Ok(Self {
            addr,
            client,
            dirs,
            server,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }
}

impl Drop for CodeshotTest {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}
