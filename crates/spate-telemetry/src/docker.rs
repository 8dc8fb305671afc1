//! Docker Engine API backend (swarm mode).
//!
//! Opens one HTTP/1.1 connection per query over the engine's unix socket
//! or a TCP address, the same way as a plain health probe: connect,
//! handshake with hyper, send one GET, read the whole body.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Empty};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::error::OrchestratorError;
use crate::orchestrator::{Orchestrator, ServiceMode};

/// Engine address used when nothing else is configured.
pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// Default per-query timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the Docker engine listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerEndpoint {
    /// Unix domain socket path.
    Unix(PathBuf),
    /// `host:port` reached over plain TCP.
    Tcp(String),
}

impl DockerEndpoint {
    /// Parse a `DOCKER_HOST`-style address.
    ///
    /// Accepts `unix:///path`, `tcp://host:port` and `http://host:port`.
    pub fn parse(host: &str) -> Result<Self, OrchestratorError> {
        let host = host.trim();
        if let Some(path) = host.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(OrchestratorError::InvalidHost(host.to_string()));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }

        let addr = host
            .strip_prefix("tcp://")
            .or_else(|| host.strip_prefix("http://"))
            .ok_or_else(|| OrchestratorError::InvalidHost(host.to_string()))?
            .trim_end_matches('/');
        if addr.is_empty() || !addr.contains(':') {
            return Err(OrchestratorError::InvalidHost(host.to_string()));
        }
        Ok(Self::Tcp(addr.to_string()))
    }
}

/// Orchestrator backed by the Docker Engine API.
#[derive(Debug, Clone)]
pub struct DockerOrchestrator {
    endpoint: DockerEndpoint,
    timeout: Duration,
}

impl DockerOrchestrator {
    pub fn new(endpoint: DockerEndpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    /// Build from a `DOCKER_HOST`-style address.
    pub fn from_host(host: &str, timeout: Duration) -> Result<Self, OrchestratorError> {
        Ok(Self::new(DockerEndpoint::parse(host)?, timeout))
    }

    pub fn endpoint(&self) -> &DockerEndpoint {
        &self.endpoint
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, OrchestratorError> {
        let (status, body) = tokio::time::timeout(self.timeout, self.get(path))
            .await
            .map_err(|_| OrchestratorError::Timeout(self.timeout))??;

        if status == StatusCode::NOT_FOUND {
            return Err(OrchestratorError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(OrchestratorError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        serde_json::from_slice(&body).map_err(|e| OrchestratorError::Decode(e.to_string()))
    }

    async fn get(&self, path: &str) -> Result<(StatusCode, Bytes), OrchestratorError> {
        match &self.endpoint {
            #[cfg(unix)]
            DockerEndpoint::Unix(socket) => {
                let stream = tokio::net::UnixStream::connect(socket)
                    .await
                    .map_err(|e| OrchestratorError::Connect(format!("{}: {e}", socket.display())))?;
                send_get(stream, "localhost", path).await
            }
            #[cfg(not(unix))]
            DockerEndpoint::Unix(socket) => Err(OrchestratorError::InvalidHost(format!(
                "unix sockets unsupported on this platform: {}",
                socket.display()
            ))),
            DockerEndpoint::Tcp(addr) => {
                let stream = tokio::net::TcpStream::connect(addr.as_str())
                    .await
                    .map_err(|e| OrchestratorError::Connect(format!("{addr}: {e}")))?;
                send_get(stream, addr, path).await
            }
        }
    }
}

#[async_trait]
impl Orchestrator for DockerOrchestrator {
    async fn service_mode(&self, service: &str) -> Result<ServiceMode, OrchestratorError> {
        let inspect: ServiceInspect = self.get_json(&service_path(service)).await?;
        Ok(inspect.mode())
    }

    async fn running_tasks(&self, service: &str) -> Result<u64, OrchestratorError> {
        let tasks: Vec<Task> = self.get_json(&tasks_path(service)?).await?;
        Ok(count_running(&tasks))
    }
}

/// `/services/{name}` with the name percent-encoded as one path segment.
fn service_path(service: &str) -> String {
    format!("/services/{}", urlencoding::encode(service))
}

/// `/tasks` query restricted to tasks of `service` meant to be running.
fn tasks_path(service: &str) -> Result<String, OrchestratorError> {
    let filters = serde_json::json!({
        "service": [service],
        "desired-state": ["running"],
    });
    let query = serde_urlencoded::to_string([("filters", filters.to_string())])
        .map_err(|e| OrchestratorError::Request(e.to_string()))?;
    Ok(format!("/tasks?{query}"))
}

async fn send_get<S>(stream: S, host: &str, path: &str) -> Result<(StatusCode, Bytes), OrchestratorError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| OrchestratorError::Connect(e.to_string()))?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "docker connection closed with error");
        }
    });

    let req = http::Request::builder()
        .method("GET")
        .uri(path)
        .header("host", host)
        .header("user-agent", "spate-producer/0.1")
        .body(Empty::<Bytes>::new())
        .map_err(|e| OrchestratorError::Request(e.to_string()))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| OrchestratorError::Request(e.to_string()))?;
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| OrchestratorError::Request(e.to_string()))?
        .to_bytes();

    debug!(%path, %status, bytes = body.len(), "docker api response");
    Ok((status, body))
}

// ── Engine API payloads (only the fields we read) ──────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceInspect {
    spec: ServiceSpec,
}

impl ServiceInspect {
    fn mode(&self) -> ServiceMode {
        match (&self.spec.mode.replicated, &self.spec.mode.global) {
            (Some(replicated), _) => ServiceMode::Replicated {
                replicas: replicated.replicas,
            },
            (None, Some(_)) => ServiceMode::Global,
            // Neither set: the engine treats this as replicated with no count.
            (None, None) => ServiceMode::Replicated { replicas: None },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceSpec {
    #[serde(default)]
    mode: ModeSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ModeSpec {
    replicated: Option<ReplicatedSpec>,
    global: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReplicatedSpec {
    replicas: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Task {
    #[serde(default)]
    status: TaskStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TaskStatus {
    #[serde(default)]
    state: String,
}

fn count_running(tasks: &[Task]) -> u64 {
    tasks.iter().filter(|t| t.status.state == "running").count() as u64
}
