//! Connections to the underlying language server.

use crate::ProxyError;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};

/// Byte streams to a running server.
pub struct ServerConnection {
    /// Server output (its stdout).
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    /// Server input (its stdin).
    pub writer: Box<dyn AsyncWrite + Send + Unpin>,
    /// The process, when the connector spawned one. Dropping it kills the server.
    pub child: Option<Child>,
}

impl ServerConnection {
    /// Wraps a pair of in-process streams.
    pub fn from_streams<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            child: None,
        }
    }
}

impl std::fmt::Debug for ServerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConnection")
            .field("pid", &self.child.as_ref().and_then(Child::id))
            .finish_non_exhaustive()
    }
}

/// Opens connections to the underlying server.
///
/// Called once at startup and again after the server exits.
#[async_trait]
pub trait ServerConnector: Send + Sync {
    /// Establishes a fresh connection.
    async fn connect(&self) -> Result<ServerConnection, ProxyError>;
}

/// Spawns `gopls serve` as a child process.
#[derive(Debug, Clone)]
pub struct GoplsConnector {
    path: Utf8PathBuf,
}

impl GoplsConnector {
    /// Creates a connector for the binary at `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the binary this connector spawns.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

#[async_trait]
impl ServerConnector for GoplsConnector {
    async fn connect(&self) -> Result<ServerConnection, ProxyError> {
        tracing::info!(path = %self.path, "starting gopls");
        let mut child = Command::new(&self.path)
            .arg("serve")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(ProxyError::SpawnFailed)?;

        let writer = child.stdin.take().ok_or(ProxyError::MissingPipe("stdin"))?;
        let reader = child.stdout.take().ok_or(ProxyError::MissingPipe("stdout"))?;
        Ok(ServerConnection {
            reader: Box::new(reader),
            writer: Box::new(writer),
            child: Some(child),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let connector = GoplsConnector::new("/nonexistent/dir/gopls");
        let err = connector.connect().await.unwrap_err();
        assert!(matches!(err, ProxyError::SpawnFailed(_)));
    }
}
