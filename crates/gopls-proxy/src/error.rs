//! Proxy error types.

use crate::codec::CodecError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced by the proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// gopls could not be located.
    #[error("gopls not found: {0}")]
    ServerNotFound(String),

    /// The configured server override does not exist.
    #[error("gopls binary not found at: {0}")]
    OverrideNotFound(Utf8PathBuf),

    /// Failed to spawn the server process.
    #[error("failed to spawn gopls: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// A spawned server did not expose its standard streams.
    #[error("gopls process has no {0} pipe")]
    MissingPipe(&'static str),

    /// The transport to the client or the server failed.
    #[error("transport error: {0}")]
    Transport(#[from] CodecError),

    /// The server closed its output stream.
    #[error("gopls exited")]
    ServerExited,

    /// A generated artifact could not be written.
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
