//! Language server proxy for sugo.
//!
//! The proxy sits between an editor and gopls. For every open `.sugo`
//! document it keeps a session that transpiles the editor's text, shows gopls
//! the generated Go under a `.go` URI, and maps positions in both directions:
//!
//! - request positions from the original into the generated file
//! - response ranges, locations and edits back into the original file
//! - gopls diagnostics back into the original file
//!
//! Documents that fail to transpile get local diagnostics and are never sent
//! to gopls. Traffic for other documents passes through untouched.
//!
//! # Example
//!
//! ```no_run
//! use gopls_proxy::{find_gopls, GoplsConnector, Proxy, ProxyConfig};
//!
//! # async fn run() -> Result<(), gopls_proxy::ProxyError> {
//! let config = ProxyConfig::default();
//! let gopls = find_gopls(config.underlying_server_path_override.as_deref())?;
//! let proxy = Proxy::new(GoplsConnector::new(gopls), config);
//! proxy.serve(tokio::io::stdin(), tokio::io::stdout()).await
//! # }
//! ```

mod codec;
mod config;
mod connector;
mod convert;
mod error;
mod locate;
mod message;
mod proxy;
mod remap;
mod session;
pub mod uri;

pub use codec::{CodecError, LspCodec};
pub use config::{LogLevel, ProxyConfig};
pub use connector::{GoplsConnector, ServerConnection, ServerConnector};
pub use convert::{diagnostic_to_lsp, position_to_lsp, severity_to_lsp};
pub use error::ProxyError;
pub use locate::{find_gopls, GOPLS};
pub use message::{INTERNAL_ERROR, REQUEST_FAILED};
pub use proxy::Proxy;
pub use session::{apply_change, DocumentSession, SessionState, SessionView, Snapshot};
