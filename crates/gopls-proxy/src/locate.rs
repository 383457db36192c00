//! Locating the gopls binary.

use crate::ProxyError;
use camino::{Utf8Path, Utf8PathBuf};

/// Executable name searched for on `PATH`.
pub const GOPLS: &str = "gopls";

/// Finds gopls, honouring an explicit override first.
///
/// Search order: the override (which must exist), `PATH`, `$GOBIN`,
/// `$GOPATH/bin`, then `~/go/bin`. Returns an error when nothing is found;
/// the proxy never runs without a server.
pub fn find_gopls(override_path: Option<&Utf8Path>) -> Result<Utf8PathBuf, ProxyError> {
    if let Some(path) = override_path {
        let expanded = shellexpand::tilde(path.as_str());
        let path = Utf8Path::new(expanded.as_ref());
        if path.is_file() {
            return Ok(path.to_owned());
        }
        return Err(ProxyError::OverrideNotFound(path.to_owned()));
    }

    if let Ok(path) = which::which(GOPLS) {
        if let Ok(utf8_path) = Utf8PathBuf::try_from(path) {
            return Ok(utf8_path);
        }
    }

    for dir in go_bin_dirs() {
        let candidate = dir.join(GOPLS);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(ProxyError::ServerNotFound(
        "install it with `go install golang.org/x/tools/gopls@latest` or set underlyingServerPathOverride"
            .to_string(),
    ))
}

/// Directories where `go install` places binaries.
fn go_bin_dirs() -> Vec<Utf8PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(gobin) = std::env::var("GOBIN") {
        if !gobin.is_empty() {
            candidates.push(Utf8PathBuf::from(gobin));
        }
    }
    if let Ok(gopath) = std::env::var("GOPATH") {
        candidates.extend(
            gopath
                .split(':')
                .filter(|p| !p.is_empty())
                .map(|p| Utf8PathBuf::from(p).join("bin")),
        );
    }
    match dirs::home_dir().and_then(|p| Utf8PathBuf::try_from(p).ok()) {
        Some(home) => candidates.push(home.join("go/bin")),
        None => candidates.push(Utf8PathBuf::from(shellexpand::tilde("~/go/bin").as_ref())),
    }
    candidates
}
