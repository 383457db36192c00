//! Document URI helpers.

use camino::Utf8PathBuf;
use url::Url;

/// File extension of sugo sources.
pub const SOURCE_EXTENSION: &str = "sugo";

/// File extension of generated Go files.
pub const GENERATED_EXTENSION: &str = "go";

/// Returns the URI gopls sees for a sugo document, or `None` if `uri` is not
/// a sugo document.
pub fn generated_uri(uri: &str) -> Option<String> {
    let stem = uri.strip_suffix(SOURCE_EXTENSION)?.strip_suffix('.')?;
    if stem.is_empty() || stem.ends_with('/') {
        return None;
    }
    Some(format!("{stem}.{GENERATED_EXTENSION}"))
}

/// Converts a `file://` URI into a filesystem path.
pub fn uri_to_path(uri: &str) -> Option<Utf8PathBuf> {
    let url = Url::parse(uri).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    let path = url.to_file_path().ok()?;
    Utf8PathBuf::try_from(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generated_uri() {
        assert_eq!(
            generated_uri("file:///src/main.sugo").as_deref(),
            Some("file:///src/main.go")
        );
        assert_eq!(generated_uri("file:///src/main.go"), None);
        assert_eq!(generated_uri("file:///src/.sugo"), None);
        assert_eq!(generated_uri("file:///src/mainsugo"), None);
    }

    #[test]
    fn test_uri_to_path_decodes() {
        assert_eq!(
            uri_to_path("file:///tmp/my%20app/main.sugo"),
            Some(Utf8PathBuf::from("/tmp/my app/main.sugo"))
        );
        assert_eq!(uri_to_path("untitled:Untitled-1"), None);
    }
}
