//! Parsing generated Go with tree-sitter-go.

use tree_sitter::{Node, Parser, Tree};

/// A syntax error in generated Go, located by generated byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    /// Start of the offending node in the generated text.
    pub offset: usize,
    /// End of the offending node in the generated text.
    pub end: usize,
    pub message: String,
}

/// Parses `text` as Go, returning the tree or the first syntax error.
pub(crate) fn parse_go(text: &str) -> Result<Tree, SyntaxError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| SyntaxError {
            offset: 0,
            end: 0,
            message: format!("failed to load the Go grammar: {e}"),
        })?;

    let tree = parser.parse(text, None).ok_or_else(|| SyntaxError {
        offset: 0,
        end: 0,
        message: "tree-sitter parse failed".to_string(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(find_syntax_error(&root, text.as_bytes()).unwrap_or(SyntaxError {
            offset: 0,
            end: 0,
            message: "unknown syntax error".to_string(),
        }));
    }
    Ok(tree)
}

fn find_syntax_error(node: &Node, source: &[u8]) -> Option<SyntaxError> {
    if node.is_missing() {
        return Some(SyntaxError {
            offset: node.start_byte(),
            end: node.end_byte(),
            message: format!("missing `{}`", node.kind()),
        });
    }
    if node.is_error() {
        let text = node.utf8_text(source).unwrap_or("<invalid>");
        let first_line = text.lines().next().unwrap_or_default().trim();
        return Some(SyntaxError {
            offset: node.start_byte(),
            end: node.end_byte(),
            message: format!("unexpected `{first_line}`"),
        });
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if !child.has_error() {
            continue;
        }
        if let Some(err) = find_syntax_error(&child, source) {
            return Some(err);
        }
    }
    None
}

/// Returns the source text of `node`.
pub(crate) fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_valid_go() {
        let tree = parse_go("package main\n\nfunc main() {\n\tx := 1\n\t_ = x\n}\n").unwrap();
        assert_eq!(tree.root_node().kind(), "source_file");
    }

    #[test]
    fn test_reports_first_error() {
        let err = parse_go("package main\n\nfunc main() {\n\tx := )\n}\n").unwrap_err();
        assert!(err.offset >= 28, "error at {}", err.offset);
        assert!(err.message.starts_with("unexpected") || err.message.starts_with("missing"));
    }
}
