//! The pass interface of the structural bridge.
//!
//! A pass declares what it can do through [`PassCapabilities`]; the bridge
//! invokes each hook only when the matching capability is set. Passes run in
//! a fixed order: every discovery hook first, then transforms, then
//! declaration injection.

use crate::facts::Facts;
use crate::DesugarError;
use source_map::{LineIndex, Position, PositionCorrection, Span};
use sugo_rewriter::{Fragment, PendingNode};
use tree_sitter::Node;

/// What a pass can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassCapabilities {
    /// Stable pass identifier used in logs.
    pub id: &'static str,
    /// The pass collects facts or checks preconditions.
    pub can_discover: bool,
    /// The pass expands pending nodes.
    pub can_transform: bool,
    /// The pass's expansions may request top-level declarations.
    pub can_inject_declarations: bool,
}

impl PassCapabilities {
    /// Creates capabilities with nothing enabled.
    pub const fn new(id: &'static str) -> Self {
        Self {
            id,
            can_discover: false,
            can_transform: false,
            can_inject_declarations: false,
        }
    }

    /// Enables discovery.
    pub const fn discover(mut self) -> Self {
        self.can_discover = true;
        self
    }

    /// Enables transforms.
    pub const fn transform(mut self) -> Self {
        self.can_transform = true;
        self
    }

    /// Enables declaration injection.
    pub const fn inject(mut self) -> Self {
        self.can_inject_declarations = true;
        self
    }
}

/// A pending node attached to the tree node of its stub.
#[derive(Debug, Clone, Copy)]
pub struct Attached<'t> {
    /// Index of the pending node in generated order.
    pub index: usize,
    /// The construct.
    pub pending: &'t PendingNode,
    /// The stub's tree node.
    pub node: Node<'t>,
}

/// State available to discovery hooks.
pub struct Discovery<'a, 't> {
    /// Root of the parsed generated text.
    pub root: Node<'t>,
    /// The generated text.
    pub text: &'a str,
    /// Attached pending nodes, in generated order.
    pub pending: &'a [Attached<'t>],
    /// Index of the original source, for error positions.
    pub original: &'a LineIndex,
    /// Facts shared with later passes.
    pub facts: &'a mut Facts,
    /// Collected precondition failures.
    pub errors: &'a mut Vec<DesugarError>,
}

impl Discovery<'_, '_> {
    /// Returns the original position of `span`'s start.
    pub fn position(&self, span: Span) -> Position {
        self.original.position(span.start).unwrap_or_default()
    }
}

/// State available to transform hooks.
pub struct TransformContext<'a> {
    /// The generated text.
    pub text: &'a str,
    /// Index of the original source, for error positions.
    pub original: &'a LineIndex,
    /// Facts collected by discovery.
    pub facts: &'a Facts,
}

impl TransformContext<'_> {
    /// Returns the original position of `span`'s start.
    pub fn position(&self, span: Span) -> Position {
        self.original.position(span.start).unwrap_or_default()
    }

    /// Returns the leading whitespace of the generated line containing `offset`.
    pub fn indent_at(&self, offset: usize) -> &str {
        let line_start = self.text[..offset.min(self.text.len())]
            .rfind('\n')
            .map_or(0, |idx| idx + 1);
        let line = &self.text[line_start..];
        let width = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..width]
    }
}

/// A top-level declaration requested by an expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Deduplication key; a key is injected at most once per file.
    pub key: &'static str,
    /// The declaration's Go text.
    pub text: String,
}

/// The Go text replacing one stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// The replacement text.
    pub text: String,
    /// The user-meaningful original span the whole expansion is attributed to.
    pub anchor: Span,
    /// Corrections with generated spans relative to the start of `text`.
    pub corrections: Vec<PositionCorrection>,
    /// Declarations the expansion depends on.
    pub declarations: Vec<Declaration>,
}

/// Builds an [`Expansion`], recording verbatim corrections for carried code.
#[derive(Debug, Default)]
pub struct ExpansionWriter {
    text: String,
    corrections: Vec<PositionCorrection>,
    declarations: Vec<Declaration>,
}

impl ExpansionWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends synthesized text.
    pub fn push(&mut self, text: &str) -> &mut Self {
        self.text.push_str(text);
        self
    }

    /// Appends original code that maps character-for-character.
    pub fn carry(&mut self, fragment: &Fragment) -> &mut Self {
        let start = self.text.len();
        self.text.push_str(&fragment.text);
        self.corrections.push(PositionCorrection::verbatim(
            Span::from_usize(start, self.text.len()),
            fragment.span,
        ));
        self
    }

    /// Appends a body as one indented line. Continuation lines of a
    /// multi-line body keep their original indentation.
    pub fn carry_body(&mut self, body: &Fragment, indent: &str) -> &mut Self {
        if body.text.is_empty() {
            return self;
        }
        self.push(indent).carry(body).push("\n")
    }

    /// Requests a top-level declaration.
    pub fn declare(&mut self, declaration: Declaration) -> &mut Self {
        if !self.declarations.iter().any(|d| d.key == declaration.key) {
            self.declarations.push(declaration);
        }
        self
    }

    /// Finishes the expansion, attributing it as a whole to `anchor`.
    pub fn finish(self, anchor: Span) -> Expansion {
        let mut corrections = Vec::with_capacity(self.corrections.len() + 1);
        corrections.push(PositionCorrection::anchored(
            Span::from_usize(0, self.text.len()),
            anchor,
        ));
        corrections.extend(self.corrections);
        Expansion {
            text: self.text,
            anchor,
            corrections,
            declarations: self.declarations,
        }
    }
}

/// A structural pass.
pub trait Pass: Send + Sync {
    /// Declares the hooks this pass implements.
    fn capabilities(&self) -> PassCapabilities;

    /// Collects facts or checks preconditions. Called when `can_discover`.
    fn discover(&self, _cx: &mut Discovery<'_, '_>) {}

    /// Expands `node`, or returns `None` if the pass does not handle it.
    /// Called when `can_transform`.
    fn transform(
        &self,
        _node: &Attached<'_>,
        _cx: &TransformContext<'_>,
    ) -> Option<Result<Expansion, DesugarError>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_capabilities_builder() {
        let caps = PassCapabilities::new("match").transform().inject();
        assert!(!caps.can_discover);
        assert!(caps.can_transform);
        assert!(caps.can_inject_declarations);
    }

    #[test]
    fn test_writer_records_carried_code() {
        let mut writer = ExpansionWriter::new();
        writer
            .push("return ")
            .carry(&Fragment {
                text: "x * 2".to_string(),
                span: Span::from_usize(10, 15),
            });
        let expansion = writer.finish(Span::from_usize(6, 9));
        assert_eq!(expansion.text, "return x * 2");
        assert_eq!(
            expansion.corrections,
            vec![
                PositionCorrection::anchored(Span::from_usize(0, 12), Span::from_usize(6, 9)),
                PositionCorrection::verbatim(Span::from_usize(7, 12), Span::from_usize(10, 15)),
            ]
        );
    }

    #[test]
    fn test_indent_at() {
        let facts = Facts::default();
        let original = LineIndex::new("");
        let cx = TransformContext {
            text: "func f() {\n\t\t{}\n}\n",
            original: &original,
            facts: &facts,
        };
        assert_eq!(cx.indent_at(13), "\t\t");
        assert_eq!(cx.indent_at(3), "");
    }
}
