//! The structural bridge: parse, attach, discover, transform, splice.

use crate::facts::Facts;
use crate::parse::{parse_go, SyntaxError};
use crate::pass::{Attached, Discovery, Pass, PassCapabilities, TransformContext};
use crate::passes::default_passes;
use crate::splice::{splice, Edit};
use crate::{DesugarError, ParseError};
use rustc_hash::FxHashSet;
use source_map::{ByteOffset, LineIndex, PositionCorrection, RewriteRecord, RuleId, Span};
use sugo_rewriter::{PendingKind, RewriteOutput, Rule};
use thiserror::Error;
use tree_sitter::Node;

/// Record id of injected top-level declarations.
pub const INJECTED: RuleId = RuleId::new("injected");

/// The final Go text with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOutput {
    /// The generated Go text, with every placeholder expanded.
    pub text: String,
    /// Gapless records for `text`.
    pub records: Vec<RewriteRecord>,
    /// Structural corrections over `text`.
    pub corrections: Vec<PositionCorrection>,
}

/// A failure of the structural pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The rewritten text is not valid Go.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// One or more structural preconditions failed.
    #[error("{} structural error(s)", .0.len())]
    Desugar(Vec<DesugarError>),
}

/// Runs the ordered structural passes over rewritten text.
pub struct AstBridge {
    passes: Vec<Box<dyn Pass>>,
}

impl Default for AstBridge {
    fn default() -> Self {
        Self::new(default_passes())
    }
}

impl std::fmt::Debug for AstBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AstBridge")
            .field("passes", &self.capabilities().map(|c| c.id).collect::<Vec<_>>())
            .finish()
    }
}

impl AstBridge {
    /// Creates a bridge running `passes` in order.
    pub fn new(passes: Vec<Box<dyn Pass>>) -> Self {
        Self { passes }
    }

    /// Returns the capabilities of each pass, in order.
    pub fn capabilities(&self) -> impl Iterator<Item = PassCapabilities> + '_ {
        self.passes.iter().map(|p| p.capabilities())
    }

    /// Expands every pending node of `rewrite`.
    ///
    /// `original` indexes the source `rewrite` was produced from; all reported
    /// positions refer to it.
    pub fn run(&self, original: &LineIndex, rewrite: &RewriteOutput) -> Result<BridgeOutput, BridgeError> {
        let tree = parse_go(&rewrite.text)
            .map_err(|err| to_parse_error(err, original, &rewrite.records))?;
        let root = tree.root_node();

        let mut errors = Vec::new();
        let attached = attach(root, rewrite, original, &mut errors);

        let mut facts = Facts::default();
        for pass in &self.passes {
            let caps = pass.capabilities();
            if !caps.can_discover {
                continue;
            }
            tracing::trace!(pass = caps.id, "discover");
            pass.discover(&mut Discovery {
                root,
                text: &rewrite.text,
                pending: &attached,
                original,
                facts: &mut facts,
                errors: &mut errors,
            });
        }
        if !errors.is_empty() {
            return Err(BridgeError::Desugar(errors));
        }

        let cx = TransformContext {
            text: &rewrite.text,
            original,
            facts: &facts,
        };
        let mut edits = Vec::with_capacity(attached.len());
        let mut declarations = Vec::new();
        let mut declared = FxHashSet::default();
        for node in &attached {
            let handled = self.passes.iter().find_map(|pass| {
                let caps = pass.capabilities();
                if !caps.can_transform {
                    return None;
                }
                pass.transform(node, &cx).map(|result| (caps, result))
            });
            match handled {
                Some((caps, Ok(expansion))) => {
                    for declaration in &expansion.declarations {
                        if !caps.can_inject_declarations {
                            tracing::warn!(pass = caps.id, key = declaration.key, "pass cannot inject declarations");
                            continue;
                        }
                        if declared.insert(declaration.key) {
                            declarations.push((declaration.text.clone(), expansion.anchor));
                        }
                    }
                    edits.push(Edit {
                        range: node.pending.stub,
                        text: expansion.text,
                        rule: rule_of(&node.pending.kind).id(),
                        anchor: node.pending.original,
                        corrections: expansion.corrections,
                    });
                }
                Some((_, Err(err))) => errors.push(err),
                None => errors.push(DesugarError::DetachedPlaceholder {
                    construct: node.pending.kind.name(),
                    found: "no expanding pass".to_string(),
                    position: original.position(node.pending.original.start).unwrap_or_default(),
                    span: node.pending.original,
                }),
            }
        }
        if !errors.is_empty() {
            return Err(BridgeError::Desugar(errors));
        }

        let at = injection_point(root);
        for (declaration, anchor) in declarations {
            let text = if at == 0 {
                format!("{declaration}\n\n")
            } else {
                format!("\n\n{declaration}")
            };
            edits.push(Edit {
                range: Span::empty(at as u32),
                corrections: vec![PositionCorrection::anchored(
                    Span::from_usize(0, text.len()),
                    anchor,
                )],
                text,
                rule: INJECTED,
                anchor,
            });
        }

        let spliced = splice(&rewrite.text, &rewrite.records, edits);
        tracing::debug!(
            expansions = attached.len(),
            bytes = spliced.text.len(),
            "structural pass complete"
        );
        Ok(BridgeOutput {
            text: spliced.text,
            records: spliced.records,
            corrections: spliced.corrections,
        })
    }
}

fn rule_of(kind: &PendingKind) -> Rule {
    match kind {
        PendingKind::Lambda(_) => Rule::Lambda,
        PendingKind::Match(_) => Rule::Match,
        PendingKind::SafeNav(_) => Rule::SafeNav,
    }
}

/// Attaches each pending node to the tree node spanning exactly its stub.
fn attach<'t>(
    root: Node<'t>,
    rewrite: &'t RewriteOutput,
    original: &LineIndex,
    errors: &mut Vec<DesugarError>,
) -> Vec<Attached<'t>> {
    let mut attached = Vec::with_capacity(rewrite.pending.len());
    for (index, pending) in rewrite.pending.iter().enumerate() {
        let (start, end) = (pending.stub.start_usize(), pending.stub.end_usize());
        let node = root.descendant_for_byte_range(start, end);
        match node {
            Some(node)
                if node.kind() == pending.kind.stub_kind()
                    && node.start_byte() == start
                    && node.end_byte() == end =>
            {
                attached.push(Attached {
                    index,
                    pending,
                    node,
                });
            }
            other => errors.push(DesugarError::DetachedPlaceholder {
                construct: pending.kind.name(),
                found: other.map_or("nothing", |n| n.kind()).to_string(),
                position: original.position(pending.original.start).unwrap_or_default(),
                span: pending.original,
            }),
        }
    }
    attached
}

/// Returns the offset after the package clause and imports.
fn injection_point(root: Node<'_>) -> usize {
    let mut cursor = root.walk();
    root.named_children(&mut cursor)
        .filter(|n| matches!(n.kind(), "package_clause" | "import_declaration"))
        .map(|n| n.end_byte())
        .max()
        .unwrap_or(0)
}

/// Resolves a generated offset to an original offset through `records`.
pub(crate) fn original_offset(records: &[RewriteRecord], generated: usize) -> Option<ByteOffset> {
    let offset = ByteOffset::from(generated as u32);
    let idx = records.partition_point(|r| r.generated.start <= offset);
    let record = records.get(idx.checked_sub(1)?)?;
    if offset >= record.generated.end && !record.generated.is_empty() {
        return Some(record.original.end);
    }
    Some(record.original_offset(offset))
}

fn to_parse_error(err: SyntaxError, original: &LineIndex, records: &[RewriteRecord]) -> ParseError {
    let start = original_offset(records, err.offset).unwrap_or_default();
    let end = original_offset(records, err.end.saturating_sub(1).max(err.offset))
        .map_or(start, |end| end + ByteOffset::from(1))
        .max(start)
        .min(original.len());
    ParseError {
        position: original.position(start).unwrap_or_default(),
        span: Span::new(start, end.max(start)),
        message: err.message,
    }
}
