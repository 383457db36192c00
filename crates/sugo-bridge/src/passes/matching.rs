//! Expands `match` statements into Go control flow.
//!
//! Option matches become a nil check, result matches a check of the
//! injected `Result[T]` wrapper's error, and sum type matches a type switch.

use crate::facts::MatchShape;
use crate::pass::{
    Attached, Declaration, Expansion, ExpansionWriter, Pass, PassCapabilities, TransformContext,
};
use crate::DesugarError;
use source_map::Span;
use sugo_rewriter::{Fragment, MatchArm, Pattern, PendingKind, PendingMatch};

/// The generic wrapper result matches destructure.
pub const RESULT_DECLARATION: &str = "type Result[T any] struct {\n\tValue T\n\tErr   error\n}";

/// Expands match placeholders.
#[derive(Debug, Default)]
pub struct MatchPass;

impl Pass for MatchPass {
    fn capabilities(&self) -> PassCapabilities {
        PassCapabilities::new("match").transform().inject()
    }

    fn transform(
        &self,
        node: &Attached<'_>,
        cx: &TransformContext<'_>,
    ) -> Option<Result<Expansion, DesugarError>> {
        let PendingKind::Match(m) = &node.pending.kind else {
            return None;
        };
        let Some(shape) = cx.facts.match_shapes.get(&node.index) else {
            return Some(Err(DesugarError::DetachedPlaceholder {
                construct: "match",
                found: "an unchecked match".to_string(),
                position: cx.position(m.keyword),
                span: m.keyword,
            }));
        };

        let indent = cx.indent_at(node.pending.stub.start_usize());
        let inner = format!("{indent}\t");
        let mut w = ExpansionWriter::new();
        match shape {
            MatchShape::Option => expand_branches(
                &mut w,
                m,
                (indent, &inner),
                "; __m != nil {\n",
                [("Some", "*__m"), ("None", "")],
            ),
            MatchShape::Result => {
                w.declare(Declaration {
                    key: "result",
                    text: RESULT_DECLARATION.to_string(),
                });
                expand_branches(
                    &mut w,
                    m,
                    (indent, &inner),
                    "; __m.Err == nil {\n",
                    [("Ok", "__m.Value"), ("Err", "__m.Err")],
                )
            }
            MatchShape::Sum(_) => expand_switch(&mut w, m, indent, &inner),
            MatchShape::Wildcard => {
                w.push("{\n").push(&inner).push("_ = ").carry(&m.scrutinee).push("\n");
                for arm in &m.arms {
                    w.carry_body(&arm.body, &inner);
                }
                w.push(indent).push("}");
            }
        }
        Some(Ok(w.finish(m.keyword)))
    }
}

fn find<'m>(m: &'m PendingMatch, case: &str) -> Option<&'m MatchArm> {
    m.arms.iter().find(|arm| arm.pattern.case_name() == Some(case))
}

fn wildcard(m: &PendingMatch) -> Option<&MatchArm> {
    m.arms.iter().find(|arm| arm.pattern == Pattern::Wildcard)
}

/// Writes `binding := value` plus a use, so unused bindings still compile.
fn bind(w: &mut ExpansionWriter, inner: &str, binding: &Fragment, value: &str) {
    w.push(inner).carry(binding).push(" := ").push(value).push("\n");
    w.push(inner).push("_ = ").carry(binding).push("\n");
}

/// Writes an arm's body, or the wildcard's when the case has no arm.
fn branch(w: &mut ExpansionWriter, m: &PendingMatch, inner: &str, case: &str, value: &str) {
    match find(m, case) {
        Some(arm) => {
            if let Some(binding) = arm.pattern.binding() {
                bind(w, inner, binding, value);
            }
            w.carry_body(&arm.body, inner);
        }
        None => {
            if let Some(arm) = wildcard(m) {
                w.carry_body(&arm.body, inner);
            }
        }
    }
}

/// Writes an if/else over the two cases, each given with the value its
/// binding takes.
fn expand_branches(
    w: &mut ExpansionWriter,
    m: &PendingMatch,
    (indent, inner): (&str, &str),
    condition: &str,
    [(then_case, then_value), (else_case, else_value)]: [(&str, &str); 2],
) {
    w.push("if __m := ").carry(&m.scrutinee).push(condition);
    branch(w, m, inner, then_case, then_value);
    w.push(indent).push("} else {\n");
    branch(w, m, inner, else_case, else_value);
    w.push(indent).push("}");
}

fn expand_switch(w: &mut ExpansionWriter, m: &PendingMatch, indent: &str, inner: &str) {
    let binds = m.arms.iter().any(|arm| arm.pattern.binding().is_some());
    w.push("switch ");
    if binds {
        w.push("__m := ");
    }
    w.carry(&m.scrutinee).push(".(type) {\n");

    let mut seen: Vec<&str> = Vec::new();
    for arm in &m.arms {
        let Pattern::Variant { name, binding } = &arm.pattern else {
            continue;
        };
        if seen.contains(&name.as_str()) {
            continue;
        }
        seen.push(name.as_str());
        let name_span = Span::new(
            arm.pattern_span.start,
            arm.pattern_span.start + source_map::ByteOffset::from(name.len() as u32),
        );
        w.push(indent).push("case ").carry(&Fragment {
            text: name.to_string(),
            span: name_span,
        });
        w.push(":\n");
        if let Some(binding) = binding {
            bind(w, inner, binding, "__m");
        }
        w.carry_body(&arm.body, inner);
    }
    if let Some(arm) = wildcard(m) {
        w.push(indent).push("default:\n");
        w.carry_body(&arm.body, inner);
    }
    w.push(indent).push("}");
}
