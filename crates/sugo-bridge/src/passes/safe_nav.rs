//! Expands safe navigation chains into nil-checking closures.

use crate::pass::{Attached, Expansion, ExpansionWriter, Pass, PassCapabilities, TransformContext};
use crate::DesugarError;
use sugo_rewriter::{Fragment, PendingKind};

/// Expands `a?.b?.c` placeholders.
#[derive(Debug, Default)]
pub struct SafeNavPass;

impl Pass for SafeNavPass {
    fn capabilities(&self) -> PassCapabilities {
        PassCapabilities::new("safe-nav").transform()
    }

    fn transform(
        &self,
        node: &Attached<'_>,
        _cx: &TransformContext<'_>,
    ) -> Option<Result<Expansion, DesugarError>> {
        let PendingKind::SafeNav(nav) = &node.pending.kind else {
            return None;
        };

        let mut w = ExpansionWriter::new();
        w.push("func() any { ");
        for end in 1..nav.segments.len() {
            w.push("if ");
            write_prefix(&mut w, &nav.segments[..end]);
            w.push(" == nil { return nil }; ");
        }
        w.push("return ");
        write_prefix(&mut w, &nav.segments);
        w.push(" }()");

        Some(Ok(w.finish(node.pending.original)))
    }
}

fn write_prefix(w: &mut ExpansionWriter, segments: &[Fragment]) {
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            w.push(".");
        }
        w.carry(segment);
    }
}
