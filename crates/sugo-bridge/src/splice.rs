//! Splices expansions into the generated text and rebases provenance.

use source_map::{ByteOffset, PositionCorrection, RewriteRecord, RuleId, Span};

/// A replacement of a generated range.
#[derive(Debug, Clone)]
pub(crate) struct Edit {
    /// The replaced range in the pre-splice text; empty for insertions.
    pub range: Span,
    pub text: String,
    pub rule: RuleId,
    /// The original span the new text is attributed to.
    pub anchor: Span,
    /// Corrections relative to the start of `text`.
    pub corrections: Vec<PositionCorrection>,
}

impl Edit {
    fn delta(&self) -> i64 {
        self.text.len() as i64 - u32::from(self.range.len()) as i64
    }
}

/// The spliced text with rebased records and absolute corrections.
#[derive(Debug)]
pub(crate) struct Spliced {
    pub text: String,
    pub records: Vec<RewriteRecord>,
    pub corrections: Vec<PositionCorrection>,
}

/// Applies `edits` to `text`.
///
/// A record equal to a replaced range is replaced by a record for the new
/// text; every other record shifts by the edits before it. At an insertion
/// point, records ending there stay before the inserted text and records
/// starting there move after it, so the records stay gapless.
pub(crate) fn splice(text: &str, records: &[RewriteRecord], mut edits: Vec<Edit>) -> Spliced {
    edits.sort_by_key(|e| (e.range.start, e.range.end));

    let mut out = String::with_capacity(text.len());
    let mut placed = Vec::with_capacity(edits.len());
    let mut last = 0usize;
    for edit in &edits {
        out.push_str(&text[last..edit.range.start_usize()]);
        let start = out.len();
        out.push_str(&edit.text);
        placed.push(Span::from_usize(start, out.len()));
        last = edit.range.end_usize();
    }
    out.push_str(&text[last..]);

    let map = |offset: usize, is_end: bool| -> usize {
        let mut delta = 0i64;
        for edit in &edits {
            let (start, end) = (edit.range.start_usize(), edit.range.end_usize());
            let before = end < offset || (end == offset && !(start == end && is_end));
            if before {
                delta += edit.delta();
            }
        }
        (offset as i64 + delta) as usize
    };

    let insertions: Vec<usize> = edits
        .iter()
        .filter(|e| e.range.is_empty())
        .map(|e| e.range.start_usize())
        .collect();
    let records = split_records(records, &insertions);

    let mut new_records = Vec::with_capacity(records.len() + edits.len());
    for record in &records {
        let replaced = edits
            .iter()
            .any(|e| !e.range.is_empty() && e.range == record.generated);
        if replaced {
            continue;
        }
        let start = map(record.generated.start_usize(), false);
        let end = map(record.generated.end_usize(), true);
        new_records.push(RewriteRecord {
            generated: Span::from_usize(start, end),
            ..record.clone()
        });
    }

    let mut corrections = Vec::new();
    for (edit, span) in edits.iter().zip(&placed) {
        new_records.push(RewriteRecord {
            original: edit.anchor,
            generated: *span,
            rule: edit.rule,
            name: None,
        });
        let shift = u32::from(span.start) as i64;
        corrections.extend(edit.corrections.iter().map(|c| PositionCorrection {
            generated: c.generated.shifted(shift),
            ..c.clone()
        }));
    }
    new_records.retain(|r| !r.generated.is_empty());
    new_records.sort_by_key(|r| r.generated.start);

    Spliced {
        text: out,
        records: new_records,
        corrections,
    }
}

/// Splits records that strictly contain an insertion point.
fn split_records(records: &[RewriteRecord], points: &[usize]) -> Vec<RewriteRecord> {
    let mut out = Vec::with_capacity(records.len() + points.len());
    for record in records {
        let mut rest = record.clone();
        for &point in points {
            let at = ByteOffset::from(point as u32);
            if at <= rest.generated.start || at >= rest.generated.end {
                continue;
            }
            let mut left = rest.clone();
            left.generated.end = at;
            rest.generated.start = at;
            if rest.rule.is_verbatim() {
                let split = left.original.start + (at - left.generated.start);
                left.original.end = split;
                rest.original.start = split;
            }
            out.push(left);
        }
        out.push(rest);
    }
    out
}
