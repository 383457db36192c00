//! Provenance records produced by the two rewrite stages.

use crate::{ByteOffset, Span};
use smol_str::SmolStr;
use std::fmt;
use text_size::TextSize;

/// Identifies the rule that produced a piece of generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(&'static str);

impl RuleId {
    /// Unmodified text copied from the original source.
    pub const COPY: RuleId = RuleId("copy");
    /// An original token carried into synthesized text.
    pub const CARRY: RuleId = RuleId("carry");

    /// Creates a rule id.
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    /// Returns the rule id as a string.
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Returns true if text under this rule maps character-for-character.
    pub fn is_verbatim(&self) -> bool {
        *self == Self::COPY || *self == Self::CARRY
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Textual-pass provenance for one region of generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRecord {
    /// The span in the original source.
    pub original: Span,
    /// The span in the generated output.
    pub generated: Span,
    /// The rule that produced the generated text.
    pub rule: RuleId,
    /// The identifier carried by this record, if any.
    pub name: Option<SmolStr>,
}

impl RewriteRecord {
    /// Resolves a generated offset inside this record to an original offset.
    pub fn original_offset(&self, generated: ByteOffset) -> ByteOffset {
        if !self.rule.is_verbatim() {
            return self.original.start;
        }
        let delta = generated - self.generated.start;
        let resolved = self.original.start + delta;
        if self.original.is_empty() || resolved < self.original.end {
            resolved
        } else {
            self.original.end - TextSize::from(1)
        }
    }
}

/// Structural-pass override of a textual attribution.
///
/// An anchored correction attributes its whole generated span to the start
/// of the conceptual span; a verbatim correction maps character-for-character
/// and is used for user code carried through a structural expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionCorrection {
    /// The span in the generated output.
    pub generated: Span,
    /// The user-meaningful span in the original source.
    pub conceptual: Span,
    /// Whether positions map character-for-character.
    pub verbatim: bool,
}

impl PositionCorrection {
    /// Creates an anchored correction.
    pub fn anchored(generated: Span, conceptual: Span) -> Self {
        Self {
            generated,
            conceptual,
            verbatim: false,
        }
    }

    /// Creates a verbatim correction.
    pub fn verbatim(generated: Span, conceptual: Span) -> Self {
        Self {
            generated,
            conceptual,
            verbatim: true,
        }
    }

    /// Resolves a generated offset inside this correction to an original offset.
    pub fn original_offset(&self, generated: ByteOffset) -> ByteOffset {
        if !self.verbatim {
            return self.conceptual.start;
        }
        let resolved = self.conceptual.start + (generated - self.generated.start);
        if self.conceptual.is_empty() || resolved < self.conceptual.end {
            resolved
        } else {
            self.conceptual.end - TextSize::from(1)
        }
    }
}

/// Accumulates generated text together with a gapless record list.
///
/// Every byte appended through the writer is covered by exactly one record.
/// Adjacent appends with the same provenance are merged.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    text: String,
    records: Vec<RewriteRecord>,
}

impl RecordingWriter {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current generated offset.
    #[inline]
    pub fn generated_offset(&self) -> ByteOffset {
        TextSize::from(self.text.len() as u32)
    }

    /// Returns the text written so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Appends verbatim source text, creating a 1:1 record.
    pub fn copy(&mut self, original: Span, text: &str) {
        self.push(RuleId::COPY, original, text, None);
    }

    /// Appends an original token inside synthesized output.
    pub fn carry(&mut self, original: Span, text: &str, name: Option<SmolStr>) {
        self.push(RuleId::CARRY, original, text, name);
    }

    /// Appends synthesized text attributed to `anchor`.
    pub fn synthesize(&mut self, rule: RuleId, anchor: Span, text: &str) {
        self.push(rule, anchor, text, None);
    }

    /// Finishes writing, returning the generated text and its records.
    pub fn finish(self) -> (String, Vec<RewriteRecord>) {
        (self.text, self.records)
    }

    fn push(&mut self, rule: RuleId, original: Span, text: &str, name: Option<SmolStr>) {
        if text.is_empty() {
            return;
        }
        let start = self.generated_offset();
        self.text.push_str(text);
        let end = self.generated_offset();

        if name.is_none() {
            if let Some(last) = self.records.last_mut() {
                let continues = last.rule == rule
                    && last.name.is_none()
                    && last.generated.end == start
                    && if rule.is_verbatim() {
                        last.original.end == original.start
                    } else {
                        last.original == original
                    };
                if continues {
                    last.generated.end = end;
                    if rule.is_verbatim() {
                        last.original.end = original.end;
                    }
                    return;
                }
            }
        }

        self.records.push(RewriteRecord {
            original,
            generated: Span::new(start, end),
            rule,
            name,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_merges_adjacent_copies() {
        let mut writer = RecordingWriter::new();
        writer.copy(Span::new(0u32, 3u32), "abc");
        writer.copy(Span::new(3u32, 5u32), "de");
        let (text, records) = writer.finish();

        assert_eq!(text, "abcde");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].generated, Span::new(0u32, 5u32));
        assert_eq!(records[0].original, Span::new(0u32, 5u32));
    }

    #[test]
    fn test_writer_records_are_gapless() {
        let rule = RuleId::new("test");
        let mut writer = RecordingWriter::new();
        writer.copy(Span::new(0u32, 2u32), "a ");
        writer.synthesize(rule, Span::new(2u32, 3u32), "xyz");
        writer.synthesize(rule, Span::new(2u32, 3u32), "\n");
        writer.carry(Span::new(4u32, 5u32), "b", Some(SmolStr::new("b")));
        writer.synthesize(rule, Span::new(9u32, 10u32), "");
        let (text, records) = writer.finish();

        assert_eq!(text, "a xyz\nb");
        assert_eq!(records.len(), 3);
        let mut expected_start = TextSize::from(0);
        for record in &records {
            assert_eq!(record.generated.start, expected_start);
            expected_start = record.generated.end;
        }
        assert_eq!(u32::from(expected_start) as usize, text.len());
    }

    #[test]
    fn test_record_original_offset() {
        let anchored = RewriteRecord {
            original: Span::new(10u32, 11u32),
            generated: Span::new(0u32, 20u32),
            rule: RuleId::new("test"),
            name: None,
        };
        assert_eq!(anchored.original_offset(TextSize::from(15)), TextSize::from(10));

        let copied = RewriteRecord {
            original: Span::new(10u32, 14u32),
            generated: Span::new(0u32, 4u32),
            rule: RuleId::COPY,
            name: None,
        };
        assert_eq!(copied.original_offset(TextSize::from(3)), TextSize::from(13));
    }

    #[test]
    fn test_correction_original_offset() {
        let verbatim = PositionCorrection::verbatim(Span::new(40u32, 45u32), Span::new(5u32, 10u32));
        assert_eq!(verbatim.original_offset(TextSize::from(42)), TextSize::from(7));

        let anchored = PositionCorrection::anchored(Span::new(40u32, 90u32), Span::new(5u32, 10u32));
        assert_eq!(anchored.original_offset(TextSize::from(80)), TextSize::from(5));
    }
}
