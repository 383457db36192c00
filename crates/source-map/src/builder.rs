//! Merges rewrite records and structural corrections into a [`SourceMap`].

use crate::{
    ByteOffset, LineIndex, Mapping, PositionCorrection, RewriteRecord, SourceMap,
};
use indexmap::IndexSet;
use smol_str::SmolStr;
use text_size::TextSize;

/// Builds a [`SourceMap`] for a generated text.
///
/// Every generated character is attributed through the innermost
/// [`PositionCorrection`] covering it (smallest generated span, the later
/// correction on ties), falling back to the [`RewriteRecord`] covering it.
/// Mappings are emitted at the start of every generated line, wherever the
/// attribution changes, and at each token start inside verbatim regions.
#[derive(Debug)]
pub struct SourceMapBuilder<'a> {
    original: &'a LineIndex,
    generated: &'a str,
    records: &'a [RewriteRecord],
    corrections: &'a [PositionCorrection],
    source_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Record(usize),
    Correction(usize),
}

#[derive(Debug)]
struct Attribution<'r> {
    origin: Origin,
    source: ByteOffset,
    verbatim: bool,
    name: Option<&'r SmolStr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Space,
    Word,
    Punct,
}

fn classify(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Space
    } else if ch.is_alphanumeric() || ch == '_' {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

fn starts_token(previous: Option<char>, ch: char) -> bool {
    let class = classify(ch);
    if class == CharClass::Space {
        return false;
    }
    match previous {
        None => true,
        Some(prev) => class == CharClass::Punct || classify(prev) != class,
    }
}

impl<'a> SourceMapBuilder<'a> {
    /// Creates a builder over the original text index, the generated text and
    /// the gapless textual records for it.
    pub fn new(original: &'a LineIndex, generated: &'a str, records: &'a [RewriteRecord]) -> Self {
        Self {
            original,
            generated,
            records,
            corrections: &[],
            source_name: String::new(),
        }
    }

    /// Sets the structural corrections that override record attribution.
    pub fn corrections(mut self, corrections: &'a [PositionCorrection]) -> Self {
        self.corrections = corrections;
        self
    }

    /// Sets the name of the original source file.
    pub fn source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    /// Builds the final source map.
    pub fn build(self) -> SourceMap {
        let mut mappings = Vec::new();
        let mut names: IndexSet<SmolStr> = IndexSet::new();

        if !self.original.is_empty() {
            let mut line = 1u32;
            let mut column = 1u32;
            let mut previous_origin: Option<Origin> = None;
            let mut previous_char: Option<char> = None;

            for (offset, ch) in self.generated.char_indices() {
                if ch == '\n' {
                    line += 1;
                    column = 1;
                    previous_origin = None;
                    previous_char = None;
                    continue;
                }

                if let Some(attr) = self.attribute(TextSize::from(offset as u32)) {
                    let origin_changed = previous_origin != Some(attr.origin);
                    let emit = ch != '\r'
                        && (origin_changed || (attr.verbatim && starts_token(previous_char, ch)));

                    if emit {
                        if let Some(source) = self.source_position(attr.source) {
                            let name_index = if origin_changed {
                                attr.name.map(|name| names.insert_full(name.clone()).0 as u32)
                            } else {
                                None
                            };
                            mappings.push(Mapping {
                                generated_line: line,
                                generated_column: column,
                                source_line: source.line,
                                source_column: source.column,
                                source_index: 0,
                                name_index,
                            });
                        }
                    }
                    previous_origin = Some(attr.origin);
                }

                previous_char = Some(ch);
                column += 1;
            }
        }

        tracing::trace!(
            mappings = mappings.len(),
            names = names.len(),
            "built source map"
        );

        SourceMap::new(mappings, vec![self.source_name], names.into_iter().collect())
    }

    fn attribute(&self, offset: ByteOffset) -> Option<Attribution<'a>> {
        let correction = self
            .corrections
            .iter()
            .enumerate()
            .filter(|(_, c)| c.generated.contains(offset))
            .min_by(|(ia, a), (ib, b)| {
                a.generated
                    .len()
                    .cmp(&b.generated.len())
                    .then(ib.cmp(ia))
            });

        if let Some((idx, correction)) = correction {
            return Some(Attribution {
                origin: Origin::Correction(idx),
                source: correction.original_offset(offset),
                verbatim: correction.verbatim,
                name: None,
            });
        }

        let idx = self
            .records
            .partition_point(|r| r.generated.start <= offset)
            .checked_sub(1)?;
        let record = &self.records[idx];
        if !record.generated.contains(offset) {
            return None;
        }

        Some(Attribution {
            origin: Origin::Record(idx),
            source: record.original_offset(offset),
            verbatim: record.rule.is_verbatim(),
            name: record.name.as_ref(),
        })
    }

    /// Resolves an original offset to a position inside the original text,
    /// clamping offsets at or past the end onto the last character.
    fn source_position(&self, source: ByteOffset) -> Option<crate::Position> {
        let text = self.original.text();
        let mut offset = (u32::from(source) as usize).min(text.len());
        if offset == text.len() {
            offset = text
                .char_indices()
                .next_back()
                .map(|(idx, _)| idx)
                .unwrap_or(0);
        }
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        self.original.position(TextSize::from(offset as u32))
    }
}
