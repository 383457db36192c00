//! Mappings and the source map that holds them.

use crate::vlq::{self, DecodeError};
use crate::Position;
use smol_str::SmolStr;

/// A single mapping from a generated position to an original position.
///
/// Lines and columns are 1-indexed; columns count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mapping {
    /// Line in the generated text.
    pub generated_line: u32,
    /// Column in the generated text.
    pub generated_column: u32,
    /// Line in the original source.
    pub source_line: u32,
    /// Column in the original source.
    pub source_column: u32,
    /// Index into the source map's `sources`.
    pub source_index: u32,
    /// Index into the source map's `names`, if the mapping names an identifier.
    pub name_index: Option<u32>,
}

impl Mapping {
    /// Creates a mapping into source 0 without a name.
    pub fn new(
        generated_line: u32,
        generated_column: u32,
        source_line: u32,
        source_column: u32,
    ) -> Self {
        Self {
            generated_line,
            generated_column,
            source_line,
            source_column,
            source_index: 0,
            name_index: None,
        }
    }

    /// Returns the generated position of this mapping.
    #[inline]
    pub fn generated(&self) -> Position {
        Position::new(self.generated_line, self.generated_column)
    }

    /// Returns the original position of this mapping.
    #[inline]
    pub fn source(&self) -> Position {
        Position::new(self.source_line, self.source_column)
    }
}

/// A source map that tracks position mappings from generated code back to
/// the original source.
///
/// Mappings are ordered by generated line, then generated column, and no two
/// mappings share a generated position. A source map is never mutated after
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    mappings: Vec<Mapping>,
    sources: Vec<String>,
    names: Vec<SmolStr>,
}

impl SourceMap {
    /// Creates a source map from mappings, sorting them by generated position
    /// and dropping duplicates (the first mapping for a position wins).
    pub fn new(mut mappings: Vec<Mapping>, sources: Vec<String>, names: Vec<SmolStr>) -> Self {
        mappings.sort_by_key(|m| m.generated());
        mappings.dedup_by_key(|m| m.generated());
        Self {
            mappings,
            sources,
            names,
        }
    }

    /// Creates a source map by decoding a v3 `mappings` string.
    pub fn decode(
        mappings: &str,
        sources: Vec<String>,
        names: Vec<SmolStr>,
    ) -> Result<Self, DecodeError> {
        Ok(Self::new(vlq::decode_mappings(mappings)?, sources, names))
    }

    /// Returns the number of mappings in this source map.
    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true if this source map has no mappings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Returns all mappings in generated order.
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Returns the mappings on one generated line.
    pub fn line(&self, generated_line: u32) -> &[Mapping] {
        let start = self
            .mappings
            .partition_point(|m| m.generated_line < generated_line);
        let end = self
            .mappings
            .partition_point(|m| m.generated_line <= generated_line);
        &self.mappings[start..end]
    }

    /// Returns the source file names.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Returns the names table.
    pub fn names(&self) -> &[SmolStr] {
        &self.names
    }

    /// Encodes the mappings as a v3 `mappings` string.
    pub fn encode(&self) -> String {
        vlq::encode_mappings(&self.mappings)
    }
}
