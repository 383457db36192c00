//! Forward and reverse coordinate lookup against a built [`SourceMap`].

use crate::{Mapping, Position, SourceMap};
use std::sync::Arc;
use thiserror::Error;

/// A lookup that found no mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The query precedes the first mapping.
    #[error("no mapping for {line}:{column}")]
    NoMapping {
        /// 1-indexed line of the query.
        line: u32,
        /// 1-indexed column of the query.
        column: u32,
    },
    /// The source map has no mappings at all.
    #[error("source map is empty")]
    EmptyMap,
}

/// A position resolved by a best-effort lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// The translated position.
    pub position: Position,
    /// True if the lookup failed and the nearest mapping was used instead.
    pub approximate: bool,
}

/// Read-only forward/reverse lookup over an immutable source map.
///
/// The reverse index is built once on construction. A translator is `Sync`
/// and can be shared freely between concurrent requests.
#[derive(Debug, Clone)]
pub struct PositionTranslator {
    map: Arc<SourceMap>,
    /// Indices into `map.mappings()`, sorted by source then generated position.
    by_source: Vec<u32>,
}

impl PositionTranslator {
    /// Creates a translator, building the reverse index.
    pub fn new(map: Arc<SourceMap>) -> Self {
        let mut by_source: Vec<u32> = (0..map.len() as u32).collect();
        let mappings = map.mappings();
        by_source.sort_by_key(|&i| {
            let m = &mappings[i as usize];
            (m.source(), m.generated())
        });
        Self { map, by_source }
    }

    /// Returns the underlying source map.
    pub fn source_map(&self) -> &Arc<SourceMap> {
        &self.map
    }

    /// Maps a generated position to its original position.
    ///
    /// Uses the greatest mapping at or before the query, so a column past the
    /// last mapping of a line resolves to that mapping, and a line without
    /// mappings resolves to the nearest earlier line that has one.
    pub fn forward(&self, generated: Position) -> Result<Position, MappingError> {
        let mappings = self.map.mappings();
        let idx = mappings.partition_point(|m| m.generated() <= generated);
        match idx.checked_sub(1) {
            Some(idx) => Ok(mappings[idx].source()),
            None => Err(self.miss(generated)),
        }
    }

    /// Maps an original position to the generated position the underlying
    /// server should see.
    ///
    /// Uses the greatest mapping at or before the query in source order,
    /// preferring the earliest generated position among equal candidates.
    /// When the candidate lies on the queried source line the column offset is
    /// carried over, bounded by the next mapping on the generated line.
    pub fn reverse(&self, original: Position) -> Result<Position, MappingError> {
        let mappings = self.map.mappings();
        let source_of = |i: &u32| mappings[*i as usize].source();

        let upper = self.by_source.partition_point(|i| source_of(i) <= original);
        let Some(last) = upper.checked_sub(1) else {
            return Err(self.miss(original));
        };
        let target = source_of(&self.by_source[last]);
        let first = self.by_source.partition_point(|i| source_of(i) < target);
        let entry = mappings[self.by_source[first] as usize];

        if entry.source_line != original.line {
            return Ok(entry.generated());
        }

        let delta = original.column - entry.source_column;
        let limit = self
            .next_on_line(&entry)
            .map(|next| next.generated_column - entry.generated_column - 1)
            .unwrap_or(u32::MAX);
        Ok(Position::new(
            entry.generated_line,
            entry.generated_column + delta.min(limit),
        ))
    }

    /// Forward lookup that recovers from a miss with the first mapping.
    pub fn forward_or_nearest(&self, generated: Position) -> Result<Resolved, MappingError> {
        match self.forward(generated) {
            Ok(position) => Ok(Resolved {
                position,
                approximate: false,
            }),
            Err(err) => {
                let first = self.map.mappings().first().ok_or(MappingError::EmptyMap)?;
                tracing::debug!(%generated, error = %err, "forward lookup fell back to first mapping");
                Ok(Resolved {
                    position: first.source(),
                    approximate: true,
                })
            }
        }
    }

    /// Reverse lookup that recovers from a miss with the earliest source mapping.
    pub fn reverse_or_nearest(&self, original: Position) -> Result<Resolved, MappingError> {
        match self.reverse(original) {
            Ok(position) => Ok(Resolved {
                position,
                approximate: false,
            }),
            Err(err) => {
                let first = self.by_source.first().ok_or(MappingError::EmptyMap)?;
                tracing::debug!(%original, error = %err, "reverse lookup fell back to first mapping");
                Ok(Resolved {
                    position: self.map.mappings()[*first as usize].generated(),
                    approximate: true,
                })
            }
        }
    }

    fn next_on_line(&self, entry: &Mapping) -> Option<&Mapping> {
        self.map
            .line(entry.generated_line)
            .iter()
            .find(|m| m.generated_column > entry.generated_column)
    }

    fn miss(&self, query: Position) -> MappingError {
        if self.map.is_empty() {
            MappingError::EmptyMap
        } else {
            MappingError::NoMapping {
                line: query.line,
                column: query.column,
            }
        }
    }
}
