//! Source position tracking and mapping for sugo.
//!
//! This crate carries positions through the two rewrite stages of the
//! transpiler and answers coordinate queries in both directions:
//! - [`RecordingWriter`] records provenance while textual rules emit output
//! - [`SourceMapBuilder`] merges rewrite records with structural corrections
//! - [`SourceMap`] holds the resulting mappings and encodes them (v3 / VLQ)
//! - [`PositionTranslator`] answers forward and reverse lookups
//!
//! # Example
//!
//! ```
//! use source_map::{LineIndex, Position, PositionTranslator, RecordingWriter, RuleId, Span, SourceMapBuilder};
//! use std::sync::Arc;
//!
//! let original = "let x = 1\n";
//! let mut writer = RecordingWriter::new();
//! writer.synthesize(RuleId::new("let"), Span::new(0u32, 3u32), "");
//! writer.copy(Span::new(4u32, 5u32), "x");
//! writer.synthesize(RuleId::new("let"), Span::new(6u32, 7u32), " :=");
//! writer.copy(Span::new(7u32, 10u32), " 1\n");
//! let (generated, records) = writer.finish();
//!
//! let index = LineIndex::new(original);
//! let map = SourceMapBuilder::new(&index, &generated, &records).build();
//! let translator = PositionTranslator::new(Arc::new(map));
//! assert_eq!(translator.forward(Position::new(1, 1)).unwrap(), Position::new(1, 5));
//! ```

mod builder;
mod json;
mod line_index;
mod mapping;
mod record;
mod span;
mod translator;
pub mod vlq;

pub use builder::SourceMapBuilder;
pub use json::{SourceMapJson, SourceMapJsonError};
pub use line_index::LineIndex;
pub use mapping::{Mapping, SourceMap};
pub use record::{PositionCorrection, RecordingWriter, RewriteRecord, RuleId};
pub use span::{ByteOffset, Position, Span};
pub use translator::{MappingError, PositionTranslator, Resolved};
