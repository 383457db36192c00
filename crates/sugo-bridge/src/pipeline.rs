//! The transpile pipeline: textual rewrite, structural pass, source map.

use crate::bridge::{AstBridge, BridgeError, BridgeOutput};
use crate::parse::parse_go;
use crate::{DesugarError, ParseError};
use source_map::{
    LineIndex, PositionCorrection, PositionTranslator, RewriteRecord, SourceMap,
    SourceMapBuilder, SourceMapJson, Span,
};
use std::sync::Arc;
use sugo_rewriter::{RewriteEngine, RewriteError};
use thiserror::Error;

/// A failed transpilation. No output is produced for the file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranspileError {
    /// A textual rule failed.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    /// The generated Go does not parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Structural preconditions failed.
    #[error("{} structural error(s)", .0.len())]
    Desugar(Vec<DesugarError>),
}

impl From<BridgeError> for TranspileError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Parse(err) => TranspileError::Parse(err),
            BridgeError::Desugar(errors) => TranspileError::Desugar(errors),
        }
    }
}

/// A transpiled file.
#[derive(Debug, Clone)]
pub struct Transpiled {
    /// The generated Go.
    pub generated: String,
    /// Gapless records over `generated`.
    pub records: Vec<RewriteRecord>,
    /// Structural corrections over `generated`.
    pub corrections: Vec<PositionCorrection>,
    /// The source map from `generated` back to the original.
    pub source_map: Arc<SourceMap>,
}

impl Transpiled {
    /// Creates a translator over this file's source map.
    pub fn translator(&self) -> PositionTranslator {
        PositionTranslator::new(Arc::clone(&self.source_map))
    }

    /// Returns the v3 JSON form of the source map.
    pub fn source_map_json(&self, file: impl Into<String>, original: Option<&str>) -> SourceMapJson {
        self.source_map.to_json(file, original)
    }
}

/// Transpiles sugo source to Go.
#[derive(Debug, Default)]
pub struct Transpiler {
    engine: RewriteEngine,
    bridge: AstBridge,
}

impl Transpiler {
    /// Creates a transpiler from a rule engine and a bridge.
    pub fn new(engine: RewriteEngine, bridge: AstBridge) -> Self {
        Self { engine, bridge }
    }

    /// Transpiles `source`, naming it `source_name` in the source map.
    pub fn transpile(&self, source: &str, source_name: &str) -> Result<Transpiled, TranspileError> {
        let original = LineIndex::new(source);
        let rewrite = self.engine.rewrite(source)?;
        let BridgeOutput {
            text,
            records,
            corrections,
        } = self.bridge.run(&original, &rewrite)?;

        let map = SourceMapBuilder::new(&original, &text, &records)
            .corrections(&corrections)
            .source_name(source_name)
            .build();
        let map = Arc::new(map);

        // Carried bodies enter the text only now, so check the final output.
        if let Err(err) = parse_go(&text) {
            let generated = LineIndex::new(&text);
            let translator = PositionTranslator::new(Arc::clone(&map));
            let position = generated
                .position(source_map::ByteOffset::from(err.offset as u32))
                .and_then(|p| translator.forward_or_nearest(p).ok())
                .map(|resolved| resolved.position)
                .unwrap_or_default();
            let offset = original.offset(position).unwrap_or_default();
            return Err(TranspileError::Parse(ParseError {
                position,
                span: Span::empty(offset),
                message: err.message,
            }));
        }

        tracing::debug!(
            source = source_name,
            mappings = map.len(),
            "transpiled"
        );
        Ok(Transpiled {
            generated: text,
            records,
            corrections,
            source_map: map,
        })
    }
}

/// Transpiles `source` with every rule and pass enabled.
pub fn transpile(source: &str, source_name: &str) -> Result<Transpiled, TranspileError> {
    Transpiler::default().transpile(source, source_name)
}
