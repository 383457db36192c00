//! Conversion of transpiler errors into diagnostics.

use crate::{Diagnostic, DiagnosticCode};
use source_map::{LineIndex, Position, Span};
use sugo_bridge::{DesugarError, ParseError, TranspileError};
use sugo_rewriter::RewriteError;

fn end_of(index: &LineIndex, span: Span) -> Option<Position> {
    (!span.is_empty()).then(|| index.position(span.end)).flatten()
}

/// Returns a placeholder arm for a missing case.
fn arm_template(case: &str) -> String {
    match case {
        "Some" => "Some(v) => ...".to_string(),
        "Ok" => "Ok(v) => ...".to_string(),
        "Err" => "Err(e) => ...".to_string(),
        other => format!("{other} => ..."),
    }
}

impl Diagnostic {
    /// Creates a diagnostic for a failed textual rule.
    pub fn from_rewrite_error(file: &str, original: &LineIndex, err: &RewriteError) -> Self {
        let diagnostic = Diagnostic::new(
            DiagnosticCode::RewriteError,
            format!("{}: {}", err.rule, err.reason),
            file,
            err.position,
        );
        match end_of(original, err.span) {
            Some(end) => diagnostic.with_end(end),
            None => diagnostic,
        }
    }

    /// Creates a diagnostic for generated Go that does not parse.
    pub fn from_parse_error(file: &str, original: &LineIndex, err: &ParseError) -> Self {
        let diagnostic = Diagnostic::new(
            DiagnosticCode::ParseError,
            format!("generated Go does not parse: {}", err.message),
            file,
            err.position,
        );
        match end_of(original, err.span) {
            Some(end) => diagnostic.with_end(end),
            None => diagnostic,
        }
    }

    /// Creates a diagnostic for a failed structural precondition.
    pub fn from_desugar_error(file: &str, original: &LineIndex, err: &DesugarError) -> Self {
        let (code, message) = match err {
            DesugarError::NonExhaustiveMatch { scrutinee_type, .. } => (
                DiagnosticCode::NonExhaustiveMatch,
                format!("match over {scrutinee_type} is not exhaustive"),
            ),
            DesugarError::UnknownScrutinee { .. } => (DiagnosticCode::UnknownScrutinee, err.to_string()),
            DesugarError::MixedPatterns { .. } => (DiagnosticCode::MixedPatterns, err.to_string()),
            DesugarError::DetachedPlaceholder { .. } => {
                (DiagnosticCode::DetachedPlaceholder, err.to_string())
            }
            DesugarError::LambdaInference { .. } => (DiagnosticCode::LambdaInference, err.to_string()),
        };
        let mut diagnostic = Diagnostic::new(code, message, file, err.position());
        if let Some(end) = end_of(original, err.span()) {
            diagnostic = diagnostic.with_end(end);
        }

        match err {
            DesugarError::NonExhaustiveMatch { missing, .. } => {
                let suggestion = missing
                    .iter()
                    .map(|case| arm_template(case))
                    .collect::<Vec<_>>()
                    .join("\n");
                let note = if missing.len() == 1 { "missing arm" } else { "missing arms" };
                diagnostic
                    .with_annotation(note)
                    .with_suggestion(suggestion)
                    .with_missing_cases(missing.clone())
            }
            DesugarError::UnknownScrutinee { .. } => diagnostic.with_annotation("unknown variant"),
            DesugarError::LambdaInference { .. } => diagnostic
                .with_annotation("add parameter types")
                .with_suggestion("|x: T| ..."),
            _ => diagnostic,
        }
    }

    /// Creates the diagnostics for a failed transpilation.
    pub fn from_transpile_error(file: &str, original: &LineIndex, err: &TranspileError) -> Vec<Self> {
        match err {
            TranspileError::Rewrite(err) => vec![Self::from_rewrite_error(file, original, err)],
            TranspileError::Parse(err) => vec![Self::from_parse_error(file, original, err)],
            TranspileError::Desugar(errors) => errors
                .iter()
                .map(|err| Self::from_desugar_error(file, original, err))
                .collect(),
        }
    }
}
