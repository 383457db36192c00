//! Conversion between sugo diagnostics and `lsp_types`.

use lsp_types::{
    Diagnostic as LspDiagnostic, DiagnosticSeverity as LspSeverity, NumberOrString,
    Position as LspPosition, Range as LspRange,
};
use source_map::{LineIndex, Position};
use sugo_diagnostics::{Diagnostic, Severity};

/// Converts a 1-indexed character position into an LSP position.
pub fn position_to_lsp(index: &LineIndex, position: Position) -> LspPosition {
    LspPosition {
        line: position.line.saturating_sub(1),
        character: index.column_to_utf16(position.line, position.column),
    }
}

/// Converts a sugo severity into an LSP severity.
pub fn severity_to_lsp(severity: Severity) -> LspSeverity {
    match severity {
        Severity::Error => LspSeverity::ERROR,
        Severity::Warning => LspSeverity::WARNING,
        Severity::Information => LspSeverity::INFORMATION,
        Severity::Hint => LspSeverity::HINT,
    }
}

/// Converts a diagnostic in original coordinates into an LSP diagnostic.
///
/// A diagnostic without an end covers one character.
pub fn diagnostic_to_lsp(index: &LineIndex, diag: &Diagnostic) -> LspDiagnostic {
    let start = position_to_lsp(index, diag.start);
    let end = match diag.end {
        Some(end) => position_to_lsp(index, end),
        None => position_to_lsp(index, Position::new(diag.start.line, diag.start.column + 1)),
    };

    let mut message = diag.message.clone();
    if let Some(suggestion) = &diag.suggestion {
        message.push_str("\nsuggestion:\n");
        message.push_str(suggestion);
    }
    if !diag.missing_cases.is_empty() {
        message.push_str("\nmissing cases: ");
        message.push_str(&diag.missing_cases.join(", "));
    }

    LspDiagnostic {
        range: LspRange { start, end },
        severity: Some(severity_to_lsp(diag.severity)),
        code: Some(NumberOrString::String(diag.code.as_str().to_string())),
        source: Some(diag.code.source().to_string()),
        message,
        ..Default::default()
    }
}
