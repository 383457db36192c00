//! Rendering diagnostics at their original-source location.

use crate::{CoordinateSpace, Diagnostic, LineCache};
use serde::Serialize;
use source_map::{LineIndex, Position, PositionTranslator};
use std::fmt::Write;
use std::sync::Arc;

/// Lines of context shown before and after the diagnostic line.
const CONTEXT_LINES: u32 = 2;

/// A diagnostic in the JSON output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonDiagnostic {
    /// The severity (`Error`, `Warning`, ...).
    #[serde(rename = "type")]
    pub diagnostic_type: String,
    /// The file path.
    pub filename: String,
    /// The start position.
    pub start: JsonPosition,
    /// The end position.
    pub end: JsonPosition,
    /// The message.
    pub message: String,
    /// The diagnostic code.
    pub code: String,
    /// The producing tool (`sugo`, `gopls`).
    pub source: String,
    /// Missing match cases, if any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_cases: Vec<String>,
}

/// A position in the JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JsonPosition {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
}

impl From<Position> for JsonPosition {
    fn from(position: Position) -> Self {
        Self {
            line: position.line,
            column: position.column,
        }
    }
}

/// Renders diagnostics with source snippets from a [`LineCache`].
#[derive(Debug, Clone, Default)]
pub struct DiagnosticPresenter {
    cache: Arc<LineCache>,
}

impl DiagnosticPresenter {
    /// Creates a presenter reading file contents from `cache`.
    pub fn new(cache: Arc<LineCache>) -> Self {
        Self { cache }
    }

    /// Returns the file cache.
    pub fn cache(&self) -> &Arc<LineCache> {
        &self.cache
    }

    /// Maps a generated-coordinate diagnostic to original coordinates.
    ///
    /// Diagnostics already in original coordinates are returned unchanged.
    /// A range whose mapped end does not follow its start on the same line
    /// collapses to its start.
    pub fn resolve(&self, diagnostic: &Diagnostic, translator: &PositionTranslator) -> Diagnostic {
        if diagnostic.space == CoordinateSpace::Original {
            return diagnostic.clone();
        }
        let mut resolved = diagnostic.clone();
        resolved.space = CoordinateSpace::Original;
        match translator.forward_or_nearest(diagnostic.start) {
            Ok(start) => resolved.start = start.position,
            Err(err) => {
                tracing::debug!(error = %err, file = %diagnostic.file, "diagnostic has no mapping");
                resolved.start = Position::new(1, 1);
            }
        }
        resolved.end = diagnostic
            .end
            .and_then(|end| translator.forward_or_nearest(end).ok())
            .map(|end| end.position)
            .filter(|end| end.line == resolved.start.line && end.column > resolved.start.column);
        resolved
    }

    /// Renders a diagnostic with a source snippet.
    ///
    /// `translator` maps generated-coordinate diagnostics; it is ignored for
    /// diagnostics already in original coordinates.
    pub fn render(&self, diagnostic: &Diagnostic, translator: Option<&PositionTranslator>) -> String {
        let diagnostic = match (diagnostic.space, translator) {
            (CoordinateSpace::Generated, Some(translator)) => self.resolve(diagnostic, translator),
            _ => diagnostic.clone(),
        };

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}[{}]: {}",
            diagnostic.severity, diagnostic.code, diagnostic.message
        );

        let Some(index) = self.cache.get(&diagnostic.file) else {
            let _ = writeln!(out, " --> {}:{}", diagnostic.file, diagnostic.start);
            return out;
        };

        let line = diagnostic.start.line;
        let first = line.saturating_sub(CONTEXT_LINES).max(1);
        let last = (line + CONTEXT_LINES).min(last_line(&index)).max(line);
        let width = last.to_string().len();
        let pad = " ".repeat(width);

        let _ = writeln!(out, "{pad}--> {}:{}", diagnostic.file, diagnostic.start);
        let _ = writeln!(out, "{pad} |");
        for number in first..=last {
            let text = index.line_text(number).unwrap_or_default();
            if text.is_empty() {
                let _ = writeln!(out, "{number:>width$} |");
            } else {
                let _ = writeln!(out, "{number:>width$} | {text}");
            }
            if number == line {
                let _ = writeln!(out, "{pad} | {}", caret_row(text, &diagnostic));
            }
        }

        if diagnostic.suggestion.is_some() || !diagnostic.missing_cases.is_empty() {
            let _ = writeln!(out, "{pad} |");
        }
        if let Some(suggestion) = &diagnostic.suggestion {
            let _ = writeln!(out, "{pad} = suggestion:");
            for suggested in suggestion.lines() {
                let _ = writeln!(out, "{pad} |     {suggested}");
            }
        }
        if !diagnostic.missing_cases.is_empty() {
            let _ = writeln!(
                out,
                "{pad} = missing cases: {}",
                diagnostic.missing_cases.join(", ")
            );
        }
        out
    }

    /// Renders a diagnostic as a single machine-readable line.
    pub fn render_machine(&self, diagnostic: &Diagnostic) -> String {
        let end = diagnostic.end.unwrap_or(diagnostic.start);
        format!(
            "{} {}:{}:{}:{}:{} {} ({})",
            diagnostic.severity.as_str().to_uppercase(),
            diagnostic.file,
            diagnostic.start.line,
            diagnostic.start.column,
            end.line,
            end.column,
            diagnostic.message,
            diagnostic.code
        )
    }

    /// Converts diagnostics into the JSON output format.
    pub fn to_json(&self, diagnostics: &[Diagnostic]) -> Vec<JsonDiagnostic> {
        diagnostics
            .iter()
            .map(|diag| JsonDiagnostic {
                diagnostic_type: match diag.severity {
                    crate::Severity::Error => "Error",
                    crate::Severity::Warning => "Warning",
                    crate::Severity::Information => "Information",
                    crate::Severity::Hint => "Hint",
                }
                .to_string(),
                filename: diag.file.clone(),
                start: diag.start.into(),
                end: diag.end.unwrap_or(diag.start).into(),
                message: diag.message.clone(),
                code: diag.code.to_string(),
                source: diag.code.source().to_string(),
                missing_cases: diag.missing_cases.clone(),
            })
            .collect()
    }
}

/// Returns the last line worth showing, skipping the empty line after a
/// trailing newline.
fn last_line(index: &LineIndex) -> u32 {
    let count = index.line_count() as u32;
    if count > 1 && index.text().ends_with('\n') {
        count - 1
    } else {
        count
    }
}

/// Builds the caret row: the line's tabs are kept so carets line up.
fn caret_row(text: &str, diagnostic: &Diagnostic) -> String {
    let column = diagnostic.start.column.max(1) as usize;
    let line_len = text.chars().count();

    let mut row: String = text
        .chars()
        .take(column - 1)
        .map(|ch| if ch == '\t' { '\t' } else { ' ' })
        .collect();
    let prefix_len = row.chars().count();
    row.extend(std::iter::repeat(' ').take((column - 1).saturating_sub(prefix_len)));

    let requested = diagnostic
        .end
        .filter(|end| end.line == diagnostic.start.line)
        .map_or(1, |end| end.column.saturating_sub(diagnostic.start.column) as usize);
    let available = line_len.saturating_sub(column - 1);
    let carets = requested.min(available).max(1);
    row.extend(std::iter::repeat('^').take(carets));

    if let Some(annotation) = &diagnostic.annotation {
        row.push(' ');
        row.push_str(annotation);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagnosticCode;
    use pretty_assertions::assert_eq;

    fn presenter(file: &str, text: &str) -> DiagnosticPresenter {
        let cache = Arc::new(LineCache::new());
        cache.insert(file, text);
        DiagnosticPresenter::new(cache)
    }

    #[test]
    fn test_caret_row_keeps_tabs() {
        let diag = Diagnostic::new(DiagnosticCode::ParseError, "m", "f", Position::new(1, 3))
            .with_end(Position::new(1, 6));
        assert_eq!(caret_row("\t\tabcdef", &diag), "\t\t^^^");
    }

    #[test]
    fn test_caret_row_clamps_to_line_end() {
        let diag = Diagnostic::new(DiagnosticCode::ParseError, "m", "f", Position::new(1, 2))
            .with_end(Position::new(1, 40));
        assert_eq!(caret_row("abc", &diag), " ^^");
    }

    #[test]
    fn test_caret_minimum_width() {
        let diag = Diagnostic::new(DiagnosticCode::ParseError, "m", "f", Position::new(1, 4));
        assert_eq!(caret_row("abc", &diag), "   ^");
    }

    #[test]
    fn test_line_numbers_are_right_aligned() {
        let text: String = (1..=12).map(|n| format!("line {n}\n")).collect();
        let p = presenter("a.sugo", &text);
        let diag = Diagnostic::new(DiagnosticCode::RewriteError, "bad", "a.sugo", Position::new(9, 1));
        let out = p.render(&diag, None);
        assert_eq!(
            out,
            "error[rewrite-error]: bad\n  --> a.sugo:9:1\n   |\n 7 | line 7\n 8 | line 8\n 9 | line 9\n   | ^\n10 | line 10\n11 | line 11\n"
        );
    }

    #[test]
    fn test_unknown_file_renders_header_only() {
        let p = DiagnosticPresenter::default();
        let diag = Diagnostic::new(DiagnosticCode::IoError, "gone", "x.sugo", Position::new(1, 1));
        assert_eq!(p.render(&diag, None), "error[io-error]: gone\n --> x.sugo:1:1\n");
    }

    #[test]
    fn test_machine_format() {
        let p = DiagnosticPresenter::default();
        let diag = Diagnostic::new(DiagnosticCode::ParseError, "bad", "a.sugo", Position::new(2, 3))
            .with_end(Position::new(2, 5));
        assert_eq!(p.render_machine(&diag), "ERROR a.sugo:2:3:2:5 bad (parse-error)");
    }

    #[test]
    fn test_json_format() {
        let p = DiagnosticPresenter::default();
        let diag = Diagnostic::new(DiagnosticCode::Gopls, "unused", "a.sugo", Position::new(1, 1));
        let json = serde_json::to_string(&p.to_json(&[diag])).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"Warning","filename":"a.sugo","start":{"line":1,"column":1},"end":{"line":1,"column":1},"message":"unused","code":"gopls","source":"gopls"}]"#
        );
    }
}
