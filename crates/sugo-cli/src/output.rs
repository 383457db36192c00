//! Output formatting.

use crate::cli::OutputFormat;
use sugo_diagnostics::{Diagnostic, DiagnosticPresenter, Severity};

/// Formats diagnostics for output.
pub struct Formatter {
    format: OutputFormat,
    presenter: DiagnosticPresenter,
}

impl Formatter {
    /// Creates a formatter reading snippets through `presenter`.
    pub fn new(format: OutputFormat, presenter: DiagnosticPresenter) -> Self {
        Self { format, presenter }
    }

    /// Returns the presenter, whose cache must hold every reported file.
    pub fn presenter(&self) -> &DiagnosticPresenter {
        &self.presenter
    }

    /// Formats one file's diagnostics as text.
    ///
    /// JSON output is produced once for the whole run by [`Formatter::format_json`].
    pub fn format(&self, diagnostics: &[Diagnostic]) -> String {
        match self.format {
            OutputFormat::Human => diagnostics
                .iter()
                .map(|diag| self.presenter.render(diag, None) + "\n")
                .collect(),
            OutputFormat::Machine => diagnostics
                .iter()
                .map(|diag| self.presenter.render_machine(diag) + "\n")
                .collect(),
            OutputFormat::Json => String::new(),
        }
    }

    /// Formats every diagnostic of a run as a JSON array.
    pub fn format_json(&self, diagnostics: &[Diagnostic]) -> String {
        serde_json::to_string_pretty(&self.presenter.to_json(diagnostics)).unwrap_or_default()
    }
}

/// Summary of a build run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    /// Number of files transpiled.
    pub file_count: usize,
    /// Number of errors.
    pub error_count: usize,
    /// Number of warnings.
    pub warning_count: usize,
    /// Number of files written with `--emit`.
    pub emitted_count: usize,
}

impl BuildSummary {
    /// Counts `diagnostics` into the summary.
    pub fn record(&mut self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            match diag.severity {
                Severity::Error => self.error_count += 1,
                Severity::Warning => self.warning_count += 1,
                Severity::Information | Severity::Hint => {}
            }
        }
    }

    /// Formats the summary line.
    pub fn format(&self) -> String {
        let error_word = if self.error_count == 1 { "error" } else { "errors" };
        let warning_word = if self.warning_count == 1 { "warning" } else { "warnings" };
        let file_word = if self.file_count == 1 { "file" } else { "files" };

        let mut line = format!(
            "====================================\nsugo found {} {} and {} {} in {} {}",
            self.error_count,
            error_word,
            self.warning_count,
            warning_word,
            self.file_count,
            file_word
        );
        if self.emitted_count > 0 {
            line.push_str(&format!(", wrote {} Go files", self.emitted_count));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use source_map::Position;
    use std::sync::Arc;
    use sugo_diagnostics::{DiagnosticCode, LineCache};

    fn formatter(format: OutputFormat) -> Formatter {
        let cache = Arc::new(LineCache::new());
        cache.insert("a.sugo", "package main\n\nlet = 1\n");
        Formatter::new(format, DiagnosticPresenter::new(cache))
    }

    fn diagnostic() -> Diagnostic {
        Diagnostic::new(
            DiagnosticCode::RewriteError,
            "let: missing name",
            "a.sugo",
            Position::new(3, 5),
        )
        .with_end(Position::new(3, 6))
    }

    #[test]
    fn test_format_human() {
        let output = formatter(OutputFormat::Human).format(&[diagnostic()]);
        assert!(output.contains("--> a.sugo:3:5"));
        assert!(output.contains("3 | let = 1"));
        assert!(output.contains("let: missing name"));
    }

    #[test]
    fn test_format_machine() {
        let output = formatter(OutputFormat::Machine).format(&[diagnostic()]);
        assert_eq!(output, "ERROR a.sugo:3:5:3:6 let: missing name (rewrite-error)\n");
    }

    #[test]
    fn test_format_json() {
        let formatter = formatter(OutputFormat::Json);
        assert_eq!(formatter.format(&[diagnostic()]), "");

        let json: serde_json::Value =
            serde_json::from_str(&formatter.format_json(&[diagnostic()])).unwrap();
        assert_eq!(json[0]["filename"], "a.sugo");
        assert_eq!(json[0]["start"]["line"], 3);
        assert_eq!(json[0]["code"], "rewrite-error");
    }

    #[test]
    fn test_summary() {
        let mut summary = BuildSummary {
            file_count: 1,
            ..Default::default()
        };
        summary.record(&[diagnostic()]);

        let output = summary.format();
        assert!(output.contains("1 error and 0 warnings in 1 file"));
        assert!(!output.contains("wrote"));

        summary.file_count = 5;
        summary.emitted_count = 4;
        assert!(summary.format().ends_with("in 5 files, wrote 4 Go files"));
    }
}
