//! Diagnostic types.

use serde::Serialize;
use source_map::Position;
use std::fmt;

/// Which text a diagnostic's positions refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateSpace {
    /// The original `.sugo` source.
    #[default]
    Original,
    /// The generated Go.
    Generated,
}

/// A diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The diagnostic code.
    pub code: DiagnosticCode,
    /// The severity level.
    pub severity: Severity,
    /// The diagnostic message.
    pub message: String,
    /// The original file the diagnostic belongs to.
    pub file: String,
    /// The start position.
    pub start: Position,
    /// The end position, if the diagnostic covers a range.
    pub end: Option<Position>,
    /// The coordinate space of `start` and `end`.
    pub space: CoordinateSpace,
    /// A short note printed after the caret row.
    pub annotation: Option<String>,
    /// Suggested code, possibly spanning several lines.
    pub suggestion: Option<String>,
    /// Case names a match is missing.
    pub missing_cases: Vec<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic in original coordinates.
    pub fn new(
        code: DiagnosticCode,
        message: impl Into<String>,
        file: impl Into<String>,
        start: Position,
    ) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            message: message.into(),
            file: file.into(),
            start,
            end: None,
            space: CoordinateSpace::Original,
            annotation: None,
            suggestion: None,
            missing_cases: Vec::new(),
        }
    }

    /// Sets the end position.
    pub fn with_end(mut self, end: Position) -> Self {
        self.end = Some(end);
        self
    }

    /// Marks the positions as generated-text coordinates.
    pub fn in_generated(mut self) -> Self {
        self.space = CoordinateSpace::Generated;
        self
    }

    /// Adds an annotation after the caret row.
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Adds a suggestion block.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Adds missing case names.
    pub fn with_missing_cases(mut self, cases: Vec<String>) -> Self {
        self.missing_cases = cases;
        self
    }
}

/// The severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// A hint or suggestion.
    Hint,
    /// Informational output.
    Information,
    /// A warning that doesn't prevent compilation.
    Warning,
    /// An error that should be fixed.
    Error,
}

impl Severity {
    /// Returns the lowercase name used in rendered output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Hint => "hint",
            Severity::Information => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // === Transpiler codes ===
    /// `rewrite-error`: a textual rule's precondition failed
    RewriteError,
    /// `parse-error`: generated Go does not parse
    ParseError,
    /// `non-exhaustive-match`
    NonExhaustiveMatch,
    /// `unknown-scrutinee`
    UnknownScrutinee,
    /// `mixed-patterns`
    MixedPatterns,
    /// `detached-placeholder`
    DetachedPlaceholder,
    /// `lambda-inference`
    LambdaInference,

    // === Other codes ===
    /// `gopls`: reported by the Go language server
    Gopls,
    /// `io-error`: a file could not be read or written
    IoError,
}

impl DiagnosticCode {
    /// Returns the default severity for this diagnostic code.
    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticCode::Gopls => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Returns the diagnostic code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::RewriteError => "rewrite-error",
            DiagnosticCode::ParseError => "parse-error",
            DiagnosticCode::NonExhaustiveMatch => "non-exhaustive-match",
            DiagnosticCode::UnknownScrutinee => "unknown-scrutinee",
            DiagnosticCode::MixedPatterns => "mixed-patterns",
            DiagnosticCode::DetachedPlaceholder => "detached-placeholder",
            DiagnosticCode::LambdaInference => "lambda-inference",
            DiagnosticCode::Gopls => "gopls",
            DiagnosticCode::IoError => "io-error",
        }
    }

    /// Returns the tool that produced diagnostics with this code.
    pub fn source(&self) -> &'static str {
        match self {
            DiagnosticCode::Gopls => "gopls",
            _ => "sugo",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
