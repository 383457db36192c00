//! Structural pass error types.

use source_map::{Position, Span};
use thiserror::Error;

/// Generated Go that tree-sitter could not parse.
///
/// This always signals a defect in a rewrite rule or malformed user code
/// carried into an expansion. The position is in the original source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("generated Go does not parse at {position}: {message}")]
pub struct ParseError {
    /// The 1-indexed position in the original source.
    pub position: Position,
    /// The offending span in the original source.
    pub span: Span,
    /// A description of the problem.
    pub message: String,
}

/// A structural pass precondition that was violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DesugarError {
    /// A match does not cover every case of its scrutinee.
    #[error("match over {scrutinee_type} is not exhaustive: missing {}", missing.join(", "))]
    NonExhaustiveMatch {
        /// The scrutinee's case set (`Option`, `Result` or a sum type name).
        scrutinee_type: String,
        /// Cases without an arm, in declaration order.
        missing: Vec<String>,
        /// Position of the `match` keyword.
        position: Position,
        /// Span of the `match` keyword.
        span: Span,
    },

    /// A variant pattern names no known sum type variant.
    #[error("`{variant}` is not a variant of any known enum")]
    UnknownScrutinee {
        /// The unknown variant name.
        variant: String,
        /// Position of the pattern.
        position: Position,
        /// Span of the pattern.
        span: Span,
    },

    /// Arms mix patterns of different case sets.
    #[error("match arms mix patterns of {first} and {second}")]
    MixedPatterns {
        /// The case set of the first arm.
        first: String,
        /// The conflicting case set.
        second: String,
        /// Position of the conflicting pattern.
        position: Position,
        /// Span of the conflicting pattern.
        span: Span,
    },

    /// A placeholder did not resolve to the expected tree node.
    #[error("{construct} placeholder resolved to `{found}`")]
    DetachedPlaceholder {
        /// The construct behind the placeholder.
        construct: &'static str,
        /// The node kind found at the placeholder's position.
        found: String,
        /// Position of the construct.
        position: Position,
        /// Span of the construct.
        span: Span,
    },

    /// A lambda type could not be inferred.
    #[error("cannot infer lambda types: {reason}")]
    LambdaInference {
        /// Why inference failed.
        reason: String,
        /// Position of the lambda.
        position: Position,
        /// Span of the lambda head.
        span: Span,
    },
}

impl DesugarError {
    /// Returns the stable diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            DesugarError::NonExhaustiveMatch { .. } => "non-exhaustive-match",
            DesugarError::UnknownScrutinee { .. } => "unknown-scrutinee",
            DesugarError::MixedPatterns { .. } => "mixed-patterns",
            DesugarError::DetachedPlaceholder { .. } => "detached-placeholder",
            DesugarError::LambdaInference { .. } => "lambda-inference",
        }
    }

    /// Returns the original position the error is reported at.
    pub fn position(&self) -> Position {
        match self {
            DesugarError::NonExhaustiveMatch { position, .. }
            | DesugarError::UnknownScrutinee { position, .. }
            | DesugarError::MixedPatterns { position, .. }
            | DesugarError::DetachedPlaceholder { position, .. }
            | DesugarError::LambdaInference { position, .. } => *position,
        }
    }

    /// Returns the original span the error is reported at.
    pub fn span(&self) -> Span {
        match self {
            DesugarError::NonExhaustiveMatch { span, .. }
            | DesugarError::UnknownScrutinee { span, .. }
            | DesugarError::MixedPatterns { span, .. }
            | DesugarError::DetachedPlaceholder { span, .. }
            | DesugarError::LambdaInference { span, .. } => *span,
        }
    }

    /// Returns the missing case names of a non-exhaustive match.
    pub fn missing_cases(&self) -> &[String] {
        match self {
            DesugarError::NonExhaustiveMatch { missing, .. } => missing,
            _ => &[],
        }
    }
}
