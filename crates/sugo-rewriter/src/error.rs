//! Rewrite error types.

use source_map::{Position, RuleId, Span};
use thiserror::Error;

/// A textual rule whose precondition was violated.
///
/// Any rewrite error aborts the whole pass; no partial output is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{rule}: {reason} at {position}")]
pub struct RewriteError {
    /// The rule that failed.
    pub rule: RuleId,
    /// The 1-indexed position in the original source.
    pub position: Position,
    /// The offending span in the original source.
    pub span: Span,
    /// What went wrong.
    pub reason: RewriteErrorKind,
}

/// The kind of rewrite error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteErrorKind {
    /// A bracket inside a construct has no partner.
    #[error("unbalanced {0}")]
    Unbalanced(&'static str),

    /// A sugar construct appears inside the body or operand of another.
    #[error("{inner} cannot be nested inside {outer}")]
    DisallowedNesting {
        /// The nested construct.
        inner: &'static str,
        /// The enclosing construct.
        outer: &'static str,
    },

    /// `?` is followed by more tokens of the same statement.
    #[error("`?` must end its statement")]
    QuestionNotAtEnd,

    /// `?` ends an expression that is not a whole statement.
    #[error("error propagation must be a whole statement")]
    NotAStatement,

    /// `?` outside a function whose last result is `error`.
    #[error("`?` requires an enclosing function whose last result is `error`")]
    NoErrorResult,

    /// A `match` arm could not be parsed.
    #[error("malformed match arm: {0}")]
    MalformedArm(String),

    /// A lambda parameter list could not be parsed.
    #[error("malformed lambda parameters: {0}")]
    MalformedParams(String),

    /// Any other construct could not be parsed.
    #[error("malformed {construct}: {message}")]
    Malformed {
        /// The construct being parsed.
        construct: &'static str,
        /// A description of the problem.
        message: String,
    },

    /// `enum` declared inside a function or block.
    #[error("`enum` must be declared at file scope")]
    EnumNotAtFileScope,
}
