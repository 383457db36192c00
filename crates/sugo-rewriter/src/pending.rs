//! Pending nodes: placeholders the structural pass expands.
//!
//! The textual pass cannot emit final Go for constructs whose expansion needs
//! type information (lambda parameter inference, match on sum types). It emits
//! a small stub instead and records a [`PendingNode`] carrying the parsed
//! construct together with the stub's generated span, so the structural pass
//! can attach it to the parsed tree by position alone.

use smol_str::SmolStr;
use source_map::Span;

/// A verbatim piece of original source carried into an expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// The original text.
    pub text: String,
    /// The span of `text` in the original source.
    pub span: Span,
}

impl Fragment {
    /// Creates a fragment by slicing `source`.
    pub fn slice(source: &str, span: Span) -> Self {
        Self {
            text: span.slice(source).to_string(),
            span,
        }
    }
}

/// A placeholder emitted by the textual pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNode {
    /// The construct to expand.
    pub kind: PendingKind,
    /// The span of the whole construct in the original source.
    pub original: Span,
    /// The span of the stub in the generated text.
    pub stub: Span,
}

/// The construct behind a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingKind {
    /// `|params| -> R body`, stubbed as `nil`.
    Lambda(PendingLambda),
    /// `match expr { arms }`, stubbed as `{}`.
    Match(PendingMatch),
    /// `a?.b?.c`, stubbed as `nil`.
    SafeNav(PendingSafeNav),
}

impl PendingKind {
    /// Returns the tree-sitter-go node kind of this construct's stub.
    pub fn stub_kind(&self) -> &'static str {
        match self {
            PendingKind::Lambda(_) | PendingKind::SafeNav(_) => "nil",
            PendingKind::Match(_) => "block",
        }
    }

    /// Returns the construct name used in messages.
    pub fn name(&self) -> &'static str {
        match self {
            PendingKind::Lambda(_) => "lambda",
            PendingKind::Match(_) => "match",
            PendingKind::SafeNav(_) => "safe navigation",
        }
    }
}

/// A lambda literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLambda {
    /// The `|...|` parameter list, including the pipes.
    pub head: Span,
    /// Parameters in order.
    pub params: Vec<LambdaParam>,
    /// The declared result type after `->`.
    pub result: Option<Fragment>,
    /// The body; for block bodies, the text between the braces.
    pub body: Fragment,
    /// Whether the body was a `{ block }`.
    pub block: bool,
}

/// One lambda parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaParam {
    /// The parameter name.
    pub name: Fragment,
    /// The declared type, if any.
    pub ty: Option<Fragment>,
}

/// A pattern match statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMatch {
    /// The `match` keyword.
    pub keyword: Span,
    /// The matched expression.
    pub scrutinee: Fragment,
    /// Arms in source order.
    pub arms: Vec<MatchArm>,
}

/// One `PATTERN => BODY` arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchArm {
    /// The pattern.
    pub pattern: Pattern,
    /// The span of the pattern in the original source.
    pub pattern_span: Span,
    /// The body; for block bodies, the text between the braces.
    pub body: Fragment,
    /// Whether the body was a `{ block }`.
    pub block: bool,
}

/// A match pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `Some(x)`
    Some(Fragment),
    /// `None`
    None,
    /// `Ok(x)`
    Ok(Fragment),
    /// `Err(e)`
    Err(Fragment),
    /// `Variant` or `Variant(x)`
    Variant {
        /// The variant name.
        name: SmolStr,
        /// The bound identifier.
        binding: Option<Fragment>,
    },
    /// `_`
    Wildcard,
}

impl Pattern {
    /// Returns the case this pattern covers, or `None` for the wildcard.
    pub fn case_name(&self) -> Option<&str> {
        match self {
            Pattern::Some(_) => Some("Some"),
            Pattern::None => Some("None"),
            Pattern::Ok(_) => Some("Ok"),
            Pattern::Err(_) => Some("Err"),
            Pattern::Variant { name, .. } => Some(name.as_str()),
            Pattern::Wildcard => None,
        }
    }

    /// Returns the identifier bound by this pattern.
    pub fn binding(&self) -> Option<&Fragment> {
        match self {
            Pattern::Some(b) | Pattern::Ok(b) | Pattern::Err(b) => Some(b),
            Pattern::Variant { binding, .. } => binding.as_ref(),
            Pattern::None | Pattern::Wildcard => None,
        }
    }
}

/// A safe navigation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSafeNav {
    /// The chain split at each `?.`; the first segment is the base operand.
    pub segments: Vec<Fragment>,
}
