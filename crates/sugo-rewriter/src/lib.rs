//! Textual desugaring of sugo into Go.
//!
//! This crate implements the first rewrite stage of the transpiler:
//! - Lexer (tokenizer) using `logos`
//! - Ordered textual rules (`enum`, `match`, lambdas, `?.`, `?`, `let`)
//! - Gapless provenance records for every generated byte
//! - Pending nodes for constructs the structural pass expands
//!
//! # Example
//!
//! ```
//! use sugo_rewriter::rewrite;
//!
//! let source = "func parse() (int, error) {\n\tn := atoi(s)?\n\treturn n, nil\n}\n";
//! let output = rewrite(source).unwrap();
//! assert!(output.text.contains("n, __err1 := atoi(s)"));
//! ```

mod engine;
mod error;
mod lexer;
mod pending;
pub mod rules;
mod signature;

pub use engine::RewriteEngine;
pub use error::{RewriteError, RewriteErrorKind};
pub use lexer::{Lexer, Token, TokenKind};
pub use pending::{
    Fragment, LambdaParam, MatchArm, Pattern, PendingKind, PendingLambda, PendingMatch,
    PendingNode, PendingSafeNav,
};
pub use rules::Rule;

use source_map::RewriteRecord;

/// The result of the textual pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutput {
    /// The generated Go text, with stubs for pending constructs.
    pub text: String,
    /// Records covering `text` without gaps, in generated order.
    pub records: Vec<RewriteRecord>,
    /// Constructs left for the structural pass, in generated order.
    pub pending: Vec<PendingNode>,
}

/// Rewrites `source` with every rule enabled.
pub fn rewrite(source: &str) -> Result<RewriteOutput, RewriteError> {
    RewriteEngine::default().rewrite(source)
}
