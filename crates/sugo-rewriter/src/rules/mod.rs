//! The textual desugaring rules.
//!
//! Rules are tried in [`Rule::ALL`] order at every token; statement rules only
//! fire at a statement start. Synthesized text of each rule is recorded under
//! the rule's [`RuleId`] and anchored to the construct's original span.

mod enums;
mod lambda;
mod let_binding;
mod matching;
mod propagation;
mod safe_nav;

use source_map::RuleId;
use std::fmt;

/// A textual desugaring rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// `enum Name { A, B { f T } }` at file scope.
    Enum,
    /// `match expr { Pattern => body }`.
    Match,
    /// `|a: int, b| -> R body`.
    Lambda,
    /// `a?.b?.c`.
    SafeNav,
    /// `x := expr?`.
    ErrorPropagation,
    /// `let x = e` and `let x: T = e`.
    Let,
}

impl Rule {
    /// Every rule, in application order.
    pub const ALL: [Rule; 6] = [
        Rule::Enum,
        Rule::Match,
        Rule::Lambda,
        Rule::SafeNav,
        Rule::ErrorPropagation,
        Rule::Let,
    ];

    /// Returns the record id of this rule.
    pub fn id(&self) -> RuleId {
        match self {
            Rule::Enum => ENUM,
            Rule::Match => MATCH,
            Rule::Lambda => LAMBDA,
            Rule::SafeNav => SAFE_NAV,
            Rule::ErrorPropagation => ERROR_PROPAGATION,
            Rule::Let => LET,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id().as_str())
    }
}

/// Record id of the `enum` rule.
pub const ENUM: RuleId = RuleId::new("enum");
/// Record id of the `match` rule.
pub const MATCH: RuleId = RuleId::new("match");
/// Record id of the lambda rule.
pub const LAMBDA: RuleId = RuleId::new("lambda");
/// Record id of the safe navigation rule.
pub const SAFE_NAV: RuleId = RuleId::new("safe-nav");
/// Record id of the error propagation rule.
pub const ERROR_PROPAGATION: RuleId = RuleId::new("error-propagation");
/// Record id of the `let` rule.
pub const LET: RuleId = RuleId::new("let");
