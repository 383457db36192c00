//! Safe navigation chains, stubbed as `nil` for the structural pass.

use super::Rule;
use crate::engine::Rewriter;
use crate::lexer::TokenKind;
use crate::pending::{PendingKind, PendingSafeNav};
use crate::RewriteError;

impl Rewriter<'_> {
    /// Rewrites the selector chain starting at `i` if it contains `?.`.
    pub(crate) fn rewrite_safe_nav(&mut self, i: usize) -> Result<Option<usize>, RewriteError> {
        let mut segments = Vec::new();
        let mut segment_start = i;
        let mut j = i;
        loop {
            match self.kind(j + 1) {
                TokenKind::Dot if self.kind(j + 2) == TokenKind::Ident => j += 2,
                TokenKind::QuestionDot => {
                    if self.kind(j + 2) != TokenKind::Ident {
                        return Err(self.malformed(
                            Rule::SafeNav,
                            j + 2,
                            "safe navigation",
                            "expected a field name after `?.`",
                        ));
                    }
                    segments.push(self.fragment(segment_start, j + 1));
                    segment_start = j + 2;
                    j += 2;
                }
                _ => break,
            }
        }
        if segments.is_empty() {
            return Ok(None);
        }
        segments.push(self.fragment(segment_start, j + 1));

        if matches!(self.kind(j + 1), TokenKind::LParen | TokenKind::LBracket) {
            return Err(self.malformed(
                Rule::SafeNav,
                j + 1,
                "safe navigation",
                "a safe navigation chain must end in a field access",
            ));
        }

        let original = self.cover(i, j);
        self.copy_to(original.start_usize());
        self.emit_stub(
            Rule::SafeNav,
            PendingKind::SafeNav(PendingSafeNav { segments }),
            original,
            "nil",
        );
        self.skip_to(original.end_usize());

        Ok(Some(j + 1))
    }
}

#[cfg(test)]
mod tests {
    use crate::pending::PendingKind;
    use crate::{rewrite, RewriteErrorKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chain_is_split_at_safe_steps() {
        let source = "func f() {\n\tcity := user.Profile?.Address?.City\n}\n";
        let output = rewrite(source).unwrap();
        assert_eq!(output.text, "func f() {\n\tcity := nil\n}\n");
        let PendingKind::SafeNav(nav) = &output.pending[0].kind else {
            panic!("expected a safe navigation chain");
        };
        let texts: Vec<&str> = nav.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["user.Profile", "Address", "City"]);
        assert_eq!(
            output.pending[0].original.slice(source),
            "user.Profile?.Address?.City"
        );
    }

    #[test]
    fn test_plain_selector_is_untouched() {
        let output = rewrite("func f() {\n\tx := a.b.c\n}\n").unwrap();
        assert!(output.pending.is_empty());
    }

    #[test]
    fn test_call_after_chain_fails() {
        let err = rewrite("func f() {\n\tx := a?.b()\n}\n").unwrap_err();
        assert!(matches!(err.reason, RewriteErrorKind::Malformed { construct: "safe navigation", .. }));
    }

    #[test]
    fn test_safe_step_after_call_fails() {
        let err = rewrite("func f() {\n\tx := a.b()?.c\n}\n").unwrap_err();
        assert_eq!(err.rule.as_str(), "safe-nav");
    }
}
