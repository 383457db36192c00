//! `let x = e` becomes `x := e`; `let x: T = e` becomes `var x T = e`.

use super::Rule;
use crate::engine::Rewriter;
use crate::lexer::TokenKind;
use crate::RewriteError;

impl Rewriter<'_> {
    /// Parses `NAME (, NAME)*` starting at `i`.
    ///
    /// Returns the name token indices and the index of the token after them.
    pub(crate) fn parse_names(&self, i: usize) -> Option<(Vec<usize>, usize)> {
        let mut names = Vec::new();
        let mut j = i;
        loop {
            if self.kind(j) != TokenKind::Ident {
                return None;
            }
            names.push(j);
            let next = self.next_sig(j);
            if self.kind(next) != TokenKind::Comma {
                return Some((names, next));
            }
            j = self.next_code(next);
        }
    }

    /// Rewrites the head of a `let` statement and returns the index where
    /// normal processing resumes.
    pub(crate) fn rewrite_let(&mut self, i: usize) -> Result<usize, RewriteError> {
        let keyword = self.span(i);
        let (names, after) = self
            .parse_names(self.next_sig(i))
            .ok_or_else(|| self.malformed(Rule::Let, self.next_sig(i), "let", "expected a name"))?;

        match self.kind(after) {
            TokenKind::Assign => {
                self.copy_to(keyword.start_usize());
                self.skip_to(self.span(names[0]).start_usize());
                self.copy_to(self.span(after).start_usize());
                self.synthesize(Rule::Let, self.span(after), ":=");
                self.skip_to(self.span(after).end_usize());
                Ok(after + 1)
            }
            TokenKind::Colon => {
                self.copy_to(keyword.start_usize());
                self.synthesize(Rule::Let, keyword, "var");
                self.skip_to(keyword.end_usize());
                self.copy_to(self.span(after).start_usize());
                self.skip_to(self.span(after).end_usize());
                Ok(after + 1)
            }
            _ => Err(self.malformed(
                Rule::Let,
                after,
                "let",
                "expected `=` or `:` after the bound names",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{rewrite, RewriteErrorKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_let_becomes_short_declaration() {
        let output = rewrite("func f() {\n\tlet x = 1\n}\n").unwrap();
        assert_eq!(output.text, "func f() {\n\tx := 1\n}\n");
    }

    #[test]
    fn test_typed_let_becomes_var() {
        let output = rewrite("func f() {\n\tlet x: int64 = 1\n}\n").unwrap();
        assert_eq!(output.text, "func f() {\n\tvar x int64 = 1\n}\n");
    }

    #[test]
    fn test_let_multiple_names() {
        let output = rewrite("func f() {\n\tlet a, b = 1, 2\n}\n").unwrap();
        assert_eq!(output.text, "func f() {\n\ta, b := 1, 2\n}\n");
    }

    #[test]
    fn test_let_without_initializer_fails() {
        let err = rewrite("func f() {\n\tlet x\n}\n").unwrap_err();
        assert_eq!(err.rule.as_str(), "let");
        assert_eq!(err.position.line, 2);
        assert!(matches!(err.reason, RewriteErrorKind::Malformed { .. }));
    }

    #[test]
    fn test_let_records_anchor_operator() {
        let output = rewrite("let x = 1\n").unwrap();
        assert_eq!(output.text, "x := 1\n");
        let define = output
            .records
            .iter()
            .find(|r| r.rule.as_str() == "let")
            .unwrap();
        assert_eq!(define.original.start_usize(), 6);
        assert_eq!(define.generated.slice(&output.text), ":=");
    }
}
