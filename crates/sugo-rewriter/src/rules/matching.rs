//! `match` statements, stubbed as `{}` for the structural pass.

use super::Rule;
use crate::engine::Rewriter;
use crate::lexer::TokenKind;
use crate::pending::{Fragment, MatchArm, PendingKind, PendingMatch, Pattern};
use crate::{RewriteError, RewriteErrorKind};
use smol_str::SmolStr;

impl Rewriter<'_> {
    /// Rewrites the `match` statement at `i`.
    pub(crate) fn rewrite_match(&mut self, i: usize) -> Result<usize, RewriteError> {
        let keyword = self.span(i);
        if self.at_file_scope(i) {
            return Err(self.malformed(Rule::Match, i, "match", "must appear inside a function body"));
        }

        let first = self.next_sig(i);
        let mut open = first;
        while self.kind(open) != TokenKind::LBrace {
            if matches!(
                self.kind(open),
                TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof
            ) || self.kind(open).is_closer()
            {
                return Err(self.malformed(Rule::Match, open, "match", "expected `{` after the scrutinee"));
            }
            open = self
                .skip_group(open)
                .ok_or_else(|| self.unbalanced(Rule::Match, open))?;
        }
        if open == first {
            return Err(self.malformed(Rule::Match, open, "match", "missing scrutinee"));
        }
        self.ensure_plain(first, open, "match", Rule::Match)?;
        let scrutinee = self.fragment(first, open);

        let close = self.partner(open).ok_or_else(|| self.unbalanced(Rule::Match, open))?;
        let arms = self.parse_arms(open, close)?;
        if arms.is_empty() {
            return Err(self.arm_error(open, "match has no arms"));
        }

        let original = keyword.cover(self.span(close));
        self.copy_to(keyword.start_usize());
        self.emit_stub(
            Rule::Match,
            PendingKind::Match(PendingMatch {
                keyword,
                scrutinee,
                arms,
            }),
            original,
            "{}",
        );
        self.skip_to(original.end_usize());

        Ok(close + 1)
    }

    fn parse_arms(&self, open: usize, close: usize) -> Result<Vec<MatchArm>, RewriteError> {
        let mut arms = Vec::new();
        let mut j = self.next_code(open);
        while j < close {
            if self.kind(j) == TokenKind::Comma {
                j = self.next_code(j);
                continue;
            }

            let (pattern, pattern_end) = self.parse_pattern(j)?;
            let pattern_span = self.cover(j, pattern_end);
            let arrow = self.next_sig(pattern_end);
            if self.kind(arrow) != TokenKind::FatArrow {
                return Err(self.arm_error(arrow, "expected `=>` after the pattern"));
            }

            let start = self.next_sig(arrow);
            let (body, block, end) = match self.kind(start) {
                TokenKind::LBrace => {
                    let body_close = self
                        .partner(start)
                        .ok_or_else(|| self.unbalanced(Rule::Match, start))?;
                    self.ensure_plain(start + 1, body_close, "match", Rule::Match)?;
                    let body = self.trimmed_fragment(
                        self.span(start).end_usize(),
                        self.span(body_close).start_usize(),
                    );
                    (body, true, self.next_sig(body_close))
                }
                TokenKind::Newline | TokenKind::Comma | TokenKind::Eof => {
                    return Err(self.arm_error(start, "missing arm body"));
                }
                _ if start == close => return Err(self.arm_error(start, "missing arm body")),
                _ => {
                    let mut e = start;
                    while !matches!(
                        self.kind(e),
                        TokenKind::Newline | TokenKind::Comma | TokenKind::Eof
                    ) && e != close
                    {
                        e = self
                            .skip_group(e)
                            .ok_or_else(|| self.unbalanced(Rule::Match, e))?;
                    }
                    self.ensure_plain(start, e, "match", Rule::Match)?;
                    (self.fragment(start, e), false, e)
                }
            };

            if !matches!(self.kind(end), TokenKind::Newline | TokenKind::Comma) && end != close {
                return Err(self.arm_error(end, "expected a newline or `,` after the arm body"));
            }
            arms.push(MatchArm {
                pattern,
                pattern_span,
                body,
                block,
            });
            j = if end == close { close } else { self.next_code(end) };
        }
        Ok(arms)
    }

    /// Parses a pattern at `j`, returning it and the index of its last token.
    fn parse_pattern(&self, j: usize) -> Result<(Pattern, usize), RewriteError> {
        if self.kind(j) != TokenKind::Ident {
            return Err(self.arm_error(j, &format!("expected a pattern, found {}", self.kind(j).name())));
        }
        let name = self.text(j);
        let open = self.next_sig(j);

        let binding = if self.kind(open) == TokenKind::LParen {
            let ident = self.next_code(open);
            let close = self.next_code(ident);
            if self.kind(ident) != TokenKind::Ident || self.partner(open) != Some(close) {
                return Err(self.arm_error(open, "a pattern binds a single identifier"));
            }
            Some((Fragment::slice(self.source, self.span(ident)), close))
        } else {
            None
        };
        let end = binding.as_ref().map_or(j, |(_, close)| *close);

        let pattern = match (name, binding) {
            ("_", None) => Pattern::Wildcard,
            ("None", None) => Pattern::None,
            ("Some", Some((b, _))) => Pattern::Some(b),
            ("Ok", Some((b, _))) => Pattern::Ok(b),
            ("Err", Some((b, _))) => Pattern::Err(b),
            ("Some" | "Ok" | "Err", None) => {
                return Err(self.arm_error(j, &format!("`{name}` requires a binding")));
            }
            ("_" | "None", Some(_)) => {
                return Err(self.arm_error(j, &format!("`{name}` takes no binding")));
            }
            (_, binding) => Pattern::Variant {
                name: SmolStr::new(name),
                binding: binding.map(|(b, _)| b),
            },
        };
        Ok((pattern, end))
    }

    fn arm_error(&self, i: usize, message: &str) -> RewriteError {
        self.error(
            Rule::Match.id(),
            self.span(i),
            RewriteErrorKind::MalformedArm(message.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::pending::{PendingKind, Pattern};
    use crate::{rewrite, RewriteErrorKind};
    use pretty_assertions::assert_eq;

    const OPTION_MATCH: &str = "func show(v *int) {\n\tmatch v {\n\t\tSome(n) => fmt.Println(n)\n\t\tNone => {\n\t\t\tfmt.Println(\"none\")\n\t\t}\n\t}\n}\n";

    #[test]
    fn test_match_emits_block_stub() {
        let output = rewrite(OPTION_MATCH).unwrap();
        assert_eq!(output.text, "func show(v *int) {\n\t{}\n}\n");
        assert_eq!(output.pending.len(), 1);
        let node = &output.pending[0];
        assert_eq!(node.stub.slice(&output.text), "{}");
        assert!(node.original.slice(OPTION_MATCH).starts_with("match v {"));
        assert!(node.original.slice(OPTION_MATCH).ends_with("\t\t}\n\t}"));
    }

    #[test]
    fn test_match_arms() {
        let output = rewrite(OPTION_MATCH).unwrap();
        let PendingKind::Match(m) = &output.pending[0].kind else {
            panic!("expected a match");
        };
        assert_eq!(m.scrutinee.text, "v");
        assert_eq!(m.arms.len(), 2);
        assert!(matches!(&m.arms[0].pattern, Pattern::Some(b) if b.text == "n"));
        assert_eq!(m.arms[0].body.text, "fmt.Println(n)");
        assert!(!m.arms[0].block);
        assert_eq!(m.arms[1].pattern, Pattern::None);
        assert_eq!(m.arms[1].body.text, "fmt.Println(\"none\")");
        assert!(m.arms[1].block);
        assert_eq!(m.arms[1].body.span.slice(OPTION_MATCH), "fmt.Println(\"none\")");
    }

    #[test]
    fn test_comma_separated_arms() {
        let output = rewrite("func f(s Shape) {\n\tmatch s { Circle(c) => use(c), _ => skip() }\n}\n").unwrap();
        let PendingKind::Match(m) = &output.pending[0].kind else {
            panic!("expected a match");
        };
        assert_eq!(m.arms.len(), 2);
        assert!(matches!(&m.arms[0].pattern, Pattern::Variant { name, binding: Some(b) } if name == "Circle" && b.text == "c"));
        assert_eq!(m.arms[0].body.text, "use(c)");
        assert_eq!(m.arms[1].pattern, Pattern::Wildcard);
    }

    #[test]
    fn test_missing_binding_fails() {
        let err = rewrite("func f(v *int) {\n\tmatch v {\n\t\tSome => g()\n\t}\n}\n").unwrap_err();
        assert!(matches!(err.reason, RewriteErrorKind::MalformedArm(_)));
        assert_eq!(err.position.line, 3);
    }

    #[test]
    fn test_missing_arrow_fails() {
        let err = rewrite("func f(v *int) {\n\tmatch v {\n\t\tNone g()\n\t}\n}\n").unwrap_err();
        assert_eq!(
            err.reason,
            RewriteErrorKind::MalformedArm("expected `=>` after the pattern".to_string())
        );
    }

    #[test]
    fn test_nested_match_is_rejected() {
        let source = "func f(v *int) {\n\tmatch v {\n\t\tSome(n) => {\n\t\t\tmatch n {\n\t\t\t\t_ => g()\n\t\t\t}\n\t\t}\n\t}\n}\n";
        let err = rewrite(source).unwrap_err();
        assert_eq!(
            err.reason,
            RewriteErrorKind::DisallowedNesting {
                inner: "match",
                outer: "match"
            }
        );
    }
}
