//! Lambda literals, stubbed as `nil` for the structural pass.

use super::Rule;
use crate::engine::Rewriter;
use crate::lexer::TokenKind;
use crate::pending::{Fragment, LambdaParam, PendingKind, PendingLambda};
use crate::{RewriteError, RewriteErrorKind};

impl Rewriter<'_> {
    /// Rewrites the lambda opening at `i`.
    pub(crate) fn rewrite_lambda(&mut self, i: usize) -> Result<usize, RewriteError> {
        let (params, head_end) = if self.kind(i) == TokenKind::PipePipe {
            (Vec::new(), i)
        } else {
            self.parse_params(i)?
        };
        let head = self.cover(i, head_end);

        let mut j = self.next_sig(head_end);
        let mut result = None;
        if self.kind(j) == TokenKind::Arrow {
            let first = self.next_sig(j);
            let mut k = first;
            while self.kind(k) != TokenKind::LBrace {
                if matches!(
                    self.kind(k),
                    TokenKind::Newline | TokenKind::Comma | TokenKind::Semicolon | TokenKind::Eof
                ) || self.kind(k).is_closer()
                {
                    return Err(self.malformed(
                        Rule::Lambda,
                        k,
                        "lambda",
                        "a declared result type requires a block body",
                    ));
                }
                k = self.skip_group(k).ok_or_else(|| self.unbalanced(Rule::Lambda, k))?;
            }
            if k == first {
                return Err(self.malformed(Rule::Lambda, k, "lambda", "missing result type after `->`"));
            }
            result = Some(self.fragment(first, k));
            j = k;
        }

        let (body, block, last, resume) = if self.kind(j) == TokenKind::LBrace {
            let close = self.partner(j).ok_or_else(|| self.unbalanced(Rule::Lambda, j))?;
            self.ensure_plain(j + 1, close, "lambda", Rule::Lambda)?;
            let body = self.trimmed_fragment(self.span(j).end_usize(), self.span(close).start_usize());
            (body, true, close, close + 1)
        } else {
            let mut e = j;
            while !matches!(
                self.kind(e),
                TokenKind::Comma | TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof
            ) && !self.kind(e).is_closer()
            {
                e = self.skip_group(e).ok_or_else(|| self.unbalanced(Rule::Lambda, e))?;
            }
            if e == j {
                return Err(self.malformed(Rule::Lambda, j, "lambda", "missing body"));
            }
            self.ensure_plain(j, e, "lambda", Rule::Lambda)?;
            let body = self.fragment(j, e);
            let last = self.prev_sig(e).unwrap_or(j);
            (body, false, last, e)
        };

        let original = self.cover(i, last);
        self.copy_to(original.start_usize());
        self.emit_stub(
            Rule::Lambda,
            PendingKind::Lambda(PendingLambda {
                head,
                params,
                result,
                body,
                block,
            }),
            original,
            "nil",
        );
        self.skip_to(original.end_usize());

        Ok(resume)
    }

    /// Parses `|a: T, b|` starting at the opening pipe.
    fn parse_params(&self, i: usize) -> Result<(Vec<LambdaParam>, usize), RewriteError> {
        let mut params = Vec::new();
        let mut j = self.next_sig(i);
        if self.kind(j) == TokenKind::Pipe {
            return Ok((params, j));
        }
        loop {
            if self.kind(j) != TokenKind::Ident {
                return Err(self.params_error(
                    j,
                    format!("expected a parameter name, found {}", self.kind(j).name()),
                ));
            }
            let name = Fragment::slice(self.source, self.span(j));
            let mut k = self.next_sig(j);
            let mut ty = None;
            if self.kind(k) == TokenKind::Colon {
                let first = self.next_sig(k);
                k = first;
                while !matches!(self.kind(k), TokenKind::Comma | TokenKind::Pipe) {
                    if matches!(self.kind(k), TokenKind::Newline | TokenKind::Eof) || self.kind(k).is_closer() {
                        return Err(self.params_error(k, "unterminated parameter list".to_string()));
                    }
                    k = self.skip_group(k).ok_or_else(|| self.unbalanced(Rule::Lambda, k))?;
                }
                if k == first {
                    return Err(self.params_error(k, "missing parameter type".to_string()));
                }
                ty = Some(self.fragment(first, k));
            }
            params.push(LambdaParam { name, ty });
            match self.kind(k) {
                TokenKind::Comma => j = self.next_sig(k),
                TokenKind::Pipe => return Ok((params, k)),
                _ => {
                    return Err(self.params_error(
                        k,
                        format!("expected `,` or `|`, found {}", self.kind(k).name()),
                    ))
                }
            }
        }
    }

    fn params_error(&self, i: usize, message: String) -> RewriteError {
        self.error(Rule::Lambda.id(), self.span(i), RewriteErrorKind::MalformedParams(message))
    }
}
