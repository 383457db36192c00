//! The textual rewrite engine.
//!
//! The engine tokenizes the whole file once, pairs brackets, and then walks
//! the token stream left to right. At every token the enabled rules are tried
//! in order; the first rule that claims the token consumes a region and emits
//! its replacement through a [`RecordingWriter`]. Unclaimed source is copied
//! verbatim, so the records cover the generated text without gaps.

use crate::lexer::{is_go_keyword, Lexer, Token, TokenKind};
use crate::pending::{Fragment, PendingKind, PendingNode};
use crate::rules::Rule;
use crate::signature::Signature;
use crate::{RewriteError, RewriteErrorKind, RewriteOutput};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use source_map::{LineIndex, RecordingWriter, RuleId, Span};

/// Applies an ordered list of textual rules to sugo source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteEngine {
    rules: Vec<Rule>,
}

impl Default for RewriteEngine {
    fn default() -> Self {
        Self::new(Rule::ALL)
    }
}

impl RewriteEngine {
    /// Creates an engine applying `rules` in the given order.
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// Returns the rules in application order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rewrites `source` into Go.
    ///
    /// Returns the generated text, a gapless record list covering it, and the
    /// placeholders left for the structural pass. On error nothing is returned.
    pub fn rewrite(&self, source: &str) -> Result<RewriteOutput, RewriteError> {
        let result = Rewriter::new(source, &self.rules).run();
        match &result {
            Ok(output) => tracing::debug!(
                bytes = output.text.len(),
                records = output.records.len(),
                pending = output.pending.len(),
                "textual rewrite finished"
            ),
            Err(err) => tracing::debug!(error = %err, "textual rewrite failed"),
        }
        result
    }
}

/// An enclosing function body.
#[derive(Debug)]
pub(crate) struct FuncScope {
    pub(crate) signature: Signature,
    /// Token index of the closing brace.
    pub(crate) close: usize,
}

/// Rewrite state for one file.
pub(crate) struct Rewriter<'src> {
    pub(crate) source: &'src str,
    pub(crate) tokens: Vec<Token>,
    /// Partner index of every paired bracket token.
    partner: Vec<Option<usize>>,
    /// Innermost open bracket enclosing each token.
    enclosing: Vec<Option<usize>>,
    rules: &'src [Rule],
    line_index: LineIndex,
    writer: RecordingWriter,
    /// Original offset up to which output has been emitted.
    cursor: usize,
    pub(crate) pending: Vec<PendingNode>,
    pub(crate) scopes: Vec<FuncScope>,
    /// Signatures keyed by the token index of their body's opening brace.
    bodies: FxHashMap<usize, Signature>,
    pub(crate) error_vars: u32,
}

impl<'src> Rewriter<'src> {
    fn new(source: &'src str, rules: &'src [Rule]) -> Self {
        let tokens: Vec<Token> = Lexer::new(source).collect();
        let (partner, enclosing) = pair_brackets(&tokens);
        Self {
            source,
            tokens,
            partner,
            enclosing,
            rules,
            line_index: LineIndex::new(source),
            writer: RecordingWriter::new(),
            cursor: 0,
            pending: Vec::new(),
            scopes: Vec::new(),
            bodies: FxHashMap::default(),
            error_vars: 0,
        }
    }

    fn run(mut self) -> Result<RewriteOutput, RewriteError> {
        let mut i = 0;
        while self.kind(i) != TokenKind::Eof {
            self.track_scopes(i);
            i = match self.apply_rules(i)? {
                Some(next) => next,
                None => {
                    self.check_stray(i)?;
                    i + 1
                }
            };
        }
        self.copy_to(self.source.len());

        let (text, records) = self.writer.finish();
        Ok(RewriteOutput {
            text,
            records,
            pending: self.pending,
        })
    }

    fn apply_rules(&mut self, i: usize) -> Result<Option<usize>, RewriteError> {
        let statement = self.is_statement_start(i);
        let kind = self.kind(i);
        let rules = self.rules;
        for rule in rules {
            let applied = match rule {
                Rule::Enum if kind == TokenKind::Enum => Some(self.rewrite_enum(i)?),
                Rule::Match if statement && kind == TokenKind::Match => {
                    Some(self.rewrite_match(i)?)
                }
                Rule::Lambda if self.at_lambda(i) => Some(self.rewrite_lambda(i)?),
                Rule::SafeNav if self.at_chain_start(i) => self.rewrite_safe_nav(i)?,
                Rule::ErrorPropagation if statement => self.rewrite_propagation(i)?,
                Rule::Let if statement && kind == TokenKind::Let => Some(self.rewrite_let(i)?),
                _ => None,
            };
            if applied.is_some() {
                return Ok(applied);
            }
        }
        Ok(None)
    }

    /// Rejects sugar tokens no rule claimed.
    fn check_stray(&self, i: usize) -> Result<(), RewriteError> {
        match self.kind(i) {
            TokenKind::Question if self.rules.contains(&Rule::ErrorPropagation) => {
                let next = self.next_sig(i);
                let reason = if self.ends_statement_at(next) {
                    RewriteErrorKind::NotAStatement
                } else {
                    RewriteErrorKind::QuestionNotAtEnd
                };
                Err(self.error(Rule::ErrorPropagation.id(), self.span(i), reason))
            }
            TokenKind::QuestionDot if self.rules.contains(&Rule::SafeNav) => Err(self.error(
                Rule::SafeNav.id(),
                self.span(i),
                RewriteErrorKind::Malformed {
                    construct: "safe navigation",
                    message: "`?.` must follow a plain selector chain".to_string(),
                },
            )),
            _ => Ok(()),
        }
    }

    fn track_scopes(&mut self, i: usize) {
        while self.scopes.last().is_some_and(|scope| scope.close <= i) {
            self.scopes.pop();
        }
        match self.kind(i) {
            TokenKind::Func => {
                if let Some((open, signature)) = self.parse_signature(i) {
                    self.bodies.insert(open, signature);
                }
            }
            TokenKind::LBrace => {
                if let Some(signature) = self.bodies.remove(&i) {
                    let close = self.partner(i).unwrap_or(self.tokens.len());
                    self.scopes.push(FuncScope { signature, close });
                }
            }
            _ => {}
        }
    }

    // === Token navigation ===

    pub(crate) fn kind(&self, i: usize) -> TokenKind {
        self.tokens.get(i).map_or(TokenKind::Eof, |t| t.kind)
    }

    pub(crate) fn span(&self, i: usize) -> Span {
        match self.tokens.get(i) {
            Some(token) => token.span,
            None => Span::empty(text_size::TextSize::from(self.source.len() as u32)),
        }
    }

    pub(crate) fn text(&self, i: usize) -> &'src str {
        self.span(i).slice(self.source)
    }

    pub(crate) fn partner(&self, i: usize) -> Option<usize> {
        self.partner.get(i).copied().flatten()
    }

    pub(crate) fn at_file_scope(&self, i: usize) -> bool {
        self.enclosing.get(i).copied().flatten().is_none()
    }

    /// Index of the next non-comment token; newlines are significant.
    pub(crate) fn next_sig(&self, i: usize) -> usize {
        let last = self.tokens.len() - 1;
        let mut j = i + 1;
        while j < last && self.kind(j).is_trivia() {
            j += 1;
        }
        j.min(last)
    }

    /// Index of the next token that is neither a comment nor a newline.
    pub(crate) fn next_code(&self, i: usize) -> usize {
        let mut j = self.next_sig(i);
        while self.kind(j) == TokenKind::Newline {
            j = self.next_sig(j);
        }
        j
    }

    /// Index of the previous non-comment token.
    pub(crate) fn prev_sig(&self, i: usize) -> Option<usize> {
        (0..i).rev().find(|&j| !self.kind(j).is_trivia())
    }

    /// Skips a bracket pair starting at `i`, or a single token otherwise.
    pub(crate) fn skip_group(&self, i: usize) -> Option<usize> {
        if self.kind(i).is_opener() {
            self.partner(i).map(|close| close + 1)
        } else {
            Some(i + 1)
        }
    }

    /// Returns true if the newline at `i` terminates a statement.
    fn terminating_newline(&self, i: usize) -> bool {
        match self.prev_sig(i) {
            None => true,
            Some(prev) => match self.kind(prev) {
                TokenKind::Operator => matches!(self.text(prev), "++" | "--"),
                TokenKind::Star
                | TokenKind::Comma
                | TokenKind::Dot
                | TokenKind::QuestionDot
                | TokenKind::Assign
                | TokenKind::Define
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::Pipe
                | TokenKind::PipePipe
                | TokenKind::FatArrow
                | TokenKind::Arrow => false,
                _ => true,
            },
        }
    }

    /// Returns true if the token at `i` ends the statement before it.
    pub(crate) fn ends_statement_at(&self, i: usize) -> bool {
        match self.kind(i) {
            TokenKind::Newline => self.terminating_newline(i),
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => true,
            _ => false,
        }
    }

    /// Returns true if a statement starts at `i`.
    pub(crate) fn is_statement_start(&self, i: usize) -> bool {
        let in_block = match self.enclosing.get(i).copied().flatten() {
            None => true,
            Some(open) => self.kind(open) == TokenKind::LBrace,
        };
        if !in_block || self.kind(i) == TokenKind::Newline || self.kind(i).is_trivia() {
            return false;
        }
        match self.prev_sig(i) {
            None => true,
            Some(prev) => match self.kind(prev) {
                TokenKind::Semicolon => true,
                TokenKind::Newline => self.terminating_newline(prev),
                _ => false,
            },
        }
    }

    /// Index of the token terminating the statement that starts at `i`.
    pub(crate) fn statement_end(&self, i: usize) -> usize {
        let mut j = i;
        loop {
            let kind = self.kind(j);
            if kind == TokenKind::Eof || kind.is_closer() || self.ends_statement_at(j) {
                return j;
            }
            match self.skip_group(j) {
                Some(next) => j = next,
                None => return self.tokens.len() - 1,
            }
        }
    }

    /// Returns true if the token at `i` ends an operand.
    pub(crate) fn ends_operand(&self, i: usize) -> bool {
        match self.kind(i) {
            TokenKind::Ident => !is_go_keyword(self.text(i)),
            TokenKind::Number
            | TokenKind::String
            | TokenKind::RawString
            | TokenKind::Rune
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace => true,
            _ => false,
        }
    }

    /// Returns true if the token at `i` opens a lambda.
    pub(crate) fn at_lambda(&self, i: usize) -> bool {
        matches!(self.kind(i), TokenKind::Pipe | TokenKind::PipePipe)
            && !self.prev_sig(i).is_some_and(|prev| self.ends_operand(prev))
    }

    /// Returns true if the token at `i` starts a selector chain.
    pub(crate) fn at_chain_start(&self, i: usize) -> bool {
        self.kind(i) == TokenKind::Ident
            && !is_go_keyword(self.text(i))
            && !self
                .prev_sig(i)
                .is_some_and(|prev| matches!(self.kind(prev), TokenKind::Dot | TokenKind::QuestionDot))
    }

    /// Span from the start of token `first` to the end of token `last`.
    pub(crate) fn cover(&self, first: usize, last: usize) -> Span {
        self.span(first).cover(self.span(last))
    }

    /// Fragment for the tokens in `first..end`, ignoring trailing comments.
    pub(crate) fn fragment(&self, first: usize, end: usize) -> Fragment {
        let last = self.prev_sig(end).filter(|&last| last >= first).unwrap_or(first);
        Fragment::slice(self.source, self.cover(first, last))
    }

    /// Fragment for the text between two offsets, trimmed of whitespace.
    pub(crate) fn trimmed_fragment(&self, start: usize, end: usize) -> Fragment {
        let raw = &self.source[start..end];
        let leading = raw.len() - raw.trim_start().len();
        let trimmed = raw.trim();
        let start = start + leading;
        Fragment::slice(self.source, Span::from_usize(start, start + trimmed.len()))
    }

    /// Leading whitespace of the line containing `offset`.
    pub(crate) fn indent_of(&self, offset: usize) -> &'src str {
        let line_start = self.source[..offset].rfind('\n').map_or(0, |p| p + 1);
        let line = &self.source[line_start..];
        let width = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..width]
    }

    /// Fails if any token in `from..to` starts a sugar construct.
    pub(crate) fn ensure_plain(
        &self,
        from: usize,
        to: usize,
        outer: &'static str,
        rule: Rule,
    ) -> Result<(), RewriteError> {
        for j in from..to {
            let inner = match self.kind(j) {
                TokenKind::Let => "let",
                TokenKind::Enum => "enum",
                TokenKind::Match | TokenKind::FatArrow => "match",
                TokenKind::Question => "error propagation",
                TokenKind::QuestionDot => "safe navigation",
                TokenKind::Pipe | TokenKind::PipePipe if self.at_lambda(j) => "lambda",
                _ => continue,
            };
            return Err(self.error(
                rule.id(),
                self.span(j),
                RewriteErrorKind::DisallowedNesting { inner, outer },
            ));
        }
        Ok(())
    }

    pub(crate) fn error(&self, rule: RuleId, span: Span, reason: RewriteErrorKind) -> RewriteError {
        RewriteError {
            rule,
            position: self.line_index.position(span.start).unwrap_or_default(),
            span,
            reason,
        }
    }

    pub(crate) fn malformed(&self, rule: Rule, i: usize, construct: &'static str, message: &str) -> RewriteError {
        self.error(
            rule.id(),
            self.span(i),
            RewriteErrorKind::Malformed {
                construct,
                message: message.to_string(),
            },
        )
    }

    pub(crate) fn unbalanced(&self, rule: Rule, i: usize) -> RewriteError {
        self.error(rule.id(), self.span(i), RewriteErrorKind::Unbalanced(self.kind(i).name()))
    }

    // === Emission ===

    /// Copies original text up to `offset`.
    pub(crate) fn copy_to(&mut self, offset: usize) {
        if offset > self.cursor {
            let span = Span::from_usize(self.cursor, offset);
            self.writer.copy(span, span.slice(self.source));
            self.cursor = offset;
        }
    }

    /// Drops original text up to `offset`.
    pub(crate) fn skip_to(&mut self, offset: usize) {
        self.cursor = self.cursor.max(offset);
    }

    /// Carries an original region into synthesized output.
    pub(crate) fn carry(&mut self, span: Span, name: Option<SmolStr>) {
        self.writer.carry(span, span.slice(self.source), name);
    }

    pub(crate) fn synthesize(&mut self, rule: Rule, anchor: Span, text: &str) {
        self.writer.synthesize(rule.id(), anchor, text);
    }

    /// Emits a stub for a construct the structural pass expands.
    pub(crate) fn emit_stub(&mut self, rule: Rule, kind: PendingKind, original: Span, stub: &str) {
        let start = self.writer.generated_offset();
        self.writer.synthesize(rule.id(), original, stub);
        let stub = Span::new(start, self.writer.generated_offset());
        self.pending.push(PendingNode {
            kind,
            original,
            stub,
        });
    }
}

/// Pairs brackets, returning each bracket's partner and each token's innermost
/// enclosing opener.
fn pair_brackets(tokens: &[Token]) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
    let mut partner = vec![None; tokens.len()];
    let mut enclosing = vec![None; tokens.len()];
    let mut stack: Vec<usize> = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        if token.kind.is_closer() {
            if let Some(&open) = stack.last() {
                if tokens[open].kind.closer() == Some(token.kind) {
                    stack.pop();
                    partner[open] = Some(idx);
                    partner[idx] = Some(open);
                }
            }
        }
        enclosing[idx] = stack.last().copied();
        if token.kind.is_opener() {
            stack.push(idx);
        }
    }

    (partner, enclosing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn with_rewriter<T>(source: &str, f: impl FnOnce(&Rewriter<'_>) -> T) -> T {
        let rules = Rule::ALL;
        let rewriter = Rewriter::new(source, &rules);
        f(&rewriter)
    }

    #[test]
    fn test_pair_brackets() {
        with_rewriter("f(a[1], {b})", |r| {
            assert_eq!(r.partner(1), Some(10));
            assert_eq!(r.partner(3), Some(5));
            assert_eq!(r.partner(7), Some(9));
            assert!(r.at_file_scope(0));
            assert!(!r.at_file_scope(2));
        });
    }

    #[test]
    fn test_unpaired_bracket_has_no_partner() {
        with_rewriter("f(a]", |r| {
            assert_eq!(r.partner(1), None);
            assert_eq!(r.partner(3), None);
        });
    }

    #[test]
    fn test_statement_starts() {
        // x := a +\n b\n y
        with_rewriter("x := a +\n b\ny", |r| {
            assert!(r.is_statement_start(0));
            assert!(!r.is_statement_start(2));
            assert!(!r.is_statement_start(5));
            assert!(r.is_statement_start(7));
        });
    }

    #[test]
    fn test_statement_inside_parens_is_not_a_start() {
        with_rewriter("f(\n a,\n b)", |r| {
            assert!(!r.is_statement_start(3));
            assert!(!r.is_statement_start(6));
        });
    }

    #[test]
    fn test_statement_end_skips_groups() {
        with_rewriter("x := f(a,\n b)\ny", |r| {
            assert_eq!(r.kind(r.statement_end(0)), TokenKind::Newline);
            assert_eq!(r.statement_end(0), 9);
        });
    }

    #[test]
    fn test_lambda_position() {
        with_rewriter("a | b; f(|x| x)", |r| {
            assert!(!r.at_lambda(1));
            assert!(r.at_lambda(6));
        });
        with_rewriter("return |x| x", |r| assert!(r.at_lambda(1)));
    }

    #[test]
    fn test_indent_of() {
        with_rewriter("func f() {\n\t\tx := 1\n}", |r| {
            let offset = r.source.find('x').unwrap();
            assert_eq!(r.indent_of(offset), "\t\t");
        });
    }
}
