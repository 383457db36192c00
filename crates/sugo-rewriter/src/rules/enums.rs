//! `enum` declarations become sealed interfaces.
//!
//! ```text
//! enum Shape {             type Shape interface {
//!     Circle { r float64 }     isShape()
//!     Empty                }
//! }
//!                          type Circle struct { r float64 }
//!
//!                          func (Circle) isShape() {}
//!                          ...
//! ```

use super::Rule;
use crate::engine::Rewriter;
use crate::lexer::TokenKind;
use crate::{RewriteError, RewriteErrorKind};
use smol_str::SmolStr;
use source_map::Span;

struct Variant {
    name: usize,
    /// Text between the field braces.
    fields: Option<Span>,
}

impl Rewriter<'_> {
    /// Rewrites the `enum` declaration at `i`.
    pub(crate) fn rewrite_enum(&mut self, i: usize) -> Result<usize, RewriteError> {
        let keyword = self.span(i);
        if !self.at_file_scope(i) {
            return Err(self.error(Rule::Enum.id(), keyword, RewriteErrorKind::EnumNotAtFileScope));
        }

        let name = self.next_sig(i);
        if self.kind(name) != TokenKind::Ident {
            return Err(self.malformed(Rule::Enum, name, "enum", "expected a name"));
        }
        let open = self.next_code(name);
        if self.kind(open) != TokenKind::LBrace {
            return Err(self.malformed(Rule::Enum, open, "enum", "expected `{`"));
        }
        let close = self.partner(open).ok_or_else(|| self.unbalanced(Rule::Enum, open))?;

        let variants = self.parse_variants(open, close)?;
        if variants.is_empty() {
            return Err(self.malformed(Rule::Enum, open, "enum", "expected at least one variant"));
        }

        let enum_name = self.text(name);
        let marker = format!("is{enum_name}()");
        let rule = Rule::Enum;

        self.copy_to(keyword.start_usize());
        self.synthesize(rule, keyword, "type ");
        self.carry(self.span(name), Some(SmolStr::new(enum_name)));
        self.synthesize(rule, keyword, &format!(" interface {{\n\t{marker}\n}}"));

        for variant in &variants {
            let anchor = self.span(variant.name);
            self.synthesize(rule, anchor, "\n\ntype ");
            self.carry(anchor, Some(SmolStr::new(self.text(variant.name))));
            match variant.fields {
                Some(fields) => {
                    self.synthesize(rule, anchor, " struct {");
                    self.carry(fields, None);
                    self.synthesize(rule, anchor, "}");
                }
                None => self.synthesize(rule, anchor, " struct{}"),
            }
            self.synthesize(rule, anchor, "\n\nfunc (");
            self.carry(anchor, None);
            self.synthesize(rule, anchor, &format!(") {marker} {{}}"));
        }
        self.skip_to(self.span(close).end_usize());

        Ok(close + 1)
    }

    fn parse_variants(&self, open: usize, close: usize) -> Result<Vec<Variant>, RewriteError> {
        let mut variants = Vec::new();
        let mut j = self.next_code(open);
        while j < close {
            if self.kind(j) == TokenKind::Comma {
                j = self.next_code(j);
                continue;
            }
            if self.kind(j) != TokenKind::Ident {
                return Err(self.malformed(Rule::Enum, j, "enum", "expected a variant name"));
            }
            let name = j;
            let mut next = self.next_sig(name);
            let mut fields = None;
            if self.kind(next) == TokenKind::LBrace {
                let end = self.partner(next).ok_or_else(|| self.unbalanced(Rule::Enum, next))?;
                self.ensure_plain(next + 1, end, "enum", Rule::Enum)?;
                fields = Some(Span::new(self.span(next).end, self.span(end).start));
                next = self.next_sig(end);
            }
            if !matches!(self.kind(next), TokenKind::Comma | TokenKind::Newline) && next != close {
                return Err(self.malformed(
                    Rule::Enum,
                    next,
                    "enum",
                    "expected `,` or a newline after a variant",
                ));
            }
            variants.push(Variant { name, fields });
            j = if next == close { close } else { self.next_code(next) };
        }
        Ok(variants)
    }
}
