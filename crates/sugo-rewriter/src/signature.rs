//! Function signatures, as far as error propagation needs them.

use crate::engine::Rewriter;
use crate::lexer::{is_go_keyword, TokenKind};

/// Result types of a function with a body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Signature {
    pub(crate) results: Vec<String>,
}

impl Signature {
    /// Returns true if the last result is `error`.
    pub(crate) fn returns_error(&self) -> bool {
        self.results.last().is_some_and(|ty| ty == "error")
    }

    /// Zero values for every result but the trailing error.
    pub(crate) fn zero_values(&self) -> Vec<String> {
        let leading = self.results.len().saturating_sub(1);
        self.results[..leading].iter().map(|ty| zero_value(ty)).collect()
    }
}

/// Returns the Go zero value expression for a type.
pub(crate) fn zero_value(ty: &str) -> String {
    let ty = ty.trim();
    match ty {
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32"
        | "uint64" | "uintptr" | "float32" | "float64" | "complex64" | "complex128" | "byte"
        | "rune" => "0".to_string(),
        "string" => "\"\"".to_string(),
        "bool" => "false".to_string(),
        "error" | "any" => "nil".to_string(),
        _ if ["*", "[]", "map[", "chan", "<-chan", "func", "interface"]
            .iter()
            .any(|prefix| ty.starts_with(prefix)) =>
        {
            "nil".to_string()
        }
        _ => format!("*new({ty})"),
    }
}

impl Rewriter<'_> {
    /// Parses the signature of the `func` at `i`.
    ///
    /// Returns the token index of the body's opening brace and the result
    /// types, or `None` for function types without a body.
    pub(crate) fn parse_signature(&self, i: usize) -> Option<(usize, Signature)> {
        let mut j = self.next_code(i);

        // Receiver, when followed by a method name.
        if self.kind(j) == TokenKind::LParen && self.at_file_scope(i) {
            let name = self.next_code(self.partner(j)?);
            let after = self.next_code(name);
            if self.kind(name) == TokenKind::Ident
                && matches!(self.kind(after), TokenKind::LParen | TokenKind::LBracket)
            {
                j = name;
            }
        }
        if self.kind(j) == TokenKind::Ident {
            j = self.next_code(j);
        }
        // Type parameters.
        if self.kind(j) == TokenKind::LBracket {
            j = self.next_code(self.partner(j)?);
        }
        if self.kind(j) != TokenKind::LParen {
            return None;
        }

        let first = self.next_sig(self.partner(j)?);
        let mut k = first;
        loop {
            match self.kind(k) {
                TokenKind::LBrace => break,
                TokenKind::Newline
                | TokenKind::Eof
                | TokenKind::Comma
                | TokenKind::Semicolon
                | TokenKind::Assign
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace => return None,
                _ => k = self.next_sig(self.skip_group(k)? - 1),
            }
        }

        let results = if first == k {
            Vec::new()
        } else if self.kind(first) == TokenKind::LParen && self.partner(first) == self.prev_sig(k) {
            self.parse_result_list(first + 1, self.partner(first)?)
        } else {
            vec![self.fragment(first, k).text]
        };

        Some((k, Signature { results }))
    }

    /// Parses a parenthesized result list, expanding grouped names.
    fn parse_result_list(&self, from: usize, to: usize) -> Vec<String> {
        let mut parts: Vec<(usize, usize)> = Vec::new();
        let mut start = self.next_code(from - 1);
        let mut j = start;
        while j < to {
            if self.kind(j) == TokenKind::Comma {
                parts.push((start, j));
                start = self.next_code(j);
                j = start;
                continue;
            }
            j = match self.skip_group(j) {
                Some(next) => next,
                None => break,
            };
        }
        if start < to {
            parts.push((start, to));
        }

        let named = parts.iter().any(|&(first, end)| {
            let second = self.next_code(first);
            second < end
                && self.kind(first) == TokenKind::Ident
                && !is_go_keyword(self.text(first))
                && self.kind(second) != TokenKind::Dot
        });

        if !named {
            return parts
                .iter()
                .map(|&(first, end)| self.fragment(first, end).text)
                .collect();
        }

        let mut results = vec![String::new(); parts.len()];
        let mut carried: Option<String> = None;
        for (idx, &(first, end)) in parts.iter().enumerate().rev() {
            let ty_start = self.next_code(first);
            if ty_start < end {
                let ty = self.fragment(ty_start, end).text;
                carried = Some(ty.clone());
                results[idx] = ty;
            } else if let Some(ty) = &carried {
                results[idx] = ty.clone();
            }
        }
        results
    }
}
