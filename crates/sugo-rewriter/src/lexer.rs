//! Sugo lexer using logos.
//!
//! The lexer tokenizes Go source plus the sugo extensions:
//! - keywords `let`, `enum` and `match`
//! - the `=>` arm separator and `->` lambda result arrow
//! - `?` error propagation and `?.` safe navigation
//!
//! Horizontal whitespace is skipped. Newlines and comments are kept as tokens
//! because statement boundaries and verbatim copying depend on them.

use logos::Logos;
use source_map::Span;
use text_size::TextSize;

/// A token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span of the token in the source.
    pub span: Span,
}

/// Token kinds for sugo source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Default)]
#[logos(skip r"[ \t\r\f]+")]
pub enum TokenKind {
    // === Sugo keywords ===
    /// `let`
    #[token("let")]
    Let,

    /// `enum`
    #[token("enum")]
    Enum,

    /// `match`
    #[token("match")]
    Match,

    /// `func`
    #[token("func")]
    Func,

    // === Delimiters ===
    /// `{`
    #[token("{")]
    LBrace,

    /// `}`
    #[token("}")]
    RBrace,

    /// `(`
    #[token("(")]
    LParen,

    /// `)`
    #[token(")")]
    RParen,

    /// `[`
    #[token("[")]
    LBracket,

    /// `]`
    #[token("]")]
    RBracket,

    // === Punctuation ===
    /// `,`
    #[token(",")]
    Comma,

    /// `;`
    #[token(";")]
    Semicolon,

    /// `:`
    #[token(":")]
    Colon,

    /// `:=`
    #[token(":=")]
    Define,

    /// `=`
    #[token("=")]
    Assign,

    /// `=>`
    #[token("=>")]
    FatArrow,

    /// `->`
    #[token("->")]
    Arrow,

    /// `?.`
    #[token("?.")]
    QuestionDot,

    /// `?`
    #[token("?")]
    Question,

    /// `|`
    #[token("|")]
    Pipe,

    /// `||`
    #[token("||")]
    PipePipe,

    /// `.`
    #[token(".")]
    Dot,

    /// `...`
    #[token("...")]
    Ellipsis,

    /// `*`
    #[token("*")]
    Star,

    /// Any other Go operator.
    #[token("+")]
    #[token("-")]
    #[token("/")]
    #[token("%")]
    #[token("&")]
    #[token("^")]
    #[token("<")]
    #[token(">")]
    #[token("!")]
    #[token("~")]
    #[token("==")]
    #[token("!=")]
    #[token("<=")]
    #[token(">=")]
    #[token("&&")]
    #[token("<<")]
    #[token(">>")]
    #[token("&^")]
    #[token("++")]
    #[token("--")]
    #[token("<-")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("<<=")]
    #[token(">>=")]
    #[token("&^=")]
    Operator,

    // === Literals and trivia ===
    /// An identifier or a Go keyword other than `func`.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    /// A numeric literal.
    #[regex(r"[0-9][0-9a-zA-Z_]*(\.[0-9a-zA-Z_]*)?")]
    Number,

    /// An interpreted string literal.
    #[token("\"", |lex| quoted(lex, '"'))]
    String,

    /// A raw string literal.
    #[token("`", raw_string)]
    RawString,

    /// A rune literal.
    #[token("'", |lex| quoted(lex, '\''))]
    Rune,

    /// A `//` comment, up to the end of the line.
    #[token("//", line_comment)]
    LineComment,

    /// A `/* */` comment.
    #[token("/*", block_comment)]
    BlockComment,

    /// `\n`
    #[token("\n")]
    Newline,

    /// End of file.
    Eof,

    /// An invalid character.
    #[default]
    Error,
}

fn quoted(lex: &mut logos::Lexer<TokenKind>, quote: char) -> bool {
    let mut escaped = false;
    for (idx, ch) in lex.remainder().char_indices() {
        match ch {
            '\n' => return false,
            '\\' if !escaped => escaped = true,
            c if c == quote && !escaped => {
                lex.bump(idx + ch.len_utf8());
                return true;
            }
            _ => escaped = false,
        }
    }
    false
}

fn raw_string(lex: &mut logos::Lexer<TokenKind>) -> bool {
    match lex.remainder().find('`') {
        Some(idx) => {
            lex.bump(idx + 1);
            true
        }
        None => false,
    }
}

fn line_comment(lex: &mut logos::Lexer<TokenKind>) {
    let rest = lex.remainder();
    lex.bump(rest.find('\n').unwrap_or(rest.len()));
}

fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    match lex.remainder().find("*/") {
        Some(idx) => {
            lex.bump(idx + 2);
            true
        }
        None => false,
    }
}

/// Go keywords lexed as [`TokenKind::Ident`].
const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

impl TokenKind {
    /// Returns true for comment tokens.
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// Returns true if the token opens a bracket pair.
    pub fn is_opener(&self) -> bool {
        matches!(
            self,
            TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket
        )
    }

    /// Returns true if the token closes a bracket pair.
    pub fn is_closer(&self) -> bool {
        matches!(
            self,
            TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket
        )
    }

    /// Returns the closing kind for an opener.
    pub fn closer(&self) -> Option<TokenKind> {
        match self {
            TokenKind::LBrace => Some(TokenKind::RBrace),
            TokenKind::LParen => Some(TokenKind::RParen),
            TokenKind::LBracket => Some(TokenKind::RBracket),
            _ => None,
        }
    }

    /// Returns a human-readable name for the token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Let => "'let'",
            TokenKind::Enum => "'enum'",
            TokenKind::Match => "'match'",
            TokenKind::Func => "'func'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Define => "':='",
            TokenKind::Assign => "'='",
            TokenKind::FatArrow => "'=>'",
            TokenKind::Arrow => "'->'",
            TokenKind::QuestionDot => "'?.'",
            TokenKind::Question => "'?'",
            TokenKind::Pipe => "'|'",
            TokenKind::PipePipe => "'||'",
            TokenKind::Dot => "'.'",
            TokenKind::Ellipsis => "'...'",
            TokenKind::Star => "'*'",
            TokenKind::Operator => "operator",
            TokenKind::Ident => "identifier",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::RawString => "raw string",
            TokenKind::Rune => "rune",
            TokenKind::LineComment | TokenKind::BlockComment => "comment",
            TokenKind::Newline => "newline",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }
}

/// Returns true if `word` is a Go keyword.
pub fn is_go_keyword(word: &str) -> bool {
    GO_KEYWORDS.contains(&word)
}

/// Sugo lexer.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            source,
            finished: false,
        }
    }

    /// Returns the source being lexed.
    pub fn source(&self) -> &'src str {
        self.source
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let kind = match self.inner.next() {
            Some(Ok(kind)) => kind,
            Some(Err(())) => TokenKind::Error,
            None => {
                self.finished = true;
                let end = TextSize::from(self.source.len() as u32);
                return Some(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(end, end),
                });
            }
        };
        let span = self.inner.span();
        Some(Token {
            kind,
            span: Span::from_usize(span.start, span.end),
        })
    }
}
