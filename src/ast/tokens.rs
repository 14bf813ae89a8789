use serde::Serialize;

/// Token classes produced by the [`Scanner`](crate::lexer::Scanner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// End of input
    Eof,

    /// Input the scanner could not make sense of (unterminated quote, bad base64).
    ///
    /// The parser rejects it and quotes the literal back to the caller.
    Illegal,

    /// A run of whitespace
    Whitespace,

    /// `(`
    LParen,

    /// `)`
    RParen,

    /// A `:` that does not terminate a tag
    Colon,

    /// `,`
    Comma,

    /// One of `and`, `or`, `not`, `gt`, `gte`, `lt`, `lte`, `match`.
    ///
    /// Only emitted when the word is immediately followed by `(`.
    ///
    /// # Examples
    /// ```text
    /// and(a:1,b:2)
    /// gt(score:10)
    /// ```
    Keyword,

    /// A tag terminated by `:`; the colon is consumed but not part of the literal.
    ///
    /// # Examples
    /// ```text
    /// status:active   // "status"
    /// /na.*/:bob      // "/na.*/"
    /// ```
    TagCategory,

    /// Any other tag
    ///
    /// # Examples
    /// ```text
    /// active
    /// "two words"
    /// val*
    /// b"Lw=="
    /// ```
    TagValue,
}

/// A scanned token together with its literal text and byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, offset: usize) -> Self {
        Token {
            kind,
            literal: literal.into(),
            offset,
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self.kind, TokenKind::Eof | TokenKind::RParen | TokenKind::Comma)
    }
}
