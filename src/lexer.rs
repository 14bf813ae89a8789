use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};

use crate::ast::{Op, Token, TokenKind};

/// Stands in for a `*` that appeared inside quotes.
pub const QUOTED_STAR: char = '\u{E000}';
/// Stands in for a `?` that appeared inside quotes.
pub const QUOTED_QUESTION: char = '\u{E001}';
/// Stands in for a `/` that appeared inside quotes, so that `"/a/"` is not
/// read as a pattern.
pub const QUOTED_SLASH: char = '\u{E002}';

/// Caller controlled scanner behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Decode `b"..."` and `b/.../` literals in place.
    pub decode_base64: bool,
    /// Classify every tag as a category, used when scanning plain field lists.
    pub categories: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            decode_base64: true,
            categories: false,
        }
    }
}

pub struct Scanner {
    input: Vec<char>,
    position: usize,
    options: ScanOptions,
    value_next: bool,
}

impl Scanner {
    pub fn new(input: &str) -> Self {
        Scanner::with_options(input, ScanOptions::default())
    }

    pub fn with_options(input: &str, options: ScanOptions) -> Self {
        Scanner {
            input: input.chars().collect(),
            position: 0,
            options,
            value_next: false,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// The next tag is the value of a category: `:` no longer terminates it.
    ///
    /// Lasts until a non-whitespace token is scanned.
    pub fn expect_value(&mut self) {
        self.value_next = true;
    }

    fn text(&self, start: usize) -> String {
        self.input[start..self.position.min(self.input.len())]
            .iter()
            .collect()
    }

    /// Scans the next token. Malformed input yields [`TokenKind::Illegal`]
    /// rather than an error so that the parser can report it in context.
    pub fn next_token(&mut self) -> Token {
        let token = self.scan();
        if token.kind != TokenKind::Whitespace {
            self.value_next = false;
        }
        token
    }

    fn scan(&mut self) -> Token {
        let start = self.position;

        match self.current_char() {
            None => Token::new(TokenKind::Eof, "", start),
            Some(ch) if ch.is_whitespace() => {
                while self.current_char().is_some_and(char::is_whitespace) {
                    self.advance();
                }
                Token::new(TokenKind::Whitespace, self.text(start), start)
            }
            Some('(') => {
                self.advance();
                Token::new(TokenKind::LParen, "(", start)
            }
            Some(')') => {
                self.advance();
                Token::new(TokenKind::RParen, ")", start)
            }
            Some(',') => {
                self.advance();
                Token::new(TokenKind::Comma, ",", start)
            }
            Some(':') if !self.value_next => {
                self.advance();
                Token::new(TokenKind::Colon, ":", start)
            }
            Some(ch) if ch.is_ascii_alphabetic() => match self.keyword_ahead() {
                Some(op) => {
                    self.position += op.keyword().len();
                    Token::new(TokenKind::Keyword, op.keyword(), start)
                }
                None => self.scan_tag(start),
            },
            Some(_) => self.scan_tag(start),
        }
    }

    /// Matches `and(`, `or(`, ... at the cursor without consuming anything.
    fn keyword_ahead(&self) -> Option<Op> {
        Op::KEYWORDS.into_iter().find(|op| {
            let word = op.keyword();
            word.chars()
                .enumerate()
                .all(|(i, c)| self.peek_char(i) == Some(c))
                && self.peek_char(word.len()) == Some('(')
        })
    }

    fn scan_tag(&mut self, start: usize) -> Token {
        let mut buf = String::new();
        // b-literals may open a token or follow a bare wildcard
        let mut literal_start = true;

        loop {
            match self.current_char() {
                None => break,
                Some(':') if !self.value_next => {
                    let literal = buf;
                    self.advance();
                    return Token::new(TokenKind::TagCategory, literal, start);
                }
                Some(ch) if is_delimiter(ch) => break,
                Some('"') => {
                    if !self.read_quoted(&mut buf) {
                        return Token::new(TokenKind::Illegal, self.text(start), start);
                    }
                    literal_start = false;
                }
                Some('/') if self.position == start && self.closing_ahead('/', 1).is_some() => {
                    self.read_slashed(&mut buf);
                    literal_start = false;
                }
                Some('b') if literal_start && self.base64_ahead() => {
                    if !self.read_base64(&mut buf) {
                        return Token::new(TokenKind::Illegal, self.text(start), start);
                    }
                    literal_start = false;
                }
                Some(ch @ ('*' | '?')) => {
                    buf.push(ch);
                    self.advance();
                    literal_start = true;
                }
                Some(ch) => {
                    buf.push(ch);
                    self.advance();
                    literal_start = false;
                }
            }
        }

        let kind = if self.options.categories {
            TokenKind::TagCategory
        } else {
            TokenKind::TagValue
        };
        Token::new(kind, buf, start)
    }

    /// Reads a double quoted segment. Only `\"` is an escape; any other
    /// backslash is kept as written. Returns false when the quote never closes.
    fn read_quoted(&mut self, buf: &mut String) -> bool {
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            self.advance();
            match ch {
                '"' => return true,
                '\\' if self.current_char() == Some('"') => {
                    buf.push('"');
                    self.advance();
                }
                '*' => buf.push(QUOTED_STAR),
                '?' => buf.push(QUOTED_QUESTION),
                '/' => buf.push(QUOTED_SLASH),
                ch => buf.push(ch),
            }
        }
        false
    }

    /// Index (relative to the cursor) of the next unescaped `delim`, searching
    /// from `from` onwards.
    fn closing_ahead(&self, delim: char, from: usize) -> Option<usize> {
        let mut i = from;
        while let Some(ch) = self.peek_char(i) {
            if ch == '\\' {
                i += 2;
                continue;
            }
            if ch == delim {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    /// Copies a `/.../` segment verbatim, delimiters included.
    fn read_slashed(&mut self, buf: &mut String) {
        let Some(end) = self.closing_ahead('/', 1) else {
            return;
        };
        for _ in 0..=end {
            if let Some(ch) = self.current_char() {
                buf.push(ch);
            }
            self.advance();
        }
    }

    /// `b"`, `b/` or `b[annotation]"` / `b[annotation]/` at the cursor.
    fn base64_ahead(&self) -> bool {
        match self.peek_char(1) {
            Some('"') | Some('/') => true,
            Some('[') => match self.closing_ahead(']', 2) {
                Some(end) => matches!(self.peek_char(end + 1), Some('"') | Some('/')),
                None => false,
            },
            _ => false,
        }
    }

    fn read_base64(&mut self, buf: &mut String) -> bool {
        let raw_start = self.position;
        self.advance(); // b

        let mut annotation = String::new();
        if self.current_char() == Some('[') {
            self.advance();
            while let Some(ch) = self.current_char() {
                self.advance();
                if ch == ']' {
                    break;
                }
                annotation.push(ch);
            }
        }

        let Some(delim) = self.current_char() else {
            return false;
        };
        self.advance();

        let mut payload = String::new();
        loop {
            match self.current_char() {
                None => return false,
                Some(ch) if ch == delim => {
                    self.advance();
                    break;
                }
                Some(ch) => {
                    payload.push(ch);
                    self.advance();
                }
            }
        }

        if !self.options.decode_base64 {
            buf.push_str(&self.text(raw_start));
            return true;
        }

        let Some(decoded) = decode_base64(&payload, annotation == "url") else {
            return false;
        };

        if delim == '/' {
            buf.push('/');
            buf.push_str(&decoded);
            buf.push('/');
        } else {
            buf.extend(decoded.chars().map(|ch| match ch {
                '*' => QUOTED_STAR,
                '?' => QUOTED_QUESTION,
                '/' => QUOTED_SLASH,
                ch => ch,
            }));
        }
        true
    }
}

impl Iterator for Scanner {
    type Item = Token;

    /// Yields tokens up to, but not including, end of input.
    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}

fn is_delimiter(ch: char) -> bool {
    ch == '(' || ch == ')' || ch == ',' || ch.is_whitespace()
}

fn decode_base64(payload: &str, url_safe: bool) -> Option<String> {
    let bytes = if url_safe {
        URL_SAFE
            .decode(payload)
            .or_else(|_| URL_SAFE_NO_PAD.decode(payload))
    } else {
        STANDARD
            .decode(payload)
            .or_else(|_| STANDARD_NO_PAD.decode(payload))
    }
    .ok()?;
    String::from_utf8(bytes).ok()
}

/// True when `s` holds a bare (unquoted) `*` or `?`.
pub fn has_wildcard(s: &str) -> bool {
    s.contains(['*', '?'])
}

/// Turns quoted-character placeholders back into the characters the user typed.
pub fn restore_quoted(s: &str) -> String {
    s.chars()
        .map(|ch| match ch {
            QUOTED_STAR => '*',
            QUOTED_QUESTION => '?',
            QUOTED_SLASH => '/',
            ch => ch,
        })
        .collect()
}

#[test]
fn test_keywords() {
    let mut scanner = Scanner::new("and(or(not(gte(lte(match(");
    for word in ["and", "or", "not", "gte", "lte", "match"] {
        let token = scanner.next_token();
        assert_eq!(token.kind, TokenKind::Keyword);
        assert_eq!(token.literal, word);
        assert_eq!(scanner.next_token().kind, TokenKind::LParen);
    }
    assert_eq!(scanner.next_token().kind, TokenKind::Eof);
}

#[test]
fn test_keyword_needs_paren() {
    let mut scanner = Scanner::new("android");
    let token = scanner.next_token();
    assert_eq!(token.kind, TokenKind::TagValue);
    assert_eq!(token.literal, "android");
}

#[test]
fn test_value_may_contain_colon() {
    let mut scanner = Scanner::new("created: 10:30");
    assert_eq!(scanner.next_token().kind, TokenKind::TagCategory);
    scanner.expect_value();
    assert_eq!(scanner.next_token().kind, TokenKind::Whitespace);
    assert_eq!(
        scanner.next_token(),
        Token::new(TokenKind::TagValue, "10:30", 9)
    );
}

#[test]
fn test_category_and_value() {
    let mut scanner = Scanner::new("id:test");
    assert_eq!(
        scanner.next_token(),
        Token::new(TokenKind::TagCategory, "id", 0)
    );
    assert_eq!(scanner.next_token(), Token::new(TokenKind::TagValue, "test", 3));
    assert_eq!(scanner.next_token().kind, TokenKind::Eof);
}
