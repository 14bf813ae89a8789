use std::fmt;

use thiserror::Error;

use crate::{
    ast::{Op, QueryNode, QueryTree, Term, Token, TokenKind},
    lexer::{ScanOptions, Scanner},
};

/// Category bare terms bind to when the caller names no primary field.
pub const DEFAULT_PRIMARY: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    IllegalToken,
    UnexpectedTerminator,
    EmptyGroup,
    InvalidWhitespace,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::IllegalToken => write!(f, "illegal token"),
            SyntaxErrorKind::UnexpectedTerminator => write!(f, "unexpected terminator"),
            SyntaxErrorKind::EmptyGroup => write!(f, "empty group"),
            SyntaxErrorKind::InvalidWhitespace => write!(f, "invalid whitespace"),
        }
    }
}

/// A search string that does not follow the grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error: {kind} near {literal:?} at offset {offset}")]
pub struct ParseError {
    pub kind: SyntaxErrorKind,
    pub literal: String,
    pub offset: usize,
}

impl ParseError {
    fn at(kind: SyntaxErrorKind, token: &Token) -> Self {
        ParseError {
            kind,
            literal: token.literal.clone(),
            offset: token.offset,
        }
    }
}

pub struct Parser {
    scanner: Scanner,
    current_token: Token,
    primary: String,
}

impl Parser {
    pub fn new(scanner: Scanner) -> Self {
        Parser::with_primary(scanner, DEFAULT_PRIMARY)
    }

    /// Bare terms (no `category:`) become leaves on `primary`.
    pub fn with_primary(mut scanner: Scanner, primary: &str) -> Self {
        let current_token = scanner.next_token();
        Parser {
            scanner,
            current_token,
            primary: if primary.is_empty() {
                DEFAULT_PRIMARY.to_string()
            } else {
                primary.to_string()
            },
        }
    }

    fn advance(&mut self) {
        self.current_token = self.scanner.next_token();
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_token.kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if !self.check(kind) {
            return Err(ParseError::at(
                SyntaxErrorKind::IllegalToken,
                &self.current_token,
            ));
        }
        self.advance();
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while self.check(TokenKind::Whitespace) {
            self.advance();
        }
    }

    /// Parses the whole input. The root is an `and` group; an empty search
    /// gives a root without children.
    pub fn parse(&mut self) -> Result<QueryTree, ParseError> {
        let mut root = QueryNode::group(Op::And, Op::Match);
        root.children = self.parse_list(Op::Match)?;

        if self.check(TokenKind::RParen) {
            return Err(ParseError::at(
                SyntaxErrorKind::UnexpectedTerminator,
                &self.current_token,
            ));
        }
        Ok(QueryTree::new(root))
    }

    /// Siblings separated by commas or whitespace, up to `)` or end of input.
    fn parse_list(&mut self, comp: Op) -> Result<Vec<QueryNode>, ParseError> {
        let mut children = vec![];

        loop {
            self.skip_whitespace();
            match self.current_token.kind {
                TokenKind::Eof | TokenKind::RParen => break,
                TokenKind::Comma => self.advance(),
                _ => children.push(self.parse_item(comp)?),
            }
        }
        Ok(children)
    }

    fn parse_item(&mut self, comp: Op) -> Result<QueryNode, ParseError> {
        match self.current_token.kind {
            TokenKind::Keyword => self.parse_group(comp),
            TokenKind::TagValue => {
                let value = Term::from_literal(self.current_token.literal.clone());
                self.advance();
                Ok(QueryNode::leaf(
                    comp,
                    Term::Literal(self.primary.clone()),
                    Some(value),
                ))
            }
            TokenKind::TagCategory => self.parse_tag(comp),
            _ => Err(ParseError::at(
                SyntaxErrorKind::IllegalToken,
                &self.current_token,
            )),
        }
    }

    fn parse_group(&mut self, comp: Op) -> Result<QueryNode, ParseError> {
        let keyword = self.current_token.clone();
        let op = Op::from_keyword(&keyword.literal)
            .ok_or_else(|| ParseError::at(SyntaxErrorKind::IllegalToken, &keyword))?;
        self.advance();
        self.expect(TokenKind::LParen)?;

        // and/or/not pass the surrounding comparison down
        let comp = if op.is_comparison() { op } else { comp };
        let mut node = QueryNode::group(op, comp);
        node.children = self.parse_list(comp)?;

        if node.children.is_empty() {
            return Err(ParseError::at(SyntaxErrorKind::EmptyGroup, &keyword));
        }
        if self.check(TokenKind::RParen) {
            self.advance();
        }
        Ok(node)
    }

    fn parse_tag(&mut self, comp: Op) -> Result<QueryNode, ParseError> {
        let tag = self.current_token.clone();
        if tag.literal.is_empty() {
            return Err(ParseError::at(SyntaxErrorKind::IllegalToken, &tag));
        }
        let category = Term::from_literal(tag.literal.clone());

        self.scanner.expect_value();
        self.advance();

        if self.check(TokenKind::Whitespace) {
            let space = self.current_token.clone();
            self.advance();
            if self.current_token.is_terminator() {
                return Err(ParseError {
                    kind: SyntaxErrorKind::InvalidWhitespace,
                    literal: tag.literal,
                    offset: space.offset,
                });
            }
        }

        let value = match self.current_token.kind {
            TokenKind::TagValue => {
                let value = Term::from_literal(self.current_token.literal.clone());
                self.advance();
                Some(value)
            }
            TokenKind::Eof | TokenKind::RParen | TokenKind::Comma => None,
            _ => {
                return Err(ParseError::at(
                    SyntaxErrorKind::IllegalToken,
                    &self.current_token,
                ));
            }
        };

        Ok(QueryNode::leaf(comp, category, value))
    }
}

/// Parses `input` with default scanner options and the `id` primary field.
pub fn parse(input: &str) -> Result<QueryTree, ParseError> {
    Parser::new(Scanner::new(input)).parse()
}

/// Parses `input` binding bare terms to `primary`.
pub fn parse_with(
    input: &str,
    primary: &str,
    options: ScanOptions,
) -> Result<QueryTree, ParseError> {
    Parser::with_primary(Scanner::with_options(input, options), primary).parse()
}
