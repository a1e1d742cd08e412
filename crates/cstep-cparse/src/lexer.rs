// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Lexer (tokenizer) for C source code.
//!
//! Produces byte-offset [`Lexeme`]s. Comments and preprocessor directives are
//! skipped rather than tokenized: their text stays in the source and ends up
//! as gap text in the CST, exactly like whitespace.

use cstep_core::LineIndex;

use crate::error::ParseError;
use crate::tree::{Location, TokenKind};

/// A token with byte offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Lexeme {
    pub fn is(&self, text: &str) -> bool {
        self.kind != TokenKind::Literal && self.text == text
    }
}

const KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "_Bool",
];

/// Punctuators, longest first so the first match wins.
const PUNCTUATORS: &[&str] = &[
    "...", "<<=", ">>=", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "*=",
    "/=", "%=", "+=", "-=", "&=", "^=", "|=", "[", "]", "(", ")", "{", "}", ".", "&", "*", "+",
    "-", "~", "!", "/", "%", "<", ">", "^", "|", "?", ":", ";", "=", ",",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Lexer for C source code
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    position: usize,
    index: LineIndex,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source string.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            position: 0,
            index: LineIndex::new(source),
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(mut self) -> Result<Vec<Lexeme>, ParseError> {
        let mut out = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.position >= self.bytes.len() {
                break;
            }
            out.push(self.next_lexeme()?);
        }
        Ok(out)
    }

    pub fn location(&self, offset: usize) -> Location {
        let (line, column) = self.index.position(offset);
        Location::new(line, column)
    }

    fn error(&self, message: impl Into<String>, start: usize, end: usize) -> ParseError {
        ParseError::syntax(message, self.location(start), self.location(end))
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.position + ahead).copied()
    }

    fn at_line_start(&self) -> bool {
        self.bytes[..self.position]
            .iter()
            .rev()
            .take_while(|&&b| b != b'\n')
            .all(|b| b.is_ascii_whitespace())
    }

    /// Skip whitespace, comments and preprocessor directives.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        while let Some(byte) = self.peek(0) {
            match byte {
                b' ' | b'\t' | b'\r' | b'\n' | 0x0b | 0x0c => self.position += 1,
                b'/' if self.peek(1) == Some(b'/') => {
                    while let Some(b) = self.peek(0) {
                        if b == b'\n' {
                            break;
                        }
                        self.position += 1;
                    }
                }
                b'/' if self.peek(1) == Some(b'*') => {
                    let start = self.position;
                    match self.source[self.position + 2..].find("*/") {
                        Some(rel) => self.position += 2 + rel + 2,
                        None => {
                            return Err(self.error("unterminated comment", start, start + 2))
                        }
                    }
                }
                b'#' if self.at_line_start() => self.skip_directive(),
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_directive(&mut self) {
        while let Some(b) = self.peek(0) {
            if b == b'\\' && self.peek(1) == Some(b'\n') {
                self.position += 2;
                continue;
            }
            if b == b'\\' && self.peek(1) == Some(b'\r') && self.peek(2) == Some(b'\n') {
                self.position += 3;
                continue;
            }
            if b == b'\n' {
                break;
            }
            self.position += 1;
        }
    }

    fn next_lexeme(&mut self) -> Result<Lexeme, ParseError> {
        let start = self.position;
        let byte = self.bytes[start];

        // Prefixed character and string literals: L'x', u8"..", U"..".
        let prefix_len = match (byte, self.peek(1), self.peek(2)) {
            (b'u', Some(b'8'), Some(b'"')) => Some(2),
            (b'L' | b'u' | b'U', Some(b'"' | b'\''), _) => Some(1),
            _ => None,
        };
        if let Some(len) = prefix_len {
            self.position += len;
            return self.quoted(start);
        }

        if byte == b'"' || byte == b'\'' {
            return self.quoted(start);
        }
        if byte.is_ascii_digit() || (byte == b'.' && self.peek(1).is_some_and(|b| b.is_ascii_digit())) {
            return Ok(self.number(start));
        }
        if byte.is_ascii_alphabetic() || byte == b'_' {
            while self
                .peek(0)
                .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
            {
                self.position += 1;
            }
            let text = &self.source[start..self.position];
            let kind = if is_keyword(text) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            return Ok(self.lexeme(kind, start));
        }
        for punct in PUNCTUATORS {
            if self.bytes[start..].starts_with(punct.as_bytes()) {
                self.position += punct.len();
                return Ok(self.lexeme(TokenKind::Punctuation, start));
            }
        }
        let ch = self.source[start..].chars().next().unwrap_or('?');
        Err(self.error(
            format!("unexpected character '{}'", ch),
            start,
            start + ch.len_utf8(),
        ))
    }

    fn lexeme(&self, kind: TokenKind, start: usize) -> Lexeme {
        Lexeme {
            kind,
            text: self.source[start..self.position].to_string(),
            start,
            end: self.position,
        }
    }

    /// A character or string literal; `position` is at the opening quote.
    fn quoted(&mut self, start: usize) -> Result<Lexeme, ParseError> {
        let quote = self.bytes[self.position];
        self.position += 1;
        loop {
            match self.peek(0) {
                None | Some(b'\n') => {
                    let what = if quote == b'"' { "string" } else { "character" };
                    return Err(self.error(
                        format!("unterminated {} literal", what),
                        start,
                        self.position,
                    ));
                }
                Some(b'\\') => self.position += 2,
                Some(b) if b == quote => {
                    self.position += 1;
                    break;
                }
                Some(_) => self.position += 1,
            }
        }
        self.position = self.position.min(self.bytes.len());
        Ok(self.lexeme(TokenKind::Literal, start))
    }

    /// A pp-number: digits, letters, `.`, and signs after exponents.
    fn number(&mut self, start: usize) -> Lexeme {
        while let Some(b) = self.peek(0) {
            let exponent_sign = (b == b'+' || b == b'-')
                && matches!(self.bytes[self.position - 1], b'e' | b'E' | b'p' | b'P');
            if b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || exponent_sign {
                self.position += 1;
            } else {
                break;
            }
        }
        self.lexeme(TokenKind::Literal, start)
    }
}

/// True for numeric literal text that denotes a floating constant.
pub fn is_floating_literal(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("0x") {
        return lower.contains('p');
    }
    lower.contains('.') || lower.contains('e')
}
