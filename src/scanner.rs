//! Streaming lexer.
//!
//! [`Scanner`] walks the source bytes once and yields `Result<Token>` items.
//! A lexing error never ends the stream: the item after an `Err` continues
//! from just past the offending input, and the stream always finishes with a
//! single `EOF` token.  [`scan_tokens`] drains a scanner into a `Vec`,
//! forwarding errors to a [`Reporter`].
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! for result in Scanner::new("print 123; // example") {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use crate::error::{LoxError, Reporter, Result};
use crate::token::{Token, TokenType};
use log::{debug, info, trace};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// What one step of the scanner found.
enum Lexeme {
    Token(TokenType),
    Skip,
}

pub struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    /// First byte of the lexeme being scanned.
    start: usize,
    /// Next unread byte.
    pos: usize,
    line: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        info!("Scanner created over {} bytes", text.len());

        Self {
            text,
            bytes: text.as_bytes(),
            start: 0,
            pos: 0,
            line: 1,
            done: false,
        }
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// The byte `offset` places ahead, or `0` past the end.
    #[inline(always)]
    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn bump(&mut self) -> u8 {
        let b: u8 = self.peek_at(0);
        self.pos += 1;
        b
    }

    #[inline(always)]
    fn eat(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek_at(0) == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// `one` or, if followed by `=`, `with_equal`.
    #[inline(always)]
    fn maybe_equal(&mut self, with_equal: TokenType, one: TokenType) -> TokenType {
        if self.eat(b'=') {
            with_equal
        } else {
            one
        }
    }

    fn lexeme(&self) -> &'a str {
        &self.text[self.start..self.pos]
    }

    fn scan(&mut self) -> Result<Lexeme> {
        let kind: TokenType = match self.bump() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,
            b'^' => TokenType::CARET,
            b'?' => TokenType::QUESTION,
            b':' => TokenType::COLON,

            b'!' => self.maybe_equal(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.maybe_equal(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.maybe_equal(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.maybe_equal(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.eat(b'/') => {
                // stop at the newline so the line counter still sees it
                self.pos = match memchr(b'\n', &self.bytes[self.pos..]) {
                    Some(offset) => self.pos + offset,
                    None => self.bytes.len(),
                };
                return Ok(Lexeme::Skip);
            }
            b'/' => TokenType::SLASH,

            b' ' | b'\r' | b'\t' => return Ok(Lexeme::Skip),

            b'\n' => {
                self.line += 1;
                return Ok(Lexeme::Skip);
            }

            b'"' => self.string()?,

            b'0'..=b'9' => self.number()?,

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // skip the whole code point, not just its first byte
                let ch: char = self.text[self.start..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                self.pos = self.start + ch.len_utf8();

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", ch),
                ));
            }
        };

        Ok(Lexeme::Token(kind))
    }

    /// Strings may span lines and have no escapes.
    fn string(&mut self) -> Result<TokenType> {
        while !self.is_at_end() && self.peek_at(0) != b'"' {
            if self.bump() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.pos += 1;

        let body: &str = &self.text[self.start + 1..self.pos - 1];
        Ok(TokenType::STRING(body.to_owned()))
    }

    /// `123` or `1.5`; a trailing `.` is left for the next token.
    fn number(&mut self) -> Result<TokenType> {
        while self.peek_at(0).is_ascii_digit() {
            self.pos += 1;
        }

        if self.peek_at(0) == b'.' && self.peek_at(1).is_ascii_digit() {
            self.pos += 1;

            while self.peek_at(0).is_ascii_digit() {
                self.pos += 1;
            }
        }

        let digits: &str = self.lexeme();

        match digits.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(TokenType::NUMBER(n)),

            Ok(_) => Err(LoxError::lex(
                self.line,
                format!("{} is out of range of a double.", digits),
            )),

            Err(_) => Err(LoxError::lex(
                self.line,
                format!("{} is an invalid number.", digits),
            )),
        }
    }

    fn identifier(&mut self) -> TokenType {
        while matches!(self.peek_at(0), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.pos += 1;
        }

        KEYWORDS
            .get(&self.bytes[self.start..self.pos])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.pos;

            match self.scan() {
                Ok(Lexeme::Skip) => continue,

                Ok(Lexeme::Token(kind)) => {
                    trace!("Scanned {:?} on line {}", kind, self.line);
                    return Some(Ok(Token::new(kind, self.lexeme(), self.line)));
                }

                Err(e) => return Some(Err(e)),
            }
        }

        self.done = true;
        Some(Ok(Token::new(TokenType::EOF, "", self.line)))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Lex the whole of `src`.  Errors go to `reporter`; the returned stream is
/// always terminated by an `EOF` token.
pub fn scan_tokens(src: &str, reporter: &mut Reporter) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();

    for result in Scanner::new(src) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => reporter.report(e),
        }
    }

    debug!("Scanned {} tokens", tokens.len());

    tokens
}
