//! Module `scanner` implements a one‑pass, streaming lexer for Rox source text.
//!
//! It transforms a `&str` into a sequence of [`Token`]s, skipping whitespace and
//! comments, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input text.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, LoxError>` on each `.next()`. Lexical errors are
//!   interleaved with tokens; an error never ends the stream, so every bad
//!   character in a source is reported in a single pass.
//!
//! - `scan_tokens(src) -> (Vec<Token>, Vec<LoxError>)`
//!   Drains a scanner, splitting tokens from errors.
//!
//! # Token Recognition
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `*`.
//! - Two‑character operators: `!=`, `==`, `<=`, `>=`.
//! - String literals: `"` … `"`, allowing multi‑line and reporting unterminated errors.
//! - Numeric literals: integer and optional fractional part.
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a perfect‑hash `KEYWORDS` map.
//! - Comments are skipped in bulk via `memchr`.
//!
//! # Example
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let scanner = Scanner::new("print 123; // example");
//! for result in scanner {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Literal, Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memchr_iter};
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"const"  => TokenType::CONST,
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

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    src: &'a str,
    start: usize,                              // index of the *first* byte of the current lexeme
    curr: usize,                               // index *one past* the last byte examined
    line: usize,                               // 1‑based line counter (\n increments)
    pending: Option<(TokenType, Option<Literal>)>, // recognised token waiting to be emitted
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    /// Return the length of the input.
    #[inline(always)]
    fn len(&self) -> usize {
        self.src.len()
    }

    /// Are we at (or past) the end of input?
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it. Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Byte `offset` positions ahead of the cursor, or `0` past the end.
    #[inline(always)]
    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes().get(self.curr + offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        self.peek_at(1)
    }

    /// Consume the next byte only when it is `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        let hit = self.peek() == expected && !self.is_at_end();
        if hit {
            self.curr += 1;
        }
        hit
    }

    #[inline(always)]
    fn emit(&mut self, tt: TokenType) {
        self.pending = Some((tt, None));
    }

    /// Advance while the next byte satisfies `pred`.
    #[inline(always)]
    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        while !self.is_at_end() && pred(self.peek()) {
            self.curr += 1;
        }
    }

    /// `long` when the next byte is `=`, otherwise `short`.
    #[inline(always)]
    fn emit_with_equal(&mut self, long: TokenType, short: TokenType) {
        let tt = if self.match_byte(b'=') { long } else { short };
        self.emit(tt);
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* lexeme starting at `self.curr`. Whitespace and
    /// comments return `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => self.emit(TokenType::LEFT_PAREN),
            b')' => self.emit(TokenType::RIGHT_PAREN),
            b'{' => self.emit(TokenType::LEFT_BRACE),
            b'}' => self.emit(TokenType::RIGHT_BRACE),
            b',' => self.emit(TokenType::COMMA),
            b'.' => self.emit(TokenType::DOT),
            b'-' => self.emit(TokenType::MINUS),
            b'+' => self.emit(TokenType::PLUS),
            b';' => self.emit(TokenType::SEMICOLON),
            b'*' => self.emit(TokenType::STAR),

            // ── two‑character operators (!=, ==, <=, >=) ─────────────────
            b'!' => self.emit_with_equal(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.emit_with_equal(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.emit_with_equal(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.emit_with_equal(TokenType::GREATER_EQUAL, TokenType::GREATER),

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {
                return Ok(());
            }

            b'\n' => {
                self.line += 1;

                return Ok(());
            }

            // ── comments (// … until newline) ────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    // The newline itself is left for the main loop so the
                    // line counter stays correct.
                    match memchr(b'\n', &self.bytes()[self.curr..]) {
                        Some(pos) => self.curr += pos,
                        None => self.curr = self.len(),
                    }

                    return Ok(());
                }

                self.emit(TokenType::SLASH);
            }

            b'"' => {
                return self.parse_string();
            }

            b'0'..=b'9' => {
                self.parse_number();
            }

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            // ── unexpected character ─────────────────────────────────────
            _ => {
                // Skip UTF‑8 continuation bytes so the whole character is
                // consumed and slicing stays on a char boundary.
                self.skip_while(|c| (c & 0xC0) == 0x80);

                debug!(
                    "Unexpected character {:?} on line {}",
                    &self.src[self.start..self.curr],
                    self.line
                );

                return Err(LoxError::lex(self.line, "Unexpected character."));
            }
        }

        Ok(())
    }

    /// String body up to the closing `"`. Newlines inside the literal are
    /// counted; the literal value excludes the quotes.
    fn parse_string(&mut self) -> Result<()> {
        let rest: &[u8] = &self.bytes()[self.curr..];

        let Some(len) = memchr(b'"', rest) else {
            self.line += memchr_iter(b'\n', rest).count();
            self.curr = self.len();
            return Err(LoxError::lex(self.line, "Unterminated string."));
        };

        self.line += memchr_iter(b'\n', &rest[..len]).count();
        self.curr += len + 1;

        let value: &str = &self.src[self.start + 1..self.curr - 1];
        self.pending = Some((TokenType::STRING, Some(Literal::Str(value.to_owned()))));

        Ok(())
    }

    /// `123` or `3.14`; a dot must be followed by a digit to belong here.
    fn parse_number(&mut self) {
        self.skip_while(|c| c.is_ascii_digit());

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.curr += 1;
            self.skip_while(|c| c.is_ascii_digit());
        }

        let text: &str = &self.src[self.start..self.curr];
        let n: f64 = text.parse::<f64>().unwrap_or(0.0); // digits and at most one '.'

        self.pending = Some((TokenType::NUMBER, Some(Literal::Number(n))));
    }

    /// Identifier or keyword, decided by the perfect‑hash table.
    fn parse_identifier(&mut self) {
        self.skip_while(|c| c.is_ascii_alphanumeric() || c == b'_');

        let word: &[u8] = &self.bytes()[self.start..self.curr];
        let tt = KEYWORDS.get(word).copied().unwrap_or(TokenType::IDENTIFIER);

        self.emit(tt);
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr <= self.len() {
            // EOF guard – emit exactly one EOF then terminate.
            if self.curr == self.len() {
                self.curr += 1;
                return Some(Ok(Token::new(TokenType::EOF, "", None, self.line)));
            }

            self.start = self.curr;
            self.pending = None;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some((tt, literal)) = self.pending.take() {
                let lexeme: &str = &self.src[self.start..self.curr];
                debug!("Scanned token ({:?}) on line {}", tt, self.line);

                return Some(Ok(Token::new(tt, lexeme, literal, self.line)));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan all of `src`, separating tokens from lexical errors.
///
/// The token list always ends with `EOF`, even when errors were found.
pub fn scan_tokens(src: &str) -> (Vec<Token>, Vec<LoxError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for item in Scanner::new(src) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    info!(
        "Scanned {} token(s) with {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}
