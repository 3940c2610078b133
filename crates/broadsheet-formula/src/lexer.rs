//! Formula lexer
//!
//! Turns formula source text into a flat token stream. The lexer is a pure
//! function of its input: no context, no registry, no side effects. All
//! failures carry the byte offset of the offending character so template
//! tooling can point at the exact spot.

use crate::error::{ParseError, ParseResult};
use broadsheet_core::{CellAddress, Decimal, ErrorKind};

/// Token kinds produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal
    Number(Decimal),
    /// String literal (quotes and escapes already processed)
    Text(String),
    /// TRUE or FALSE
    Logical(bool),
    /// Error literal such as `#DIV/0!`
    ErrorLit(ErrorKind),

    // Names and references
    /// Function name or named reference
    Identifier(String),
    /// Cell reference, optionally sheet-qualified (`B4`, `Sheet1.B4`)
    Ref {
        sheet: Option<String>,
        address: CellAddress,
    },

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Separators
    Colon,
    Comma,
    LeftParen,
    RightParen,

    /// End of input
    Eof,
}

/// A token with the byte offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Tokenize formula source text
pub fn tokenize(input: &str) -> ParseResult<Vec<Token>> {
    tokenize_at(input, 0)
}

/// Tokenize with all reported offsets shifted by `base`
///
/// Used when the caller has already stripped a prefix (the leading `=` of
/// a report field) and wants offsets relative to the original text.
pub(crate) fn tokenize_at(input: &str, base: usize) -> ParseResult<Vec<Token>> {
    let mut lexer = Lexer {
        input,
        pos: 0,
        base,
    };
    lexer.run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    base: usize,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    offset: self.base + self.pos,
                });
                return Ok(tokens);
            }
            tokens.push(self.scan_token()?);
        }
    }

    fn scan_token(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        let c = match self.peek_char() {
            Some(c) => c,
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    offset: self.base + start,
                })
            }
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '^' => Some(TokenKind::Caret),
            '&' => Some(TokenKind::Ampersand),
            '=' => Some(TokenKind::Equal),
            ':' => Some(TokenKind::Colon),
            ',' => Some(TokenKind::Comma),
            '(' => Some(TokenKind::LeftParen),
            ')' => Some(TokenKind::RightParen),
            _ => None,
        };
        if let Some(kind) = single {
            self.advance();
            return Ok(Token {
                kind,
                offset: self.base + start,
            });
        }

        // Two-character comparison operators
        if c == '<' {
            self.advance();
            let kind = if self.peek_char() == Some('=') {
                self.advance();
                TokenKind::LessEqual
            } else if self.peek_char() == Some('>') {
                self.advance();
                TokenKind::NotEqual
            } else {
                TokenKind::LessThan
            };
            return Ok(Token {
                kind,
                offset: self.base + start,
            });
        }

        if c == '>' {
            self.advance();
            let kind = if self.peek_char() == Some('=') {
                self.advance();
                TokenKind::GreaterEqual
            } else {
                TokenKind::GreaterThan
            };
            return Ok(Token {
                kind,
                offset: self.base + start,
            });
        }

        // String literal
        if c == '"' {
            return self.scan_string();
        }

        // Error literal (#DIV/0!, #VALUE!, ...)
        if c == '#' {
            return self.scan_error_literal();
        }

        // Quoted sheet name ('Net Sales'.B4)
        if c == '\'' {
            return self.scan_quoted_sheet();
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        // Identifier, reference, or logical literal
        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            return self.scan_identifier_or_ref();
        }

        Err(self.err_at(start, format!("unexpected character '{}'", c)))
    }

    fn scan_string(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        self.advance(); // opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == '"' {
                // "" escapes an embedded quote
                if self.peek_char_at(1) == Some('"') {
                    s.push('"');
                    self.advance();
                    self.advance();
                } else {
                    break;
                }
            } else {
                s.push(c);
                self.advance();
            }
        }

        if self.peek_char() != Some('"') {
            return Err(self.err_at(start, "unterminated string literal".into()));
        }
        self.advance(); // closing quote

        Ok(Token {
            kind: TokenKind::Text(s),
            offset: self.base + start,
        })
    }

    fn scan_number(&mut self) -> ParseResult<Token> {
        let start = self.pos;

        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let mut scientific = false;
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            scientific = true;
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let raw = &self.input[start..self.pos];
        // A bare leading dot (".5") needs an explicit zero for the decimal parser
        let owned;
        let text = if raw.starts_with('.') {
            owned = format!("0{}", raw);
            owned.as_str()
        } else {
            raw
        };
        let number = if scientific {
            Decimal::from_scientific(text).ok()
        } else {
            text.parse::<Decimal>().ok()
        };

        match number {
            Some(n) => Ok(Token {
                kind: TokenKind::Number(n),
                offset: self.base + start,
            }),
            None => Err(self.err_at(start, format!("invalid number literal '{}'", text))),
        }
    }

    fn scan_error_literal(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        self.advance(); // '#'
        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '/' || c == '!' || c == '?'
        }) {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        match ErrorKind::parse(text) {
            Some(e) => Ok(Token {
                kind: TokenKind::ErrorLit(e),
                offset: self.base + start,
            }),
            None => Err(self.err_at(start, format!("unknown error literal '{}'", text))),
        }
    }

    fn scan_quoted_sheet(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        self.advance(); // opening quote

        let name_start = self.pos;
        while self.peek_char().map_or(false, |c| c != '\'') {
            self.advance();
        }
        if self.is_at_end() {
            return Err(self.err_at(start, "unterminated sheet name".into()));
        }
        let sheet = self.input[name_start..self.pos].to_string();
        self.advance(); // closing quote

        if self.peek_char() != Some('.') {
            return Err(self.err_at(start, "expected '.' after quoted sheet name".into()));
        }
        self.advance();

        let addr_start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '$')
        {
            self.advance();
        }
        let address = CellAddress::parse(&self.input[addr_start..self.pos]).map_err(|_| {
            self.err_at(addr_start, "expected cell address after sheet name".into())
        })?;

        Ok(Token {
            kind: TokenKind::Ref {
                sheet: Some(sheet),
                address,
            },
            offset: self.base + start,
        })
    }

    fn scan_identifier_or_ref(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
        }) {
            self.advance();
        }
        let text = &self.input[start..self.pos];

        // Dot-qualified sheet reference: Sheet1.B4
        if let Some((sheet, addr)) = text.split_once('.') {
            if sheet.is_empty() {
                return Err(self.err_at(start, "missing sheet name before '.'".into()));
            }
            let address = CellAddress::parse(addr).map_err(|_| {
                self.err_at(
                    start,
                    format!("expected cell address after sheet name in '{}'", text),
                )
            })?;
            return Ok(Token {
                kind: TokenKind::Ref {
                    sheet: Some(sheet.to_string()),
                    address,
                },
                offset: self.base + start,
            });
        }

        // Logical literals, unless this is a function call like TRUE()
        let upper = text.to_ascii_uppercase();
        if self.peek_char() != Some('(') {
            if upper == "TRUE" {
                return Ok(Token {
                    kind: TokenKind::Logical(true),
                    offset: self.base + start,
                });
            }
            if upper == "FALSE" {
                return Ok(Token {
                    kind: TokenKind::Logical(false),
                    offset: self.base + start,
                });
            }

            // Letters-then-digits is a cell reference (A1, $B$2), but only
            // when not followed by '(' - LOG10(x) is a function call
            if let Ok(address) = CellAddress::parse(text) {
                return Ok(Token {
                    kind: TokenKind::Ref {
                        sheet: None,
                        address,
                    },
                    offset: self.base + start,
                });
            }
        }

        Ok(Token {
            kind: TokenKind::Identifier(text.to_string()),
            offset: self.base + start,
        })
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn err_at(&self, offset: usize, message: String) -> ParseError {
        ParseError::Lex {
            offset: self.base + offset,
            message,
        }
    }
}
