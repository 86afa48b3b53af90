//! Hand-written lexer: one-character lookahead over the raw source text.

mod keywords;
mod token;

pub use token::{Token, TokenKind};

use crate::diagnostics::{Diagnostics, ErrorKind, Location};
use keywords::{KEYWORDS, ONE_CHAR_SYMBOLS, TWO_CHAR_SYMBOLS};

pub struct Lexer<'a> {
    chars: Vec<char>,
    index: isize,
    curr_char: Option<char>,
    line: usize,
    col: usize,
    tokens: Vec<Token>,
    diagnostics: &'a Diagnostics,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &str, diagnostics: &'a Diagnostics) -> Self {
        let mut lexer = Self {
            chars: source.chars().collect(),
            index: -1,
            curr_char: None,
            line: 1,
            col: 0,
            tokens: Vec::new(),
            diagnostics,
        };
        lexer.advance();
        lexer
    }

    fn advance(&mut self) {
        if self.curr_char == Some('\n') {
            self.line += 1;
            self.col = 0;
        }
        self.index += 1;
        self.col += 1;
        self.curr_char = usize::try_from(self.index)
            .ok()
            .and_then(|i| self.chars.get(i))
            .copied();
    }

    fn look_ahead(&self, step: isize) -> Option<char> {
        usize::try_from(self.index + step)
            .ok()
            .and_then(|i| self.chars.get(i))
            .copied()
    }

    fn loc(&self) -> Location {
        Location::from((self.line, self.col))
    }

    fn error(&self, kind: ErrorKind, message: impl AsRef<str>) -> ! {
        self.diagnostics.error(kind, message, Some(self.loc()))
    }

    fn lex_number(&mut self) {
        let mut buffer = String::new();
        buffer.push(self.curr_char.expect("current char shouldn't be None here"));
        self.advance();
        while let Some(c) = self.curr_char {
            if !c.is_ascii_digit() {
                break;
            }
            buffer.push(c);
            self.advance();
        }
        let col = self.col - 1;
        self.tokens
            .push(Token::with_value(TokenKind::IntLit, buffer, self.line, col));
    }

    fn lex_hex(&mut self) {
        self.advance();
        self.advance();
        let mut buffer = String::new();
        while let Some(c) = self.curr_char {
            if !c.is_ascii_hexdigit() {
                break;
            }
            buffer.push(c);
            self.advance();
        }
        if buffer.is_empty() {
            self.error(ErrorKind::Syntax, "invalid hexadecimal");
        }
        let value = u64::from_str_radix(&buffer, 16).unwrap_or_else(|_| self.error(ErrorKind::Syntax, "invalid hexadecimal"));
        let col = self.col - 1;
        self.tokens
            .push(Token::with_value(TokenKind::IntLit, value.to_string(), self.line, col));
    }

    fn is_valid_keyword_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    fn search_for_keyword(&self, potential_keyword: &str) -> Token {
        if let Some(kind) = KEYWORDS.get(potential_keyword) {
            Token::new(*kind, self.line, self.col - potential_keyword.chars().count())
        } else {
            Token::with_value(TokenKind::Ident, potential_keyword, self.line, self.col)
        }
    }

    fn lex_keyword(&mut self) {
        let mut buffer = String::new();
        buffer.push(self.curr_char.expect("current char is a char"));
        self.advance();
        while let Some(c) = self.curr_char {
            if !Self::is_valid_keyword_char(c) {
                break;
            }
            buffer.push(c);
            self.advance();
        }
        let token = self.search_for_keyword(&buffer);
        self.tokens.push(token);
    }

    fn escape_char(&mut self) -> u32 {
        let Some(c) = self.curr_char else {
            self.error(ErrorKind::Syntax, "expected a character after \\ escape");
        };
        match c {
            'n' => 10,
            't' => 9,
            '0' => 0,
            other => other as u32,
        }
    }

    fn lex_char(&mut self) {
        self.advance();
        let ascii_value = if self.curr_char == Some('\\') {
            self.advance();
            self.escape_char()
        } else if self.curr_char == Some('\'') {
            self.error(ErrorKind::Syntax, "empty char literal is not supported");
        } else if let Some(c) = self.curr_char {
            c as u32
        } else {
            self.error(ErrorKind::Syntax, "unclosed `'` started here");
        };

        self.tokens.push(Token::with_value(
            TokenKind::CharLit,
            ascii_value.to_string(),
            self.line,
            self.col,
        ));

        self.advance();
        if self.curr_char != Some('\'') {
            self.error(ErrorKind::Syntax, "expected `'`");
        }
        self.advance();
    }

    fn lex_string(&mut self) {
        let start = self.loc();
        self.advance();
        let mut bytes: Vec<String> = Vec::new();
        while self.curr_char != Some('"') {
            if self.curr_char == Some('\\') {
                self.advance();
                bytes.push(self.escape_char().to_string());
            } else if let Some(c) = self.curr_char {
                bytes.push((c as u32).to_string());
            } else {
                self.diagnostics
                    .error(ErrorKind::Syntax, "unclosed `\"` started here", Some(start));
            }
            self.advance();
        }
        self.tokens
            .push(Token::with_value(TokenKind::StrLit, bytes.join(","), self.line, self.col));
        self.advance();
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        while let Some(c) = self.curr_char {
            if c.is_alphabetic() || c == '_' {
                self.lex_keyword();
            } else if c == '0' && self.look_ahead(1) == Some('x') {
                self.lex_hex();
            } else if c.is_ascii_digit() {
                self.lex_number();
            } else if c == '\'' {
                self.lex_char();
            } else if c == '"' {
                self.lex_string();
            } else if c == '/' && self.look_ahead(1) == Some('/') {
                self.advance();
                while !matches!(self.curr_char, Some('\n') | None) {
                    self.advance();
                }
            } else if c == '/' && self.look_ahead(1) == Some('*') {
                let start = self.loc();
                self.advance();
                self.advance();
                while !(matches!(self.curr_char, Some('*') | None)
                    && matches!(self.look_ahead(1), Some('/') | None))
                {
                    self.advance();
                }
                self.advance();
                self.advance();
                if self.curr_char.is_none() {
                    self.diagnostics
                        .error(ErrorKind::Syntax, "unclosed multiline comment", Some(start));
                }
            } else if c == ' ' {
                self.advance();
            } else if let Some(next) = self.look_ahead(1) {
                let two_char: String = [c, next].iter().collect();
                if let Some(kind) = TWO_CHAR_SYMBOLS.get(two_char.as_str()) {
                    self.tokens.push(Token::new(*kind, self.line, self.col));
                    self.advance();
                    self.advance();
                } else if let Some(kind) = ONE_CHAR_SYMBOLS.get(&c) {
                    self.push_one_char_symbol(c, *kind);
                } else {
                    self.error(ErrorKind::Syntax, "character not included in the language grammar");
                }
            } else if let Some(kind) = ONE_CHAR_SYMBOLS.get(&c) {
                self.push_one_char_symbol(c, *kind);
            } else {
                self.error(ErrorKind::Syntax, "character not included in the language grammar");
            }
        }
        self.tokens
    }

    fn push_one_char_symbol(&mut self, c: char, kind: TokenKind) {
        if c == '\n' && matches!(self.tokens.last().map(|t| t.kind), Some(TokenKind::Newline)) {
            self.advance();
        } else {
            self.tokens.push(Token::new(kind, self.line, self.col));
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<TokenKind> {
        let diagnostics = Diagnostics::new("test.hdz", source, false, false);
        Lexer::new(source, &diagnostics)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_exit_statement() {
        assert_eq!(
            lex("vychod(42)"),
            vec![
                TokenKind::Exit,
                TokenKind::LeftParen,
                TokenKind::IntLit,
                TokenKind::RightParen,
            ]
        );
    }

    #[test]
    fn lexes_hex_literal_as_decimal() {
        let diagnostics = Diagnostics::new("test.hdz", "0x2A", false, false);
        let tokens = Lexer::new("0x2A", &diagnostics).tokenize();
        assert_eq!(tokens[0].value.as_deref(), Some("42"));
    }

    #[test]
    fn collapses_repeated_newlines() {
        assert_eq!(lex("\n\n\nvychod"), vec![TokenKind::Newline, TokenKind::Exit]);
    }

    #[test]
    fn lexes_two_char_operators_before_one_char() {
        assert_eq!(
            lex("a <= b"),
            vec![TokenKind::Ident, TokenKind::LessThanOrEq, TokenKind::Ident]
        );
    }

    #[test]
    fn lexes_char_literal_escape() {
        let diagnostics = Diagnostics::new("test.hdz", r"'\n'", false, false);
        let tokens = Lexer::new(r"'\n'", &diagnostics).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::CharLit);
        assert_eq!(tokens[0].value.as_deref(), Some("10"));
    }

    #[test]
    fn lexes_string_literal_as_byte_list() {
        let diagnostics = Diagnostics::new("test.hdz", "\"Hi\"", false, false);
        let tokens = Lexer::new("\"Hi\"", &diagnostics).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::StrLit);
        assert_eq!(tokens[0].value.as_deref(), Some("72,105"));
    }

    #[test]
    fn line_comment_is_skipped() {
        assert_eq!(lex("// comment\nvychod"), vec![TokenKind::Newline, TokenKind::Exit]);
    }

    #[test]
    fn keyword_vs_identifier() {
        assert_eq!(lex("kecka"), vec![TokenKind::Ident]);
        assert_eq!(lex("kec"), vec![TokenKind::If]);
    }
}
