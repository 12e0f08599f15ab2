//! Lexer for preprocessed ANSI C source
//!
//! The lexer runs after the preprocessor, so the input contains no
//! directives and no comments. It applies maximal munch and produces a
//! token vector terminated by exactly one `Eof` token.

pub mod literals;
pub mod token;

pub use token::{Token, TokenKind};

use mcc_common::CompilerError;
use std::collections::HashMap;

/// ANSI C lexer
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    keywords: HashMap<&'static str, TokenKind>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let mut lexer = Self {
            input: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            keywords: HashMap::new(),
        };
        lexer.initialize_keywords();
        lexer
    }

    fn initialize_keywords(&mut self) {
        let keywords = [
            ("auto", TokenKind::Auto),
            ("break", TokenKind::Break),
            ("case", TokenKind::Case),
            ("char", TokenKind::Char),
            ("const", TokenKind::Const),
            ("continue", TokenKind::Continue),
            ("default", TokenKind::Default),
            ("do", TokenKind::Do),
            ("double", TokenKind::Double),
            ("else", TokenKind::Else),
            ("enum", TokenKind::Enum),
            ("extern", TokenKind::Extern),
            ("float", TokenKind::Float),
            ("for", TokenKind::For),
            ("goto", TokenKind::Goto),
            ("if", TokenKind::If),
            ("inline", TokenKind::Inline),
            ("int", TokenKind::Int),
            ("long", TokenKind::Long),
            ("register", TokenKind::Register),
            ("restrict", TokenKind::Restrict),
            ("return", TokenKind::Return),
            ("short", TokenKind::Short),
            ("signed", TokenKind::Signed),
            ("sizeof", TokenKind::Sizeof),
            ("static", TokenKind::Static),
            ("struct", TokenKind::Struct),
            ("switch", TokenKind::Switch),
            ("typedef", TokenKind::Typedef),
            ("union", TokenKind::Union),
            ("unsigned", TokenKind::Unsigned),
            ("void", TokenKind::Void),
            ("volatile", TokenKind::Volatile),
            ("while", TokenKind::While),
        ];

        for (keyword, kind) in keywords {
            self.keywords.insert(keyword, kind);
        }
    }

    pub(crate) fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    pub(crate) fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    pub(crate) fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    pub(crate) fn error(&self, message: String) -> CompilerError {
        CompilerError::lexer_error(message, self.line, self.column)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Tokenize the whole input.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompilerError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let at_end = token.kind == TokenKind::Eof;
            tokens.push(token);
            if at_end {
                break;
            }
        }

        Ok(tokens)
    }

    /// Read the next token, applying maximal munch.
    pub fn next_token(&mut self) -> Result<Token, CompilerError> {
        self.skip_whitespace();

        let ch = match self.current_char() {
            Some(ch) => ch,
            None => return Ok(Token::eof()),
        };

        if ch.is_ascii_alphabetic() || ch == '_' {
            return Ok(self.tokenize_identifier());
        }
        if ch.is_ascii_digit() {
            return self.tokenize_number();
        }

        let token = match ch {
            '"' => return self.tokenize_string_literal(),
            '\'' => return self.tokenize_char_literal(),
            '.' => {
                if matches!(self.peek_char(1), Some(c) if c.is_ascii_digit()) {
                    return self.tokenize_number();
                }
                self.advance();
                if self.current_char() == Some('.') && self.peek_char(1) == Some('.') {
                    self.advance();
                    self.advance();
                    Token::new(TokenKind::Ellipsis, "...")
                } else {
                    Token::new(TokenKind::Punctuator, ".")
                }
            }
            '+' => {
                self.advance();
                if self.current_char() == Some('+') {
                    self.advance();
                    Token::new(TokenKind::IncOp, "++")
                } else if self.current_char() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::AddAssign, "+=")
                } else {
                    Token::new(TokenKind::Punctuator, "+")
                }
            }
            '-' => {
                self.advance();
                if self.current_char() == Some('-') {
                    self.advance();
                    Token::new(TokenKind::DecOp, "--")
                } else if self.current_char() == Some('>') {
                    self.advance();
                    Token::new(TokenKind::PtrOp, "->")
                } else if self.current_char() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::SubAssign, "-=")
                } else {
                    Token::new(TokenKind::Punctuator, "-")
                }
            }
            '*' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::MulAssign, "*=")
                } else {
                    Token::new(TokenKind::Punctuator, "*")
                }
            }
            '/' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::DivAssign, "/=")
                } else {
                    Token::new(TokenKind::Punctuator, "/")
                }
            }
            '%' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::ModAssign, "%=")
                } else {
                    Token::new(TokenKind::Punctuator, "%")
                }
            }
            '&' => {
                self.advance();
                if self.current_char() == Some('&') {
                    self.advance();
                    Token::new(TokenKind::AndOp, "&&")
                } else if self.current_char() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::AndAssign, "&=")
                } else {
                    Token::new(TokenKind::Punctuator, "&")
                }
            }
            '|' => {
                self.advance();
                if self.current_char() == Some('|') {
                    self.advance();
                    Token::new(TokenKind::OrOp, "||")
                } else if self.current_char() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::OrAssign, "|=")
                } else {
                    Token::new(TokenKind::Punctuator, "|")
                }
            }
            '^' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::XorAssign, "^=")
                } else {
                    Token::new(TokenKind::Punctuator, "^")
                }
            }
            '=' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::EqOp, "==")
                } else {
                    Token::new(TokenKind::Punctuator, "=")
                }
            }
            '!' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::NeOp, "!=")
                } else {
                    Token::new(TokenKind::Punctuator, "!")
                }
            }
            '<' => {
                self.advance();
                if self.current_char() == Some('<') {
                    self.advance();
                    if self.current_char() == Some('=') {
                        self.advance();
                        Token::new(TokenKind::LeftAssign, "<<=")
                    } else {
                        Token::new(TokenKind::LeftOp, "<<")
                    }
                } else if self.current_char() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::LeOp, "<=")
                } else {
                    Token::new(TokenKind::Punctuator, "<")
                }
            }
            '>' => {
                self.advance();
                if self.current_char() == Some('>') {
                    self.advance();
                    if self.current_char() == Some('=') {
                        self.advance();
                        Token::new(TokenKind::RightAssign, ">>=")
                    } else {
                        Token::new(TokenKind::RightOp, ">>")
                    }
                } else if self.current_char() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::GeOp, ">=")
                } else {
                    Token::new(TokenKind::Punctuator, ">")
                }
            }
            '~' | '?' | ':' | ';' | ',' | '(' | ')' | '{' | '}' | '[' | ']' => {
                self.advance();
                Token::new(TokenKind::Punctuator, ch.to_string())
            }
            other => {
                return Err(self.error(format!("Unknown character: 0x{:02x}", other as u32)));
            }
        };

        Ok(token)
    }

    fn tokenize_identifier(&mut self) -> Token {
        let mut text = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match self.keywords.get(text.as_str()) {
            Some(&kind) => Token::new(kind, text),
            None => Token::new(TokenKind::Identifier, text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_input() {
        let tokens = lex("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = lex("while whilex _while restrict");
        assert_eq!(tokens[0].kind, TokenKind::While);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].lexeme, "whilex");
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].kind, TokenKind::Restrict);
        assert_eq!(tokens[4].kind, TokenKind::Eof);
    }

    #[test]
    fn test_single_eof_terminator() {
        let tokens = lex("int x;");
        let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
        assert_eq!(eofs, 1);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn test_three_char_operators() {
        assert_eq!(
            kinds("a <<= b >>= c"),
            vec![
                TokenKind::Identifier,
                TokenKind::LeftAssign,
                TokenKind::Identifier,
                TokenKind::RightAssign,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_maximal_munch_plus_runs() {
        // "a+++++b" lexes as a ++ ++ + b
        assert_eq!(
            kinds("a+++++b"),
            vec![
                TokenKind::Identifier,
                TokenKind::IncOp,
                TokenKind::IncOp,
                TokenKind::Punctuator,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_arrow_and_member_access() {
        let tokens = lex("p->next.prev");
        assert_eq!(tokens[1].kind, TokenKind::PtrOp);
        assert_eq!(tokens[3].kind, TokenKind::Punctuator);
        assert_eq!(tokens[3].lexeme, ".");
    }

    #[test]
    fn test_ellipsis() {
        let tokens = lex("f(int c, ...)");
        let ellipsis: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Ellipsis)
            .collect();
        assert_eq!(ellipsis.len(), 1);
        assert_eq!(ellipsis[0].lexeme, "...");
    }

    #[test]
    fn test_two_dots_are_separate_punctuators() {
        assert_eq!(
            kinds("a..b"),
            vec![
                TokenKind::Identifier,
                TokenKind::Punctuator,
                TokenKind::Punctuator,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unknown_character_position() {
        let err = Lexer::new("int x;\n  @").tokenize().unwrap_err();
        match err {
            CompilerError::LexError { line, column, message } => {
                assert_eq!(line, 2);
                assert_eq!(column, 3);
                assert!(message.contains("0x40"), "got message {message:?}");
            }
            other => panic!("Expected LexError, got {other:?}"),
        }
    }

    #[test]
    fn test_punctuator_lexemes_survive() {
        let tokens = lex("{ ( [ ; , ] ) }");
        let lexemes: Vec<_> = tokens[..8].iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["{", "(", "[", ";", ",", "]", ")", "}"]);
        assert!(tokens[..8].iter().all(|t| t.kind == TokenKind::Punctuator));
    }
}
