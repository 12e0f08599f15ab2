//! Literal scanning for the ANSI C lexer
//!
//! This module handles numeric, character and string constants. Lexemes
//! are kept verbatim: quotes stay on string and character constants and
//! escape sequences are not decoded.

use crate::lexer::{Lexer, Token, TokenKind};
use mcc_common::CompilerError;

impl Lexer {
    /// Tokenize a numeric constant.
    ///
    /// Handles hex (`0x` prefix), octal (leading `0`), decimal and
    /// floating constants, each with its optional suffix run.
    pub fn tokenize_number(&mut self) -> Result<Token, CompilerError> {
        let mut text = String::new();

        // Hex constant: 0x prefix with at least one hex digit
        if self.current_char() == Some('0') && matches!(self.peek_char(1), Some('x' | 'X')) {
            text.push('0');
            self.advance();
            if let Some(x) = self.current_char() {
                text.push(x);
                self.advance();
            }

            let prefix_len = text.len();
            while let Some(ch) = self.current_char() {
                if ch.is_ascii_hexdigit() {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
            if text.len() == prefix_len {
                return Err(self.error(format!("Invalid hex constant: {text}")));
            }

            self.consume_integer_suffix(&mut text);
            return Ok(Token::new(TokenKind::HexConstant, text));
        }

        // Integer part (empty when the constant starts with '.')
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let mut is_float = false;

        // Fractional part
        if self.current_char() == Some('.') {
            is_float = true;
            text.push('.');
            self.advance();
            while let Some(ch) = self.current_char() {
                if ch.is_ascii_digit() {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        // Exponent; only taken when digits actually follow, so "1e"
        // stays an integer followed by an identifier
        if matches!(self.current_char(), Some('e' | 'E')) {
            let digits_at = if matches!(self.peek_char(1), Some('+' | '-')) { 2 } else { 1 };
            if matches!(self.peek_char(digits_at), Some(c) if c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digits_at {
                    if let Some(ch) = self.current_char() {
                        text.push(ch);
                        self.advance();
                    }
                }
                while let Some(ch) = self.current_char() {
                    if ch.is_ascii_digit() {
                        text.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        if is_float {
            if matches!(self.current_char(), Some('f' | 'F' | 'l' | 'L')) {
                if let Some(suffix) = self.current_char() {
                    text.push(suffix);
                    self.advance();
                }
            }
            return Ok(Token::new(TokenKind::FloatConstant, text));
        }

        self.consume_integer_suffix(&mut text);

        let digits = text.trim_end_matches(|c| matches!(c, 'u' | 'U' | 'l' | 'L'));
        if digits.len() > 1 && digits.starts_with('0') {
            if !digits[1..].chars().all(|c| c.is_digit(8)) {
                return Err(self.error(format!("Invalid octal constant: {text}")));
            }
            return Ok(Token::new(TokenKind::OctalConstant, text));
        }

        Ok(Token::new(TokenKind::IntegerConstant, text))
    }

    fn consume_integer_suffix(&mut self, text: &mut String) {
        while let Some(ch) = self.current_char() {
            if matches!(ch, 'u' | 'U' | 'l' | 'L') {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Tokenize a string literal, keeping the quotes in the lexeme.
    pub fn tokenize_string_literal(&mut self) -> Result<Token, CompilerError> {
        let mut text = String::from('"');
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    text.push('"');
                    self.advance();
                    return Ok(Token::new(TokenKind::StringLiteral, text));
                }
                '\\' => {
                    text.push('\\');
                    self.advance();
                    match self.current_char() {
                        Some(escaped) => {
                            text.push(escaped);
                            self.advance();
                        }
                        None => break,
                    }
                }
                _ => {
                    text.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error("Unterminated string literal".to_string()))
    }

    /// Tokenize a character constant, keeping the quotes in the lexeme.
    pub fn tokenize_char_literal(&mut self) -> Result<Token, CompilerError> {
        let mut text = String::from('\'');
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '\'' => {
                    text.push('\'');
                    self.advance();
                    if text.len() == 2 {
                        return Err(self.error("Empty character constant".to_string()));
                    }
                    return Ok(Token::new(TokenKind::CharConstant, text));
                }
                '\\' => {
                    text.push('\\');
                    self.advance();
                    match self.current_char() {
                        Some(escaped) => {
                            text.push(escaped);
                            self.advance();
                        }
                        None => break,
                    }
                }
                '\n' => break,
                _ => {
                    text.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error("Unterminated character constant".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap()
    }

    fn single(source: &str) -> Token {
        let tokens = lex(source);
        assert_eq!(tokens.len(), 2, "expected one token plus EOF in {source:?}");
        tokens.into_iter().next().unwrap()
    }

    #[test]
    fn test_decimal_constants() {
        assert_eq!(single("42").kind, TokenKind::IntegerConstant);
        assert_eq!(single("0").kind, TokenKind::IntegerConstant);
        let suffixed = single("42UL");
        assert_eq!(suffixed.kind, TokenKind::IntegerConstant);
        assert_eq!(suffixed.lexeme, "42UL");
    }

    #[test]
    fn test_octal_constants() {
        assert_eq!(single("052").kind, TokenKind::OctalConstant);
        assert_eq!(single("0755u").kind, TokenKind::OctalConstant);
    }

    #[test]
    fn test_bad_octal_digit() {
        let err = Lexer::new("09").tokenize().unwrap_err();
        match err {
            CompilerError::LexError { message, .. } => {
                assert!(message.contains("octal"), "got message {message:?}");
            }
            other => panic!("Expected LexError, got {other:?}"),
        }
    }

    #[test]
    fn test_hex_constants() {
        let token = single("0x2A");
        assert_eq!(token.kind, TokenKind::HexConstant);
        assert_eq!(token.lexeme, "0x2A");
        assert_eq!(single("0X1fUL").kind, TokenKind::HexConstant);
    }

    #[test]
    fn test_hex_without_digits() {
        let err = Lexer::new("0x").tokenize().unwrap_err();
        match err {
            CompilerError::LexError { message, .. } => {
                assert!(message.contains("hex"), "got message {message:?}");
            }
            other => panic!("Expected LexError, got {other:?}"),
        }
    }

    #[test]
    fn test_float_constants() {
        for source in ["3.14", "1.", ".5", "1e10", "1E-3", "2.5e+7", "1.0f", ".5L"] {
            let token = single(source);
            assert_eq!(token.kind, TokenKind::FloatConstant, "for {source:?}");
            assert_eq!(token.lexeme, source);
        }
    }

    #[test]
    fn test_dangling_exponent_is_not_consumed() {
        // "1e" is an integer followed by an identifier
        let tokens = lex("1e");
        assert_eq!(tokens[0].kind, TokenKind::IntegerConstant);
        assert_eq!(tokens[0].lexeme, "1");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].lexeme, "e");
    }

    #[test]
    fn test_dot_after_float_stops_the_scan() {
        let tokens = lex("1.5.5");
        assert_eq!(tokens[0].lexeme, "1.5");
        assert_eq!(tokens[1].lexeme, ".5");
        assert_eq!(tokens[1].kind, TokenKind::FloatConstant);
    }

    #[test]
    fn test_string_literal_keeps_quotes_and_escapes() {
        let token = single(r#""say \"hi\"\n""#);
        assert_eq!(token.kind, TokenKind::StringLiteral);
        assert_eq!(token.lexeme, r#""say \"hi\"\n""#);
    }

    #[test]
    fn test_empty_string_literal() {
        let token = single(r#""""#);
        assert_eq!(token.kind, TokenKind::StringLiteral);
        assert_eq!(token.lexeme, r#""""#);
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"abc").tokenize().unwrap_err();
        match err {
            CompilerError::LexError { message, .. } => {
                assert!(message.contains("Unterminated string"));
            }
            other => panic!("Expected LexError, got {other:?}"),
        }
    }

    #[test]
    fn test_escaped_backslash_then_quote_terminates() {
        // "\\" is a complete two-character literal
        let tokens = lex(r#""\\" x"#);
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].lexeme, r#""\\""#);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_char_constants() {
        assert_eq!(single("'a'").lexeme, "'a'");
        assert_eq!(single("'a'").kind, TokenKind::CharConstant);
        assert_eq!(single(r"'\n'").lexeme, r"'\n'");
        assert_eq!(single(r"'\''").lexeme, r"'\''");
    }

    #[test]
    fn test_empty_char_constant() {
        let err = Lexer::new("''").tokenize().unwrap_err();
        match err {
            CompilerError::LexError { message, .. } => {
                assert!(message.contains("Empty character"));
            }
            other => panic!("Expected LexError, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_char_constant() {
        let err = Lexer::new("'a\nint x;").tokenize().unwrap_err();
        assert!(matches!(err, CompilerError::LexError { .. }));
    }
}
