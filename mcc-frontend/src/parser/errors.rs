//! Parse error type
//!
//! A `SyntaxError` is fatal: it means a committed construct did not
//! complete, and no sibling alternative may catch it. It travels up to
//! `Parser::parse`, which bridges it into the shared `CompilerError`.

use crate::lexer::Token;
use mcc_common::CompilerError;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("syntax error in {rule} at token {at}")]
pub struct SyntaxError {
    /// snake_case name of the rule that had committed.
    pub rule: &'static str,
    /// Index of the offending token.
    pub at: usize,
}

impl SyntaxError {
    pub fn new(rule: &'static str, at: usize) -> Self {
        Self { rule, at }
    }

    /// Bridge into the shared error type, naming the offending token.
    pub fn into_compiler_error(self, tokens: &[Token]) -> CompilerError {
        let found = tokens
            .get(self.at)
            .map(|token| token.to_string())
            .unwrap_or_else(|| "end of input".to_string());
        CompilerError::syntax_error(self.rule.to_string(), self.at, found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenKind;

    #[test]
    fn test_display_names_rule_and_index() {
        let error = SyntaxError::new("function_arguments", 3);
        assert_eq!(error.to_string(), "syntax error in function_arguments at token 3");
    }

    #[test]
    fn test_conversion_reports_the_offending_lexeme() {
        let tokens = vec![
            Token::new(TokenKind::Int, "int"),
            Token::new(TokenKind::Punctuator, "{"),
            Token::eof(),
        ];
        let error = SyntaxError::new("declaration", 1).into_compiler_error(&tokens);
        assert_eq!(
            error.to_string(),
            "Syntax error in declaration: unexpected '{' (token 1)"
        );
    }

    #[test]
    fn test_conversion_at_end_of_input() {
        let tokens = vec![Token::new(TokenKind::Int, "int"), Token::eof()];
        let error = SyntaxError::new("declaration", 1).into_compiler_error(&tokens);
        assert_eq!(
            error.to_string(),
            "Syntax error in declaration: unexpected 'end of input' (token 1)"
        );
    }
}
