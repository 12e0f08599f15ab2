//! Error handling for the mcc C front end
//!
//! This module defines the common error type shared by the lexer, the
//! parser and the driver. Preprocessing has its own error enum in the
//! preprocessor crate; the driver bridges the two.

use thiserror::Error;

/// Main error type that encompasses all front end phases
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Lexical error at {line}:{column}: {message}")]
    LexError {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Syntax error in {rule}: unexpected '{found}' (token {token_index})")]
    SyntaxError {
        rule: String,
        token_index: usize,
        found: String,
    },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Internal front end error: {message}")]
    InternalError { message: String },
}

impl CompilerError {
    /// Create a lexer error
    pub fn lexer_error(message: String, line: usize, column: usize) -> Self {
        CompilerError::LexError {
            line,
            column,
            message,
        }
    }

    /// Create a syntax error
    pub fn syntax_error(rule: String, token_index: usize, found: String) -> Self {
        CompilerError::SyntaxError {
            rule,
            token_index,
            found,
        }
    }

    /// The failing token index, when this error points into a token stream.
    pub fn token_index(&self) -> Option<usize> {
        match self {
            CompilerError::SyntaxError { token_index, .. } => Some(*token_index),
            _ => None,
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}

/// Convert from String (for simple error cases)
impl From<String> for CompilerError {
    fn from(message: String) -> Self {
        CompilerError::InternalError { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer_error_display() {
        let err = CompilerError::lexer_error("unknown character '@'".to_string(), 3, 7);
        assert_eq!(
            err.to_string(),
            "Lexical error at 3:7: unknown character '@'"
        );
    }

    #[test]
    fn test_syntax_error_display() {
        let err = CompilerError::syntax_error("function_arguments".to_string(), 4, "{".to_string());
        assert_eq!(
            err.to_string(),
            "Syntax error in function_arguments: unexpected '{' (token 4)"
        );
        assert_eq!(err.token_index(), Some(4));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: CompilerError = io.into();
        assert!(matches!(err, CompilerError::IoError { .. }));
        assert_eq!(err.token_index(), None);
    }
}
