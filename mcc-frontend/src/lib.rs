//! mcc - C front end
//!
//! This crate provides the analysis half of the mcc C compiler:
//! - Lexer: tokenizes preprocessed C source
//! - Parser: recursive descent over ANSI C, producing a homogeneous tree
//! - Diagnostics: renders a failed parse back into readable source
//! - Diagram: Graphviz export of parse trees
//!
//! Input is expected to be preprocessed already; directives reaching
//! the lexer are an error.

pub mod ast;
pub mod diagnostics;
pub mod diagram;
pub mod lexer;
pub mod parser;

pub use ast::{AstKind, AstNode};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{Parser, RuleResult, SyntaxError};

use mcc_common::CompilerError;

/// High-level front end interface
pub struct Frontend;

impl Frontend {
    /// Parse C source code into a parse tree
    pub fn parse_source(source: &str) -> Result<AstNode, CompilerError> {
        let tokens = Self::tokenize_source(source)?;
        let mut parser = Parser::new(tokens);
        parser.parse()
    }

    /// Tokenize source code (for the driver's `lex` output and tests)
    pub fn tokenize_source(source: &str) -> Result<Vec<Token>, CompilerError> {
        let mut lexer = Lexer::new(source);
        lexer.tokenize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontend_parse_simple_function() {
        let source = r#"
int main() {
    return 42;
}
"#;

        let root = Frontend::parse_source(source).unwrap();
        assert_eq!(root.kind, AstKind::Start);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].kind, AstKind::FunctionDefinition);
    }

    #[test]
    fn test_frontend_tokenize() {
        let source = "int x = 42;";
        let tokens = Frontend::tokenize_source(source).unwrap();

        // Should have: int, x, =, 42, ;, EOF
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[2].kind, TokenKind::Punctuator);
        assert_eq!(tokens[3].kind, TokenKind::IntegerConstant);
        assert_eq!(tokens[3].lexeme, "42");
        assert_eq!(tokens[4].kind, TokenKind::Punctuator);
        assert_eq!(tokens[5].kind, TokenKind::Eof);
    }

    #[test]
    fn test_frontend_parse_with_variables() {
        let source = r#"
int add(int a, int b) {
    int result = a + b;
    return result;
}
"#;

        let root = Frontend::parse_source(source).unwrap();
        let function = &root.children[0];
        assert_eq!(function.kind, AstKind::FunctionDefinition);

        // Function body should have a declaration and a return
        let items = &function.children[2].children[0];
        assert_eq!(items.kind, AstKind::BlockItemList);
        assert_eq!(items.children.len(), 2);
        assert_eq!(items.children[0].kind, AstKind::Declaration);
        assert_eq!(items.children[1].kind, AstKind::JumpStatement);
    }

    #[test]
    fn test_frontend_reports_lexer_errors() {
        let error = Frontend::parse_source("int x = @;").unwrap_err();
        assert!(matches!(error, CompilerError::LexError { .. }));
    }
}
