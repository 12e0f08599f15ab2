//! Token definitions for the ANSI C lexer
//!
//! This module defines the closed token-kind set and the Token struct.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ANSI C token kinds.
///
/// Single-character operators and separators all share the `Punctuator`
/// kind and are told apart by their lexeme; everything multi-character
/// gets a kind of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    // Keywords
    Auto, Break, Case, Char, Const, Continue, Default, Do,
    Double, Else, Enum, Extern, Float, For, Goto, If,
    Inline, Int, Long, Register, Restrict, Return, Short, Signed,
    Sizeof, Static, Struct, Switch, Typedef, Union, Unsigned, Void,
    Volatile, While,

    // Identifiers
    Identifier,

    // Constants and literals
    IntegerConstant,
    OctalConstant,
    HexConstant,
    FloatConstant,
    CharConstant,
    StringLiteral,

    // Multi-character operators
    PtrOp,          // ->
    IncOp,          // ++
    DecOp,          // --
    LeftOp,         // <<
    RightOp,        // >>
    LeOp,           // <=
    GeOp,           // >=
    EqOp,           // ==
    NeOp,           // !=
    AndOp,          // &&
    OrOp,           // ||
    MulAssign,      // *=
    DivAssign,      // /=
    ModAssign,      // %=
    AddAssign,      // +=
    SubAssign,      // -=
    LeftAssign,     // <<=
    RightAssign,    // >>=
    AndAssign,      // &=
    XorAssign,      // ^=
    OrAssign,       // |=
    Ellipsis,       // ...

    /// Any single-character operator or separator; the lexeme carries it.
    Punctuator,

    /// End of input; every token stream ends with exactly one of these.
    Eof,

    /// Reserved for display purposes, never produced by the lexer.
    Error,
}

impl TokenKind {
    /// True for the numeric and character constant kinds.
    pub fn is_constant(self) -> bool {
        matches!(
            self,
            TokenKind::IntegerConstant
                | TokenKind::OctalConstant
                | TokenKind::HexConstant
                | TokenKind::FloatConstant
                | TokenKind::CharConstant
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Keywords - show the spelling
            TokenKind::Auto => write!(f, "auto"),
            TokenKind::Break => write!(f, "break"),
            TokenKind::Case => write!(f, "case"),
            TokenKind::Char => write!(f, "char"),
            TokenKind::Const => write!(f, "const"),
            TokenKind::Continue => write!(f, "continue"),
            TokenKind::Default => write!(f, "default"),
            TokenKind::Do => write!(f, "do"),
            TokenKind::Double => write!(f, "double"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::Enum => write!(f, "enum"),
            TokenKind::Extern => write!(f, "extern"),
            TokenKind::Float => write!(f, "float"),
            TokenKind::For => write!(f, "for"),
            TokenKind::Goto => write!(f, "goto"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Inline => write!(f, "inline"),
            TokenKind::Int => write!(f, "int"),
            TokenKind::Long => write!(f, "long"),
            TokenKind::Register => write!(f, "register"),
            TokenKind::Restrict => write!(f, "restrict"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::Short => write!(f, "short"),
            TokenKind::Signed => write!(f, "signed"),
            TokenKind::Sizeof => write!(f, "sizeof"),
            TokenKind::Static => write!(f, "static"),
            TokenKind::Struct => write!(f, "struct"),
            TokenKind::Switch => write!(f, "switch"),
            TokenKind::Typedef => write!(f, "typedef"),
            TokenKind::Union => write!(f, "union"),
            TokenKind::Unsigned => write!(f, "unsigned"),
            TokenKind::Void => write!(f, "void"),
            TokenKind::Volatile => write!(f, "volatile"),
            TokenKind::While => write!(f, "while"),

            // Token classes - show the class name
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::IntegerConstant => write!(f, "integer constant"),
            TokenKind::OctalConstant => write!(f, "octal constant"),
            TokenKind::HexConstant => write!(f, "hex constant"),
            TokenKind::FloatConstant => write!(f, "floating constant"),
            TokenKind::CharConstant => write!(f, "character constant"),
            TokenKind::StringLiteral => write!(f, "string literal"),

            // Operators - show the symbol
            TokenKind::PtrOp => write!(f, "->"),
            TokenKind::IncOp => write!(f, "++"),
            TokenKind::DecOp => write!(f, "--"),
            TokenKind::LeftOp => write!(f, "<<"),
            TokenKind::RightOp => write!(f, ">>"),
            TokenKind::LeOp => write!(f, "<="),
            TokenKind::GeOp => write!(f, ">="),
            TokenKind::EqOp => write!(f, "=="),
            TokenKind::NeOp => write!(f, "!="),
            TokenKind::AndOp => write!(f, "&&"),
            TokenKind::OrOp => write!(f, "||"),
            TokenKind::MulAssign => write!(f, "*="),
            TokenKind::DivAssign => write!(f, "/="),
            TokenKind::ModAssign => write!(f, "%="),
            TokenKind::AddAssign => write!(f, "+="),
            TokenKind::SubAssign => write!(f, "-="),
            TokenKind::LeftAssign => write!(f, "<<="),
            TokenKind::RightAssign => write!(f, ">>="),
            TokenKind::AndAssign => write!(f, "&="),
            TokenKind::XorAssign => write!(f, "^="),
            TokenKind::OrAssign => write!(f, "|="),
            TokenKind::Ellipsis => write!(f, "..."),

            TokenKind::Punctuator => write!(f, "punctuator"),
            TokenKind::Eof => write!(f, "EOF"),
            TokenKind::Error => write!(f, "error"),
        }
    }
}

/// A token paired with the exact source substring it was read from.
///
/// String and character constants keep their quotes and escape
/// sequences in the lexeme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>) -> Self {
        Self { kind, lexeme: lexeme.into() }
    }

    pub fn eof() -> Self {
        Self { kind: TokenKind::Eof, lexeme: String::new() }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            _ => write!(f, "{}", self.lexeme),
        }
    }
}
