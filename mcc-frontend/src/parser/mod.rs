//! Recursive-descent parser for ANSI C
//!
//! Every rule method returns a [`RuleResult`] and honors one contract:
//!
//! - `Ok(Some(node))` - the rule matched and the cursor sits just past
//!   the construct.
//! - `Ok(None)` - the rule did not match and the cursor is exactly
//!   where it was.
//! - `Err(SyntaxError)` - a committed construct turned out to be
//!   malformed. The error propagates to the top unmodified; sibling
//!   alternatives never catch it and there is no resynchronization.
//!
//! A rule commits by consuming a token it cannot give back, via
//! `expect_kind`, `expect_punctuator` or `require`. The only explicit
//! save/restore pair lives in the external-declaration dispatcher,
//! which probes `function_definition` before settling on `declaration`.

pub mod declarations;
pub mod errors;
pub mod expressions;
pub mod statements;

pub use errors::SyntaxError;

use crate::ast::{AstKind, AstNode};
use crate::lexer::{Token, TokenKind};
use log::debug;
use mcc_common::CompilerError;
use std::collections::HashSet;

/// The three-way outcome of one rule method.
pub type RuleResult = Result<Option<AstNode>, SyntaxError>;

/// Recursive-descent parser over a token vector.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    rollback_position: usize,
    typedef_names: HashSet<String>,
}

impl Parser {
    /// Build a parser over a token stream. A terminating `Eof` token is
    /// appended if the stream lacks one, so the cursor always has a
    /// token to rest on.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|token| token.kind) != Some(TokenKind::Eof) {
            tokens.push(Token::eof());
        }
        Self {
            tokens,
            position: 0,
            rollback_position: 0,
            typedef_names: HashSet::new(),
        }
    }

    /// The token stream this parser reads, for error rendering.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Parse the whole stream into a single `Start` node.
    pub fn parse(&mut self) -> Result<AstNode, CompilerError> {
        self.translation_unit()
            .map_err(|error| error.into_compiler_error(&self.tokens))
    }

    fn translation_unit(&mut self) -> Result<AstNode, SyntaxError> {
        let mut items = Vec::new();
        while !self.check(TokenKind::Eof) {
            match self.external_declaration()? {
                Some(node) => items.push(node),
                None => return Err(self.fail("external_declaration")),
            }
        }
        if items.is_empty() {
            return Err(self.fail("translation_unit"));
        }
        Ok(AstNode::interior(AstKind::Start, items))
    }

    /// Dispatcher between the two top-level forms. Probes
    /// `function_definition` first and falls back to `declaration`;
    /// produces no node of its own. Never re-entered while a probe is
    /// running, so the single rollback slot suffices.
    pub(crate) fn external_declaration(&mut self) -> RuleResult {
        self.commit();
        if let Some(node) = self.function_definition()? {
            return Ok(Some(node));
        }
        self.rollback();
        if let Some(node) = self.declaration()? {
            return Ok(Some(node));
        }
        self.rollback();
        Ok(None)
    }

    /// `[DeclarationSpecifiers, Declarator, DeclarationList?, CompoundStatement]`
    ///
    /// A following `{` or K&R declaration list commits the rule once
    /// specifiers and declarator have matched; with neither present the
    /// declaration path gets to retry.
    pub(crate) fn function_definition(&mut self) -> RuleResult {
        let mark = self.mark();
        let specifiers = match self.declaration_specifiers(false)? {
            Some(node) => node,
            None => return Ok(None),
        };
        let declarator = match self.declarator()? {
            Some(node) => node,
            None => {
                self.reset(mark);
                return Ok(None);
            }
        };
        let declaration_list = self.declaration_list()?;
        let body = match self.compound_statement()? {
            Some(node) => node,
            None => {
                if declaration_list.is_some() {
                    return Err(self.fail("function_definition"));
                }
                self.reset(mark);
                return Ok(None);
            }
        };

        let mut children = vec![specifiers, declarator];
        if let Some(list) = declaration_list {
            children.push(list);
        }
        children.push(body);
        Ok(Some(AstNode::interior(AstKind::FunctionDefinition, children)))
    }

    /// K&R parameter declarations between declarator and body.
    fn declaration_list(&mut self) -> RuleResult {
        let mut items = Vec::new();
        while let Some(declaration) = self.declaration()? {
            items.push(declaration);
        }
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(AstNode::interior(AstKind::DeclarationList, items)))
    }

    // -- cursor primitives ------------------------------------------------

    // `position` never passes the final Eof: `advance` refuses to move
    // off it and every reset returns to an earlier mark, so indexing
    // with `position` cannot go out of bounds.

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_at(&self, offset: usize) -> &Token {
        let index = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.tokens[self.position].clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    pub(crate) fn mark(&self) -> usize {
        self.position
    }

    pub(crate) fn reset(&mut self, mark: usize) {
        self.position = mark;
    }

    fn commit(&mut self) {
        self.rollback_position = self.position;
    }

    fn rollback(&mut self) {
        self.position = self.rollback_position;
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    // Punctuator lexemes are single ASCII characters by construction.
    pub(crate) fn check_punctuator(&self, ch: char) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Punctuator && token.lexeme.len() == 1 && token.lexeme.starts_with(ch)
    }

    pub(crate) fn match_kind(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(crate) fn match_punctuator(&mut self, ch: char) -> bool {
        if self.check_punctuator(ch) {
            self.advance();
            return true;
        }
        false
    }

    pub(crate) fn match_any(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if kinds.iter().any(|&kind| self.check(kind)) {
            return Some(self.advance());
        }
        None
    }

    // -- commit-discipline primitives -------------------------------------

    pub(crate) fn fail(&self, rule: &'static str) -> SyntaxError {
        SyntaxError::new(rule, self.position)
    }

    pub(crate) fn expect_kind(
        &mut self,
        kind: TokenKind,
        rule: &'static str,
    ) -> Result<Token, SyntaxError> {
        match self.match_kind(kind) {
            Some(token) => Ok(token),
            None => Err(self.fail(rule)),
        }
    }

    pub(crate) fn expect_punctuator(
        &mut self,
        ch: char,
        rule: &'static str,
    ) -> Result<(), SyntaxError> {
        if self.match_punctuator(ch) {
            return Ok(());
        }
        Err(self.fail(rule))
    }

    /// Turn a sub-rule's no-match into a fatal error once this rule has
    /// committed.
    pub(crate) fn require(
        &self,
        node: Option<AstNode>,
        rule: &'static str,
    ) -> Result<AstNode, SyntaxError> {
        node.ok_or_else(|| self.fail(rule))
    }

    // -- typedef feedback --------------------------------------------------

    pub(crate) fn is_typedef_name(&self, lexeme: &str) -> bool {
        self.typedef_names.contains(lexeme)
    }

    /// Record every identifier declared by a typedef declaration. The
    /// set is append-only; block scope does not retire names.
    pub(crate) fn register_typedef_names(&mut self, init_declarator_list: &AstNode) {
        for init_declarator in &init_declarator_list.children {
            if let Some(declarator) = init_declarator.children.first() {
                if let Some(name) = declarator_identifier(declarator) {
                    debug!("registered typedef name '{name}'");
                    self.typedef_names.insert(name.to_string());
                }
            }
        }
    }
}

/// The identifier a declarator declares, found under pointers and
/// parenthesized declarators.
fn declarator_identifier(node: &AstNode) -> Option<&str> {
    match node.kind {
        AstKind::Identifier => node.value.as_deref(),
        AstKind::Declarator => node
            .children
            .iter()
            .find(|child| child.kind == AstKind::DirectDeclarator)
            .and_then(declarator_identifier),
        AstKind::DirectDeclarator => node.children.first().and_then(declarator_identifier),
        _ => None,
    }
}
