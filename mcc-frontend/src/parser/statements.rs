//! Statement rules.
//!
//! `statement` is a pure dispatcher; each alternative either declines
//! without moving the cursor or commits on its leading keyword or
//! brace. Statement nodes carry the introducing keyword as their
//! value, which keeps `switch`/`if` and `while`/`do`/`for` apart
//! without extra node kinds.

use crate::ast::{AstKind, AstNode};
use crate::lexer::TokenKind;
use crate::parser::errors::SyntaxError;
use crate::parser::{Parser, RuleResult};

impl Parser {
    pub(crate) fn statement(&mut self) -> RuleResult {
        if let Some(node) = self.labeled_statement()? {
            return Ok(Some(node));
        }
        if let Some(node) = self.compound_statement()? {
            return Ok(Some(node));
        }
        if let Some(node) = self.selection_statement()? {
            return Ok(Some(node));
        }
        if let Some(node) = self.iteration_statement()? {
            return Ok(Some(node));
        }
        if let Some(node) = self.jump_statement()? {
            return Ok(Some(node));
        }
        self.expression_statement()
    }

    /// `case`/`default` labels, or the speculative `identifier :` form.
    fn labeled_statement(&mut self) -> RuleResult {
        if let Some(keyword) = self.match_kind(TokenKind::Case) {
            let guard = self.constant_expression()?;
            let guard = self.require(guard, "labeled_statement")?;
            self.expect_punctuator(':', "labeled_statement")?;
            let body = self.statement()?;
            let body = self.require(body, "labeled_statement")?;
            return Ok(Some(AstNode::valued(
                AstKind::LabeledStatement,
                keyword.lexeme,
                vec![guard, body],
            )));
        }
        if let Some(keyword) = self.match_kind(TokenKind::Default) {
            self.expect_punctuator(':', "labeled_statement")?;
            let body = self.statement()?;
            let body = self.require(body, "labeled_statement")?;
            return Ok(Some(AstNode::valued(
                AstKind::LabeledStatement,
                keyword.lexeme,
                vec![body],
            )));
        }

        // `identifier :` only becomes a label once the colon is seen;
        // until then the identifier may open an expression statement.
        let mark = self.mark();
        if let Some(name) = self.match_kind(TokenKind::Identifier) {
            if self.match_punctuator(':') {
                let body = self.statement()?;
                let body = self.require(body, "labeled_statement")?;
                return Ok(Some(AstNode::interior(
                    AstKind::LabeledStatement,
                    vec![AstNode::leaf(AstKind::Identifier, name.lexeme), body],
                )));
            }
            self.reset(mark);
        }
        Ok(None)
    }

    /// `[BlockItemList]`; the opening brace commits.
    pub(crate) fn compound_statement(&mut self) -> RuleResult {
        if !self.match_punctuator('{') {
            return Ok(None);
        }
        let items = self.block_item_list()?;
        self.expect_punctuator('}', "compound_statement")?;
        Ok(Some(AstNode::interior(AstKind::CompoundStatement, vec![items])))
    }

    /// Always present, possibly empty. Declarations are tried first so
    /// `word_t w;` cannot be misread as an expression statement once
    /// `word_t` names a type.
    fn block_item_list(&mut self) -> Result<AstNode, SyntaxError> {
        let mut items = Vec::new();
        loop {
            if let Some(declaration) = self.declaration()? {
                items.push(declaration);
                continue;
            }
            if let Some(statement) = self.statement()? {
                items.push(statement);
                continue;
            }
            break;
        }
        Ok(AstNode::interior(AstKind::BlockItemList, items))
    }

    /// `;` alone yields an empty node; any expression commits the
    /// closing `;`.
    fn expression_statement(&mut self) -> RuleResult {
        if self.match_punctuator(';') {
            return Ok(Some(AstNode::interior(AstKind::ExpressionStatement, Vec::new())));
        }
        let expression = match self.expression()? {
            Some(node) => node,
            None => return Ok(None),
        };
        self.expect_punctuator(';', "expression_statement")?;
        Ok(Some(AstNode::interior(
            AstKind::ExpressionStatement,
            vec![expression],
        )))
    }

    /// `if` with an optional `else` arm, and `switch`.
    fn selection_statement(&mut self) -> RuleResult {
        if let Some(keyword) = self.match_kind(TokenKind::If) {
            self.expect_punctuator('(', "selection_statement")?;
            let condition = self.expression()?;
            let condition = self.require(condition, "selection_statement")?;
            self.expect_punctuator(')', "selection_statement")?;
            let then_arm = self.statement()?;
            let then_arm = self.require(then_arm, "selection_statement")?;

            let mut children = vec![condition, then_arm];
            if self.match_kind(TokenKind::Else).is_some() {
                let else_arm = self.statement()?;
                let else_arm = self.require(else_arm, "selection_statement")?;
                children.push(else_arm);
            }
            return Ok(Some(AstNode::valued(
                AstKind::SelectionStatement,
                keyword.lexeme,
                children,
            )));
        }

        if let Some(keyword) = self.match_kind(TokenKind::Switch) {
            self.expect_punctuator('(', "selection_statement")?;
            let scrutinee = self.expression()?;
            let scrutinee = self.require(scrutinee, "selection_statement")?;
            self.expect_punctuator(')', "selection_statement")?;
            let body = self.statement()?;
            let body = self.require(body, "selection_statement")?;
            return Ok(Some(AstNode::valued(
                AstKind::SelectionStatement,
                keyword.lexeme,
                vec![scrutinee, body],
            )));
        }

        Ok(None)
    }

    /// `while`, `do`/`while` and the three-slot `for` header. The first
    /// two `for` slots always produce a node, empty or not; only the
    /// step is dropped when absent. The body is always last.
    fn iteration_statement(&mut self) -> RuleResult {
        if let Some(keyword) = self.match_kind(TokenKind::While) {
            self.expect_punctuator('(', "iteration_statement")?;
            let condition = self.expression()?;
            let condition = self.require(condition, "iteration_statement")?;
            self.expect_punctuator(')', "iteration_statement")?;
            let body = self.statement()?;
            let body = self.require(body, "iteration_statement")?;
            return Ok(Some(AstNode::valued(
                AstKind::IterationStatement,
                keyword.lexeme,
                vec![condition, body],
            )));
        }

        if let Some(keyword) = self.match_kind(TokenKind::Do) {
            let body = self.statement()?;
            let body = self.require(body, "iteration_statement")?;
            self.expect_kind(TokenKind::While, "iteration_statement")?;
            self.expect_punctuator('(', "iteration_statement")?;
            let condition = self.expression()?;
            let condition = self.require(condition, "iteration_statement")?;
            self.expect_punctuator(')', "iteration_statement")?;
            self.expect_punctuator(';', "iteration_statement")?;
            return Ok(Some(AstNode::valued(
                AstKind::IterationStatement,
                keyword.lexeme,
                vec![body, condition],
            )));
        }

        if let Some(keyword) = self.match_kind(TokenKind::For) {
            self.expect_punctuator('(', "iteration_statement")?;

            // C99 allows a declaration in the first slot; both the
            // declaration and the expression-statement forms consume
            // their own terminating semicolon, so empty slots still
            // leave a node behind.
            let init = match self.declaration()? {
                Some(node) => node,
                None => {
                    let init = self.expression_statement()?;
                    self.require(init, "iteration_statement")?
                }
            };
            let condition = self.expression_statement()?;
            let condition = self.require(condition, "iteration_statement")?;

            let mut children = vec![init, condition];
            if let Some(step) = self.expression()? {
                children.push(step);
            }
            self.expect_punctuator(')', "iteration_statement")?;

            let body = self.statement()?;
            let body = self.require(body, "iteration_statement")?;
            children.push(body);
            return Ok(Some(AstNode::valued(
                AstKind::IterationStatement,
                keyword.lexeme,
                children,
            )));
        }

        Ok(None)
    }

    /// `goto`, `continue`, `break` and `return`, each committing its
    /// trailing `;`.
    fn jump_statement(&mut self) -> RuleResult {
        if self.match_kind(TokenKind::Goto).is_some() {
            let target = self.expect_kind(TokenKind::Identifier, "jump_statement")?;
            self.expect_punctuator(';', "jump_statement")?;
            return Ok(Some(AstNode::valued(
                AstKind::JumpStatement,
                "goto",
                vec![AstNode::leaf(AstKind::Identifier, target.lexeme)],
            )));
        }
        if self.match_kind(TokenKind::Continue).is_some() {
            self.expect_punctuator(';', "jump_statement")?;
            return Ok(Some(AstNode::valued(
                AstKind::JumpStatement,
                "continue",
                Vec::new(),
            )));
        }
        if self.match_kind(TokenKind::Break).is_some() {
            self.expect_punctuator(';', "jump_statement")?;
            return Ok(Some(AstNode::valued(AstKind::JumpStatement, "break", Vec::new())));
        }
        if self.match_kind(TokenKind::Return).is_some() {
            let mut children = Vec::new();
            if let Some(value) = self.expression()? {
                children.push(value);
            }
            self.expect_punctuator(';', "jump_statement")?;
            return Ok(Some(AstNode::valued(
                AstKind::JumpStatement,
                "return",
                children,
            )));
        }
        Ok(None)
    }
}
