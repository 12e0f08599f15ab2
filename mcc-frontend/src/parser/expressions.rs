//! Expression rules.
//!
//! The ten binary-operator levels share one accumulate-then-squash
//! loop: parse the first operand, then repeatedly consume an operator
//! and the next operand. A consumed operator whose right operand fails
//! to match is rolled back and left for the caller, so the partial
//! chain still stands as the match. `AstNode::squash` collapses
//! single-operand levels to nothing, which keeps `a` from parsing into
//! a ten-deep tower of wrappers.
//!
//! Operator tokens themselves are consumed and not recorded; grouping
//! alone carries the structure (`a + b * c` holds the multiplicative
//! node as the additive level's second operand).

use crate::ast::{AstKind, AstNode};
use crate::lexer::TokenKind;
use crate::parser::errors::SyntaxError;
use crate::parser::{Parser, RuleResult};

const ASSIGNMENT_OPERATORS: [TokenKind; 10] = [
    TokenKind::MulAssign,
    TokenKind::DivAssign,
    TokenKind::ModAssign,
    TokenKind::AddAssign,
    TokenKind::SubAssign,
    TokenKind::LeftAssign,
    TokenKind::RightAssign,
    TokenKind::AndAssign,
    TokenKind::XorAssign,
    TokenKind::OrAssign,
];

impl Parser {
    /// Comma level, the lowest-binding expression rule.
    pub(crate) fn expression(&mut self) -> RuleResult {
        self.binary_level(AstKind::Expression, Self::assignment_expression, |parser| {
            parser.match_punctuator(',')
        })
    }

    /// `[target, AssignmentOperator, right]` when an assignment
    /// operator follows the parsed conditional; right-associative via
    /// recursion. The left side is accepted as a target unchecked.
    pub(crate) fn assignment_expression(&mut self) -> RuleResult {
        let target = match self.conditional_expression()? {
            Some(node) => node,
            None => return Ok(None),
        };
        let operator = match self.assignment_operator() {
            Some(node) => node,
            None => return Ok(Some(target)),
        };
        let right = self.assignment_expression()?;
        let right = self.require(right, "assignment_expression")?;
        Ok(Some(AstNode::interior(
            AstKind::AssignmentExpression,
            vec![target, operator, right],
        )))
    }

    fn assignment_operator(&mut self) -> Option<AstNode> {
        if let Some(token) = self.match_any(&ASSIGNMENT_OPERATORS) {
            return Some(AstNode::leaf(AstKind::AssignmentOperator, token.lexeme));
        }
        if self.match_punctuator('=') {
            return Some(AstNode::leaf(AstKind::AssignmentOperator, "="));
        }
        None
    }

    /// `[condition, then, else]`; only wraps when `?` is present, and
    /// `?` commits the remaining arms.
    pub(crate) fn conditional_expression(&mut self) -> RuleResult {
        let condition = match self.logical_or_expression()? {
            Some(node) => node,
            None => return Ok(None),
        };
        if !self.match_punctuator('?') {
            return Ok(Some(condition));
        }
        let then_value = self.expression()?;
        let then_value = self.require(then_value, "conditional_expression")?;
        self.expect_punctuator(':', "conditional_expression")?;
        let else_value = self.conditional_expression()?;
        let else_value = self.require(else_value, "conditional_expression")?;
        Ok(Some(AstNode::interior(
            AstKind::ConditionalExpression,
            vec![condition, then_value, else_value],
        )))
    }

    pub(crate) fn constant_expression(&mut self) -> RuleResult {
        self.conditional_expression()
    }

    // -- binary-operator tower --------------------------------------------

    /// One flattened operator level: first operand, then
    /// operator-operand pairs until either stops matching. An operator
    /// with no operand behind it is rolled back so the enclosing rule
    /// sees it.
    fn binary_level(
        &mut self,
        kind: AstKind,
        operand: fn(&mut Self) -> RuleResult,
        operator: fn(&mut Self) -> bool,
    ) -> RuleResult {
        let first = match operand(self)? {
            Some(node) => node,
            None => return Ok(None),
        };
        let mut operands = vec![first];
        loop {
            let mark = self.mark();
            if !operator(self) {
                break;
            }
            match operand(self)? {
                Some(next) => operands.push(next),
                None => {
                    self.reset(mark);
                    break;
                }
            }
        }
        Ok(Some(AstNode::squash(kind, operands)))
    }

    fn logical_or_expression(&mut self) -> RuleResult {
        self.binary_level(
            AstKind::LogicalOrExpression,
            Self::logical_and_expression,
            |parser| parser.match_kind(TokenKind::OrOp).is_some(),
        )
    }

    fn logical_and_expression(&mut self) -> RuleResult {
        self.binary_level(
            AstKind::LogicalAndExpression,
            Self::inclusive_or_expression,
            |parser| parser.match_kind(TokenKind::AndOp).is_some(),
        )
    }

    fn inclusive_or_expression(&mut self) -> RuleResult {
        self.binary_level(
            AstKind::InclusiveOrExpression,
            Self::exclusive_or_expression,
            |parser| parser.match_punctuator('|'),
        )
    }

    fn exclusive_or_expression(&mut self) -> RuleResult {
        self.binary_level(AstKind::ExclusiveOrExpression, Self::and_expression, |parser| {
            parser.match_punctuator('^')
        })
    }

    fn and_expression(&mut self) -> RuleResult {
        self.binary_level(AstKind::AndExpression, Self::equality_expression, |parser| {
            parser.match_punctuator('&')
        })
    }

    fn equality_expression(&mut self) -> RuleResult {
        self.binary_level(
            AstKind::EqualityExpression,
            Self::relational_expression,
            |parser| parser.match_any(&[TokenKind::EqOp, TokenKind::NeOp]).is_some(),
        )
    }

    fn relational_expression(&mut self) -> RuleResult {
        self.binary_level(AstKind::RelationalExpression, Self::shift_expression, |parser| {
            parser.match_punctuator('<')
                || parser.match_punctuator('>')
                || parser.match_any(&[TokenKind::LeOp, TokenKind::GeOp]).is_some()
        })
    }

    fn shift_expression(&mut self) -> RuleResult {
        self.binary_level(AstKind::ShiftExpression, Self::additive_expression, |parser| {
            parser
                .match_any(&[TokenKind::LeftOp, TokenKind::RightOp])
                .is_some()
        })
    }

    fn additive_expression(&mut self) -> RuleResult {
        self.binary_level(
            AstKind::AdditiveExpression,
            Self::multiplicative_expression,
            |parser| parser.match_punctuator('+') || parser.match_punctuator('-'),
        )
    }

    fn multiplicative_expression(&mut self) -> RuleResult {
        self.binary_level(AstKind::MultiplicativeExpression, Self::cast_expression, |parser| {
            parser.match_punctuator('*')
                || parser.match_punctuator('/')
                || parser.match_punctuator('%')
        })
    }

    // -- unary tier --------------------------------------------------------

    /// `[TypeName, operand]`; falls through to `unary_expression` when
    /// the parenthesized head is not a type, and yields to the postfix
    /// rule when a brace announces a compound literal.
    pub(crate) fn cast_expression(&mut self) -> RuleResult {
        let mark = self.mark();
        if let Some(type_name) = self.parenthesized_type_name()? {
            if self.check_punctuator('{') {
                self.reset(mark);
            } else {
                let operand = self.cast_expression()?;
                let operand = self.require(operand, "cast_expression")?;
                return Ok(Some(AstNode::interior(
                    AstKind::CastExpression,
                    vec![type_name, operand],
                )));
            }
        }
        self.unary_expression()
    }

    /// Speculative `( type_name )` head shared by casts, `sizeof` and
    /// compound literals.
    fn parenthesized_type_name(&mut self) -> RuleResult {
        let mark = self.mark();
        if !self.match_punctuator('(') {
            return Ok(None);
        }
        if let Some(type_name) = self.type_name()? {
            if self.match_punctuator(')') {
                return Ok(Some(type_name));
            }
        }
        self.reset(mark);
        Ok(None)
    }

    pub(crate) fn unary_expression(&mut self) -> RuleResult {
        if let Some(token) = self.match_any(&[TokenKind::IncOp, TokenKind::DecOp]) {
            let operand = self.unary_expression()?;
            let operand = self.require(operand, "unary_expression")?;
            return Ok(Some(AstNode::valued(
                AstKind::UnaryExpression,
                token.lexeme,
                vec![operand],
            )));
        }

        if self.match_kind(TokenKind::Sizeof).is_some() {
            if let Some(type_name) = self.parenthesized_type_name()? {
                return Ok(Some(AstNode::valued(
                    AstKind::UnaryExpression,
                    "sizeof",
                    vec![type_name],
                )));
            }
            let operand = self.unary_expression()?;
            let operand = self.require(operand, "unary_expression")?;
            return Ok(Some(AstNode::valued(
                AstKind::UnaryExpression,
                "sizeof",
                vec![operand],
            )));
        }

        if let Some(operator) = self.unary_operator() {
            let operand = self.cast_expression()?;
            let operand = self.require(operand, "unary_expression")?;
            return Ok(Some(AstNode::interior(
                AstKind::UnaryExpression,
                vec![operator, operand],
            )));
        }

        self.postfix_expression()
    }

    fn unary_operator(&mut self) -> Option<AstNode> {
        for symbol in ['&', '*', '+', '-', '~', '!'] {
            if self.match_punctuator(symbol) {
                return Some(AstNode::leaf(AstKind::UnaryOperator, symbol.to_string()));
            }
        }
        None
    }

    // -- postfix tier ------------------------------------------------------

    /// `[head, suffix*]`: the head is a primary expression or a
    /// compound literal's `TypeName` + `InitializerList` pair; suffixes
    /// are indexes, calls, member accesses and postfix `++`/`--`.
    /// Collapses to the bare head when nothing else matched.
    pub(crate) fn postfix_expression(&mut self) -> RuleResult {
        let mut children = Vec::new();
        if let Some((type_name, initializers)) = self.compound_literal()? {
            children.push(type_name);
            children.push(initializers);
        } else if let Some(primary) = self.primary_expression()? {
            children.push(primary);
        } else {
            return Ok(None);
        }

        loop {
            if self.match_punctuator('[') {
                children.push(AstNode::leaf(AstKind::Punctuator, "["));
                let index = self.expression()?;
                let index = self.require(index, "postfix_expression")?;
                children.push(index);
                self.expect_punctuator(']', "postfix_expression")?;
                continue;
            }
            if self.match_punctuator('(') {
                let arguments = self.argument_expression_list()?;
                self.expect_punctuator(')', "postfix_expression")?;
                children.push(arguments);
                continue;
            }
            if self.match_punctuator('.') {
                let member = self.expect_kind(TokenKind::Identifier, "postfix_expression")?;
                children.push(AstNode::leaf(AstKind::Punctuator, "."));
                children.push(AstNode::leaf(AstKind::Identifier, member.lexeme));
                continue;
            }
            if self.match_kind(TokenKind::PtrOp).is_some() {
                let member = self.expect_kind(TokenKind::Identifier, "postfix_expression")?;
                children.push(AstNode::leaf(AstKind::Punctuator, "->"));
                children.push(AstNode::leaf(AstKind::Identifier, member.lexeme));
                continue;
            }
            if let Some(token) = self.match_any(&[TokenKind::IncOp, TokenKind::DecOp]) {
                children.push(AstNode::leaf(AstKind::Punctuator, token.lexeme));
                continue;
            }
            break;
        }

        if children.len() == 1 {
            return Ok(children.pop());
        }
        Ok(Some(AstNode::interior(AstKind::PostfixExpression, children)))
    }

    /// `( type_name ) { initializer_list ,? }`; the brace after the
    /// closing paren is what distinguishes this from a cast, and seeing
    /// it commits the literal.
    fn compound_literal(&mut self) -> Result<Option<(AstNode, AstNode)>, SyntaxError> {
        let mark = self.mark();
        let type_name = match self.parenthesized_type_name()? {
            Some(node) => node,
            None => return Ok(None),
        };
        if !self.match_punctuator('{') {
            self.reset(mark);
            return Ok(None);
        }
        let initializers = self.initializer_list()?;
        let initializers = self.require(initializers, "postfix_expression")?;
        self.match_punctuator(',');
        self.expect_punctuator('}', "postfix_expression")?;
        Ok(Some((type_name, initializers)))
    }

    /// Always present on a call, possibly empty; flat
    /// assignment-expression children (argument commas never build a
    /// comma expression).
    fn argument_expression_list(&mut self) -> Result<AstNode, SyntaxError> {
        let mut arguments = Vec::new();
        if let Some(first) = self.assignment_expression()? {
            arguments.push(first);
            while self.match_punctuator(',') {
                let next = self.assignment_expression()?;
                let next = self.require(next, "argument_expression_list")?;
                arguments.push(next);
            }
        }
        Ok(AstNode::interior(AstKind::ArgumentExpressionList, arguments))
    }

    /// Leaves for identifiers, constants and string literals; a
    /// parenthesized expression is returned directly with no wrapper.
    fn primary_expression(&mut self) -> RuleResult {
        let kind = self.peek().kind;
        if kind == TokenKind::Identifier {
            let token = self.advance();
            return Ok(Some(AstNode::leaf(AstKind::Identifier, token.lexeme)));
        }
        if kind.is_constant() {
            let token = self.advance();
            return Ok(Some(AstNode::leaf(AstKind::Constant, token.lexeme)));
        }
        if kind == TokenKind::StringLiteral {
            let token = self.advance();
            return Ok(Some(AstNode::leaf(AstKind::StringLiteral, token.lexeme)));
        }

        let mark = self.mark();
        if self.match_punctuator('(') {
            if let Some(expression) = self.expression()? {
                if self.match_punctuator(')') {
                    return Ok(Some(expression));
                }
            }
            self.reset(mark);
        }
        Ok(None)
    }
}
