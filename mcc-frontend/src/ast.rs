//! Homogeneous AST for the ANSI C parser
//!
//! Every node shares one shape: a kind, an optional value and an ordered
//! child list. Leaves (identifiers, constants, operator spellings,
//! punctuator markers) carry a value; interior nodes usually do not.

use once_cell::sync::{Lazy, OnceCell};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Node kinds, one per grammar construct that produces a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AstKind {
    Start,

    // External declarations
    FunctionDefinition,
    Declaration,
    DeclarationList,

    // Specifiers
    DeclarationSpecifiers,
    StorageClassSpecifier,
    TypeSpecifier,
    TypeQualifier,
    FunctionSpecifier,
    TypedefName,
    StructOrUnionSpecifier,
    StructOrUnion,
    StructDeclarationList,
    StructDeclaration,
    SpecifierQualifierList,
    StructDeclaratorList,
    StructDeclarator,
    EnumSpecifier,
    EnumeratorList,
    Enumerator,

    // Declarators
    InitDeclaratorList,
    InitDeclarator,
    Declarator,
    DirectDeclarator,
    Pointer,
    TypeQualifierList,
    ParameterTypeList,
    ParameterList,
    ParameterDeclaration,
    IdentifierList,
    TypeName,
    AbstractDeclarator,
    DirectAbstractDeclarator,

    // Initializers
    Initializer,
    InitializerList,
    Designation,
    DesignatorList,
    Designator,

    // Statements
    LabeledStatement,
    CompoundStatement,
    BlockItemList,
    ExpressionStatement,
    SelectionStatement,
    IterationStatement,
    JumpStatement,

    // Expressions
    Expression,
    AssignmentExpression,
    AssignmentOperator,
    ConditionalExpression,
    LogicalOrExpression,
    LogicalAndExpression,
    InclusiveOrExpression,
    ExclusiveOrExpression,
    AndExpression,
    EqualityExpression,
    RelationalExpression,
    ShiftExpression,
    AdditiveExpression,
    MultiplicativeExpression,
    CastExpression,
    UnaryExpression,
    UnaryOperator,
    PostfixExpression,
    ArgumentExpressionList,

    // Leaves
    Identifier,
    Constant,
    StringLiteral,
    Punctuator,
}

impl AstKind {
    /// The snake_case grammar name, used by diagnostics and diagrams.
    pub fn as_str(self) -> &'static str {
        match self {
            AstKind::Start => "start",
            AstKind::FunctionDefinition => "function_definition",
            AstKind::Declaration => "declaration",
            AstKind::DeclarationList => "declaration_list",
            AstKind::DeclarationSpecifiers => "declaration_specifiers",
            AstKind::StorageClassSpecifier => "storage_class_specifier",
            AstKind::TypeSpecifier => "type_specifier",
            AstKind::TypeQualifier => "type_qualifier",
            AstKind::FunctionSpecifier => "function_specifier",
            AstKind::TypedefName => "typedef_name",
            AstKind::StructOrUnionSpecifier => "struct_or_union_specifier",
            AstKind::StructOrUnion => "struct_or_union",
            AstKind::StructDeclarationList => "struct_declaration_list",
            AstKind::StructDeclaration => "struct_declaration",
            AstKind::SpecifierQualifierList => "specifier_qualifier_list",
            AstKind::StructDeclaratorList => "struct_declarator_list",
            AstKind::StructDeclarator => "struct_declarator",
            AstKind::EnumSpecifier => "enum_specifier",
            AstKind::EnumeratorList => "enumerator_list",
            AstKind::Enumerator => "enumerator",
            AstKind::InitDeclaratorList => "init_declarator_list",
            AstKind::InitDeclarator => "init_declarator",
            AstKind::Declarator => "declarator",
            AstKind::DirectDeclarator => "direct_declarator",
            AstKind::Pointer => "pointer",
            AstKind::TypeQualifierList => "type_qualifier_list",
            AstKind::ParameterTypeList => "parameter_type_list",
            AstKind::ParameterList => "parameter_list",
            AstKind::ParameterDeclaration => "parameter_declaration",
            AstKind::IdentifierList => "identifier_list",
            AstKind::TypeName => "type_name",
            AstKind::AbstractDeclarator => "abstract_declarator",
            AstKind::DirectAbstractDeclarator => "direct_abstract_declarator",
            AstKind::Initializer => "initializer",
            AstKind::InitializerList => "initializer_list",
            AstKind::Designation => "designation",
            AstKind::DesignatorList => "designator_list",
            AstKind::Designator => "designator",
            AstKind::LabeledStatement => "labeled_statement",
            AstKind::CompoundStatement => "compound_statement",
            AstKind::BlockItemList => "block_item_list",
            AstKind::ExpressionStatement => "expression_statement",
            AstKind::SelectionStatement => "selection_statement",
            AstKind::IterationStatement => "iteration_statement",
            AstKind::JumpStatement => "jump_statement",
            AstKind::Expression => "expression",
            AstKind::AssignmentExpression => "assignment_expression",
            AstKind::AssignmentOperator => "assignment_operator",
            AstKind::ConditionalExpression => "conditional_expression",
            AstKind::LogicalOrExpression => "logical_or_expression",
            AstKind::LogicalAndExpression => "logical_and_expression",
            AstKind::InclusiveOrExpression => "inclusive_or_expression",
            AstKind::ExclusiveOrExpression => "exclusive_or_expression",
            AstKind::AndExpression => "and_expression",
            AstKind::EqualityExpression => "equality_expression",
            AstKind::RelationalExpression => "relational_expression",
            AstKind::ShiftExpression => "shift_expression",
            AstKind::AdditiveExpression => "additive_expression",
            AstKind::MultiplicativeExpression => "multiplicative_expression",
            AstKind::CastExpression => "cast_expression",
            AstKind::UnaryExpression => "unary_expression",
            AstKind::UnaryOperator => "unary_operator",
            AstKind::PostfixExpression => "postfix_expression",
            AstKind::ArgumentExpressionList => "argument_expression_list",
            AstKind::Identifier => "identifier",
            AstKind::Constant => "constant",
            AstKind::StringLiteral => "string_literal",
            AstKind::Punctuator => "punctuator",
        }
    }
}

impl fmt::Display for AstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-kind counters backing the lazily assigned display names.
static DISPLAY_COUNTERS: Lazy<Mutex<HashMap<AstKind, u64>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// One AST node.
#[derive(Debug)]
pub struct AstNode {
    pub kind: AstKind,
    pub value: Option<String>,
    pub children: Vec<AstNode>,
    display_name: OnceCell<String>,
}

impl AstNode {
    /// A leaf carrying a value and no children.
    pub fn leaf(kind: AstKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: Some(value.into()),
            children: Vec::new(),
            display_name: OnceCell::new(),
        }
    }

    /// An interior node without a value.
    pub fn interior(kind: AstKind, children: Vec<AstNode>) -> Self {
        Self {
            kind,
            value: None,
            children,
            display_name: OnceCell::new(),
        }
    }

    /// An interior node that also carries a value, such as the keyword
    /// of a statement node.
    pub fn valued(kind: AstKind, value: impl Into<String>, children: Vec<AstNode>) -> Self {
        Self {
            kind,
            value: Some(value.into()),
            children,
            display_name: OnceCell::new(),
        }
    }

    /// The flattening constructor for accumulate-then-squash rules.
    ///
    /// A single operand is returned unchanged; two or more become the
    /// children, in source order, of one node of `kind`. Callers pass at
    /// least one operand.
    pub fn squash(kind: AstKind, mut operands: Vec<AstNode>) -> AstNode {
        if operands.len() == 1 {
            return operands.remove(0);
        }
        AstNode::interior(kind, operands)
    }

    /// The node's process-wide unique display name, `{n}__{kind}`.
    ///
    /// Assigned on first use; never part of equality.
    pub fn display_name(&self) -> &str {
        self.display_name.get_or_init(|| {
            let mut counters = DISPLAY_COUNTERS
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let count = counters.entry(self.kind).or_insert(0);
            *count += 1;
            format!("{}__{}", count, self.kind.as_str())
        })
    }

    /// Indented `kind(value)` rendering of the whole subtree.
    pub fn format_tree(&self) -> String {
        let mut out = String::new();
        self.format_into(&mut out, 0);
        out
    }

    fn format_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(self.kind.as_str());
        if let Some(value) = &self.value {
            out.push('(');
            out.push_str(value);
            out.push(')');
        }
        out.push('\n');
        for child in &self.children {
            child.format_into(out, depth + 1);
        }
    }
}

// Clones never inherit the original's display name; the copy gets its
// own on first use.
impl Clone for AstNode {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            value: self.value.clone(),
            children: self.children.clone(),
            display_name: OnceCell::new(),
        }
    }
}

impl PartialEq for AstNode {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value == other.value && self.children == other.children
    }
}

impl Eq for AstNode {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squash_single_operand_collapses() {
        let leaf = AstNode::leaf(AstKind::Identifier, "x");
        let squashed = AstNode::squash(AstKind::AdditiveExpression, vec![leaf.clone()]);
        assert_eq!(squashed, leaf);
    }

    #[test]
    fn test_squash_multiple_operands_wrap_flat() {
        let operands = vec![
            AstNode::leaf(AstKind::Identifier, "a"),
            AstNode::leaf(AstKind::Identifier, "b"),
            AstNode::leaf(AstKind::Identifier, "c"),
        ];
        let squashed = AstNode::squash(AstKind::AdditiveExpression, operands);
        assert_eq!(squashed.kind, AstKind::AdditiveExpression);
        assert_eq!(squashed.children.len(), 3);
        assert_eq!(squashed.children[0].value.as_deref(), Some("a"));
        assert_eq!(squashed.children[2].value.as_deref(), Some("c"));
    }

    #[test]
    fn test_equality_ignores_display_names() {
        let a = AstNode::leaf(AstKind::Identifier, "x");
        let b = AstNode::leaf(AstKind::Identifier, "x");
        let _ = a.display_name();
        assert_eq!(a, b);
    }

    #[test]
    fn test_display_names_are_stable_and_unique() {
        let a = AstNode::leaf(AstKind::Constant, "1");
        let b = AstNode::leaf(AstKind::Constant, "2");
        let name_a = a.display_name().to_string();
        assert_eq!(a.display_name(), name_a);
        assert_ne!(a.display_name(), b.display_name());
        assert!(name_a.ends_with("__constant"), "got {name_a:?}");
    }

    #[test]
    fn test_clone_gets_its_own_display_name() {
        let a = AstNode::leaf(AstKind::StringLiteral, "\"s\"");
        let name_a = a.display_name().to_string();
        let b = a.clone();
        assert_ne!(b.display_name(), name_a);
    }

    #[test]
    fn test_format_tree_indents_children() {
        let tree = AstNode::valued(
            AstKind::JumpStatement,
            "return",
            vec![AstNode::leaf(AstKind::Constant, "0")],
        );
        assert_eq!(tree.format_tree(), "jump_statement(return)\n  constant(0)\n");
    }
}
