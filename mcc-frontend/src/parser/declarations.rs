//! Declaration rules: specifiers, declarators, struct/union/enum
//! bodies, parameter lists and initializers.
//!
//! `declaration_specifiers` and `specifier_qualifier_list` build nested
//! right-recursive chains; the various lists here are flat nodes that
//! always wrap their items, because emptiness and item count are
//! structural. Both specifier chains thread a `seen_type` flag so an
//! identifier can only be read as a typedef name before the run has
//! produced a type specifier.

use crate::ast::{AstKind, AstNode};
use crate::lexer::TokenKind;
use crate::parser::errors::SyntaxError;
use crate::parser::{Parser, RuleResult};

const TYPE_KEYWORDS: [TokenKind; 9] = [
    TokenKind::Void,
    TokenKind::Char,
    TokenKind::Short,
    TokenKind::Int,
    TokenKind::Long,
    TokenKind::Float,
    TokenKind::Double,
    TokenKind::Signed,
    TokenKind::Unsigned,
];

const STORAGE_CLASS_KEYWORDS: [TokenKind; 5] = [
    TokenKind::Typedef,
    TokenKind::Extern,
    TokenKind::Static,
    TokenKind::Auto,
    TokenKind::Register,
];

const TYPE_QUALIFIER_KEYWORDS: [TokenKind; 3] =
    [TokenKind::Const, TokenKind::Volatile, TokenKind::Restrict];

/// True for the specifier node kinds that name a type, ending the
/// window in which an identifier may match `typedef_name`.
fn is_type_specifier_node(node: &AstNode) -> bool {
    matches!(
        node.kind,
        AstKind::TypeSpecifier
            | AstKind::TypedefName
            | AstKind::StructOrUnionSpecifier
            | AstKind::EnumSpecifier
    )
}

/// True when the nested specifier chain contains `typedef`.
fn declares_typedef(specifiers: &AstNode) -> bool {
    specifiers.children.iter().any(|child| match child.kind {
        AstKind::StorageClassSpecifier => child.value.as_deref() == Some("typedef"),
        AstKind::DeclarationSpecifiers => declares_typedef(child),
        _ => false,
    })
}

impl Parser {
    /// `[DeclarationSpecifiers, InitDeclaratorList?]`, `;` consumed.
    ///
    /// Commits once the specifiers have matched; the dispatcher has
    /// already exonerated `function_definition` by the time this runs.
    pub(crate) fn declaration(&mut self) -> RuleResult {
        let specifiers = match self.declaration_specifiers(false)? {
            Some(node) => node,
            None => return Ok(None),
        };
        let declarators = self.init_declarator_list()?;
        self.expect_punctuator(';', "declaration")?;

        if declares_typedef(&specifiers) {
            if let Some(list) = &declarators {
                self.register_typedef_names(list);
            }
        }

        let mut children = vec![specifiers];
        if let Some(list) = declarators {
            children.push(list);
        }
        Ok(Some(AstNode::interior(AstKind::Declaration, children)))
    }

    /// Nested chain: `[specifier, DeclarationSpecifiers?]`.
    pub(crate) fn declaration_specifiers(&mut self, seen_type: bool) -> RuleResult {
        let first = match self.declaration_specifier(seen_type)? {
            Some(node) => node,
            None => return Ok(None),
        };
        let now_seen = seen_type || is_type_specifier_node(&first);

        let mut children = vec![first];
        if let Some(rest) = self.declaration_specifiers(now_seen)? {
            children.push(rest);
        }
        Ok(Some(AstNode::interior(AstKind::DeclarationSpecifiers, children)))
    }

    fn declaration_specifier(&mut self, seen_type: bool) -> RuleResult {
        if let Some(node) = self.storage_class_specifier()? {
            return Ok(Some(node));
        }
        if let Some(node) = self.type_specifier(seen_type)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.type_qualifier()? {
            return Ok(Some(node));
        }
        self.function_specifier()
    }

    fn storage_class_specifier(&mut self) -> RuleResult {
        match self.match_any(&STORAGE_CLASS_KEYWORDS) {
            Some(token) => Ok(Some(AstNode::leaf(AstKind::StorageClassSpecifier, token.lexeme))),
            None => Ok(None),
        }
    }

    pub(crate) fn type_specifier(&mut self, seen_type: bool) -> RuleResult {
        if let Some(token) = self.match_any(&TYPE_KEYWORDS) {
            return Ok(Some(AstNode::leaf(AstKind::TypeSpecifier, token.lexeme)));
        }
        if let Some(node) = self.struct_or_union_specifier()? {
            return Ok(Some(node));
        }
        if let Some(node) = self.enum_specifier()? {
            return Ok(Some(node));
        }
        if !seen_type {
            return self.typedef_name();
        }
        Ok(None)
    }

    pub(crate) fn type_qualifier(&mut self) -> RuleResult {
        match self.match_any(&TYPE_QUALIFIER_KEYWORDS) {
            Some(token) => Ok(Some(AstNode::leaf(AstKind::TypeQualifier, token.lexeme))),
            None => Ok(None),
        }
    }

    fn function_specifier(&mut self) -> RuleResult {
        match self.match_kind(TokenKind::Inline) {
            Some(token) => Ok(Some(AstNode::leaf(AstKind::FunctionSpecifier, token.lexeme))),
            None => Ok(None),
        }
    }

    /// An identifier previously declared by a typedef declaration.
    fn typedef_name(&mut self) -> RuleResult {
        let token = self.peek();
        if token.kind == TokenKind::Identifier && self.is_typedef_name(&token.lexeme) {
            let token = self.advance();
            return Ok(Some(AstNode::leaf(AstKind::TypedefName, token.lexeme)));
        }
        Ok(None)
    }

    // -- struct / union / enum --------------------------------------------

    /// `[StructOrUnion, Identifier?, StructDeclarationList?]`; the
    /// keyword commits, so a bare `struct ;` is fatal.
    fn struct_or_union_specifier(&mut self) -> RuleResult {
        let keyword = match self.match_any(&[TokenKind::Struct, TokenKind::Union]) {
            Some(token) => token,
            None => return Ok(None),
        };

        let mut children = vec![AstNode::leaf(AstKind::StructOrUnion, keyword.lexeme)];
        let mut named = false;
        if let Some(tag) = self.match_kind(TokenKind::Identifier) {
            children.push(AstNode::leaf(AstKind::Identifier, tag.lexeme));
            named = true;
        }

        if self.match_punctuator('{') {
            let members = self.struct_declaration_list()?;
            let members = self.require(members, "struct_or_union_specifier")?;
            children.push(members);
            self.expect_punctuator('}', "struct_or_union_specifier")?;
        } else if !named {
            return Err(self.fail("struct_or_union_specifier"));
        }

        Ok(Some(AstNode::interior(AstKind::StructOrUnionSpecifier, children)))
    }

    fn struct_declaration_list(&mut self) -> RuleResult {
        let mut items = Vec::new();
        while let Some(member) = self.struct_declaration()? {
            items.push(member);
        }
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(AstNode::interior(AstKind::StructDeclarationList, items)))
    }

    /// `[SpecifierQualifierList, StructDeclaratorList]`, `;` consumed.
    fn struct_declaration(&mut self) -> RuleResult {
        let specifiers = match self.specifier_qualifier_list(false)? {
            Some(node) => node,
            None => return Ok(None),
        };
        let declarators = self.struct_declarator_list()?;
        let declarators = self.require(declarators, "struct_declaration")?;
        self.expect_punctuator(';', "struct_declaration")?;
        Ok(Some(AstNode::interior(
            AstKind::StructDeclaration,
            vec![specifiers, declarators],
        )))
    }

    /// Nested chain: `[specifier-or-qualifier, SpecifierQualifierList?]`.
    pub(crate) fn specifier_qualifier_list(&mut self, seen_type: bool) -> RuleResult {
        let first = if let Some(node) = self.type_specifier(seen_type)? {
            node
        } else if let Some(node) = self.type_qualifier()? {
            node
        } else {
            return Ok(None);
        };
        let now_seen = seen_type || is_type_specifier_node(&first);

        let mut children = vec![first];
        if let Some(rest) = self.specifier_qualifier_list(now_seen)? {
            children.push(rest);
        }
        Ok(Some(AstNode::interior(AstKind::SpecifierQualifierList, children)))
    }

    fn struct_declarator_list(&mut self) -> RuleResult {
        let first = match self.struct_declarator()? {
            Some(node) => node,
            None => return Ok(None),
        };
        let mut items = vec![first];
        while self.match_punctuator(',') {
            let next = self.struct_declarator()?;
            let next = self.require(next, "struct_declarator_list")?;
            items.push(next);
        }
        Ok(Some(AstNode::interior(AstKind::StructDeclaratorList, items)))
    }

    /// `[Declarator]` or the bit-field form `[Declarator?, width]`.
    fn struct_declarator(&mut self) -> RuleResult {
        let declarator = self.declarator()?;
        if self.match_punctuator(':') {
            let width = self.constant_expression()?;
            let width = self.require(width, "struct_declarator")?;
            let mut children = Vec::new();
            if let Some(declarator) = declarator {
                children.push(declarator);
            }
            children.push(width);
            return Ok(Some(AstNode::interior(AstKind::StructDeclarator, children)));
        }
        match declarator {
            Some(declarator) => Ok(Some(AstNode::interior(
                AstKind::StructDeclarator,
                vec![declarator],
            ))),
            None => Ok(None),
        }
    }

    /// `[Identifier?, EnumeratorList?]`; the keyword commits like the
    /// struct form does.
    fn enum_specifier(&mut self) -> RuleResult {
        if self.match_kind(TokenKind::Enum).is_none() {
            return Ok(None);
        }

        let mut children = Vec::new();
        let mut named = false;
        if let Some(tag) = self.match_kind(TokenKind::Identifier) {
            children.push(AstNode::leaf(AstKind::Identifier, tag.lexeme));
            named = true;
        }

        if self.match_punctuator('{') {
            let list = self.enumerator_list()?;
            let list = self.require(list, "enum_specifier")?;
            children.push(list);
            self.expect_punctuator('}', "enum_specifier")?;
        } else if !named {
            return Err(self.fail("enum_specifier"));
        }

        Ok(Some(AstNode::interior(AstKind::EnumSpecifier, children)))
    }

    // No trailing comma: a comma commits the next enumerator.
    fn enumerator_list(&mut self) -> RuleResult {
        let first = match self.enumerator()? {
            Some(node) => node,
            None => return Ok(None),
        };
        let mut items = vec![first];
        while self.match_punctuator(',') {
            let next = self.enumerator()?;
            let next = self.require(next, "enumerator_list")?;
            items.push(next);
        }
        Ok(Some(AstNode::interior(AstKind::EnumeratorList, items)))
    }

    fn enumerator(&mut self) -> RuleResult {
        let name = match self.match_kind(TokenKind::Identifier) {
            Some(token) => token,
            None => return Ok(None),
        };
        let mut children = vec![AstNode::leaf(AstKind::Identifier, name.lexeme)];
        if self.match_punctuator('=') {
            let value = self.constant_expression()?;
            let value = self.require(value, "enumerator")?;
            children.push(value);
        }
        Ok(Some(AstNode::interior(AstKind::Enumerator, children)))
    }

    // -- declarators -------------------------------------------------------

    fn init_declarator_list(&mut self) -> RuleResult {
        let first = match self.init_declarator()? {
            Some(node) => node,
            None => return Ok(None),
        };
        let mut items = vec![first];
        while self.match_punctuator(',') {
            let next = self.init_declarator()?;
            let next = self.require(next, "init_declarator_list")?;
            items.push(next);
        }
        Ok(Some(AstNode::interior(AstKind::InitDeclaratorList, items)))
    }

    /// `[Declarator]` or `[Declarator, initializer]`, `=` consumed.
    fn init_declarator(&mut self) -> RuleResult {
        let declarator = match self.declarator()? {
            Some(node) => node,
            None => return Ok(None),
        };
        let mut children = vec![declarator];
        if self.match_punctuator('=') {
            let initializer = self.initializer()?;
            let initializer = self.require(initializer, "init_declarator")?;
            children.push(initializer);
        }
        Ok(Some(AstNode::interior(AstKind::InitDeclarator, children)))
    }

    /// `[Pointer?, DirectDeclarator]`.
    pub(crate) fn declarator(&mut self) -> RuleResult {
        let mark = self.mark();
        let pointer = self.pointer()?;
        let direct = match self.direct_declarator()? {
            Some(node) => node,
            None => {
                self.reset(mark);
                return Ok(None);
            }
        };

        let mut children = Vec::new();
        if let Some(pointer) = pointer {
            children.push(pointer);
        }
        children.push(direct);
        Ok(Some(AstNode::interior(AstKind::Declarator, children)))
    }

    /// `[base, suffix*]`: the base is an identifier or a parenthesized
    /// declarator; suffixes are array brackets and parameter lists.
    ///
    /// A `(` in suffix position commits to a parameter list, which is
    /// where a malformed argument list becomes a `function_arguments`
    /// error.
    fn direct_declarator(&mut self) -> RuleResult {
        let base = if let Some(token) = self.match_kind(TokenKind::Identifier) {
            AstNode::leaf(AstKind::Identifier, token.lexeme)
        } else {
            let mark = self.mark();
            if !self.match_punctuator('(') {
                return Ok(None);
            }
            match self.declarator()? {
                Some(inner) if self.match_punctuator(')') => inner,
                _ => {
                    self.reset(mark);
                    return Ok(None);
                }
            }
        };

        let mut children = vec![base];
        loop {
            if self.match_punctuator('[') {
                children.push(AstNode::leaf(AstKind::Punctuator, "["));
                if let Some(size) = self.constant_expression()? {
                    children.push(size);
                }
                self.expect_punctuator(']', "direct_declarator")?;
                continue;
            }
            if self.match_punctuator('(') {
                children.push(self.function_arguments()?);
                continue;
            }
            break;
        }

        Ok(Some(AstNode::interior(AstKind::DirectDeclarator, children)))
    }

    /// The committed inside of a function suffix, opening `(` already
    /// consumed: a parameter type list, a K&R identifier list or
    /// nothing, then the closing `)`.
    fn function_arguments(&mut self) -> Result<AstNode, SyntaxError> {
        let arguments = if let Some(node) = self.parameter_type_list()? {
            node
        } else if let Some(node) = self.identifier_list()? {
            node
        } else {
            AstNode::interior(AstKind::ParameterList, Vec::new())
        };
        self.expect_punctuator(')', "function_arguments")?;
        Ok(arguments)
    }

    /// `* type_qualifier_list? pointer?`, one node per `*`.
    fn pointer(&mut self) -> RuleResult {
        if !self.match_punctuator('*') {
            return Ok(None);
        }
        let mut children = Vec::new();
        if let Some(qualifiers) = self.type_qualifier_list()? {
            children.push(qualifiers);
        }
        if let Some(inner) = self.pointer()? {
            children.push(inner);
        }
        Ok(Some(AstNode::interior(AstKind::Pointer, children)))
    }

    fn type_qualifier_list(&mut self) -> RuleResult {
        let mut items = Vec::new();
        while let Some(qualifier) = self.type_qualifier()? {
            items.push(qualifier);
        }
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(AstNode::interior(AstKind::TypeQualifierList, items)))
    }

    /// The plain `ParameterList` when no ellipsis follows; otherwise
    /// `[ParameterList, Punctuator("...")]`.
    pub(crate) fn parameter_type_list(&mut self) -> RuleResult {
        let list = match self.parameter_list()? {
            Some(node) => node,
            None => return Ok(None),
        };
        if self.check_punctuator(',') && self.peek_at(1).kind == TokenKind::Ellipsis {
            self.advance(); // ','
            self.advance(); // '...'
            return Ok(Some(AstNode::interior(
                AstKind::ParameterTypeList,
                vec![list, AstNode::leaf(AstKind::Punctuator, "...")],
            )));
        }
        Ok(Some(list))
    }

    // The comma before an ellipsis belongs to parameter_type_list, so
    // the loop leaves it alone.
    fn parameter_list(&mut self) -> RuleResult {
        let first = match self.parameter_declaration()? {
            Some(node) => node,
            None => return Ok(None),
        };
        let mut items = vec![first];
        while self.check_punctuator(',') && self.peek_at(1).kind != TokenKind::Ellipsis {
            self.advance(); // ','
            let next = self.parameter_declaration()?;
            let next = self.require(next, "parameter_list")?;
            items.push(next);
        }
        Ok(Some(AstNode::interior(AstKind::ParameterList, items)))
    }

    /// `[DeclarationSpecifiers, Declarator | AbstractDeclarator | nothing]`.
    fn parameter_declaration(&mut self) -> RuleResult {
        let specifiers = match self.declaration_specifiers(false)? {
            Some(node) => node,
            None => return Ok(None),
        };
        let mut children = vec![specifiers];
        if let Some(declarator) = self.declarator()? {
            children.push(declarator);
        } else if let Some(abstract_declarator) = self.abstract_declarator()? {
            children.push(abstract_declarator);
        }
        Ok(Some(AstNode::interior(AstKind::ParameterDeclaration, children)))
    }

    /// K&R parameter names.
    fn identifier_list(&mut self) -> RuleResult {
        let first = match self.match_kind(TokenKind::Identifier) {
            Some(token) => token,
            None => return Ok(None),
        };
        let mut items = vec![AstNode::leaf(AstKind::Identifier, first.lexeme)];
        while self.match_punctuator(',') {
            let next = self.expect_kind(TokenKind::Identifier, "identifier_list")?;
            items.push(AstNode::leaf(AstKind::Identifier, next.lexeme));
        }
        Ok(Some(AstNode::interior(AstKind::IdentifierList, items)))
    }

    // -- type names and abstract declarators ------------------------------

    /// `[SpecifierQualifierList, AbstractDeclarator?]`.
    pub(crate) fn type_name(&mut self) -> RuleResult {
        let specifiers = match self.specifier_qualifier_list(false)? {
            Some(node) => node,
            None => return Ok(None),
        };
        let mut children = vec![specifiers];
        if let Some(abstract_declarator) = self.abstract_declarator()? {
            children.push(abstract_declarator);
        }
        Ok(Some(AstNode::interior(AstKind::TypeName, children)))
    }

    /// `[Pointer]` alone, or `[Pointer?, DirectAbstractDeclarator]`.
    fn abstract_declarator(&mut self) -> RuleResult {
        let pointer = self.pointer()?;
        let direct = self.direct_abstract_declarator()?;

        let mut children = Vec::new();
        if let Some(pointer) = pointer {
            children.push(pointer);
        }
        if let Some(direct) = direct {
            children.push(direct);
        }
        if children.is_empty() {
            return Ok(None);
        }
        Ok(Some(AstNode::interior(AstKind::AbstractDeclarator, children)))
    }

    /// Like `direct_declarator` but nameless; the parenthesized base is
    /// speculative because a leading `(` may instead open a parameter
    /// list suffix.
    fn direct_abstract_declarator(&mut self) -> RuleResult {
        let mut children = Vec::new();

        let mark = self.mark();
        if self.match_punctuator('(') {
            let mut based = false;
            if let Some(inner) = self.abstract_declarator()? {
                if self.match_punctuator(')') {
                    children.push(inner);
                    based = true;
                }
            }
            if !based {
                self.reset(mark);
            }
        }

        loop {
            if self.match_punctuator('[') {
                children.push(AstNode::leaf(AstKind::Punctuator, "["));
                if let Some(size) = self.constant_expression()? {
                    children.push(size);
                }
                self.expect_punctuator(']', "direct_abstract_declarator")?;
                continue;
            }
            if self.match_punctuator('(') {
                children.push(self.function_arguments()?);
                continue;
            }
            break;
        }

        if children.is_empty() {
            return Ok(None);
        }
        Ok(Some(AstNode::interior(AstKind::DirectAbstractDeclarator, children)))
    }

    // -- initializers ------------------------------------------------------

    /// An assignment expression returned bare, or a braced
    /// `InitializerList` (trailing comma allowed).
    pub(crate) fn initializer(&mut self) -> RuleResult {
        if self.match_punctuator('{') {
            let list = self.initializer_list()?;
            let list = self.require(list, "initializer")?;
            self.match_punctuator(',');
            self.expect_punctuator('}', "initializer")?;
            return Ok(Some(list));
        }
        self.assignment_expression()
    }

    pub(crate) fn initializer_list(&mut self) -> RuleResult {
        let first = match self.initializer_item()? {
            Some(node) => node,
            None => return Ok(None),
        };
        let mut items = vec![first];
        loop {
            let mark = self.mark();
            if !self.match_punctuator(',') {
                break;
            }
            match self.initializer_item()? {
                Some(item) => items.push(item),
                None => {
                    // trailing comma: hand it back to the caller
                    self.reset(mark);
                    break;
                }
            }
        }
        Ok(Some(AstNode::interior(AstKind::InitializerList, items)))
    }

    /// One list item: `Initializer[Designation, value]` when designated,
    /// otherwise the bare value.
    fn initializer_item(&mut self) -> RuleResult {
        if let Some(designation) = self.designation()? {
            let value = self.initializer()?;
            let value = self.require(value, "initializer_list")?;
            return Ok(Some(AstNode::interior(
                AstKind::Initializer,
                vec![designation, value],
            )));
        }
        self.initializer()
    }

    /// `[DesignatorList]`, `=` consumed and committed.
    fn designation(&mut self) -> RuleResult {
        let list = match self.designator_list()? {
            Some(node) => node,
            None => return Ok(None),
        };
        self.expect_punctuator('=', "designation")?;
        Ok(Some(AstNode::interior(AstKind::Designation, vec![list])))
    }

    fn designator_list(&mut self) -> RuleResult {
        let mut items = Vec::new();
        while let Some(designator) = self.designator()? {
            items.push(designator);
        }
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(AstNode::interior(AstKind::DesignatorList, items)))
    }

    /// Value `[` with the index expression as child, or value `.` with
    /// the member identifier.
    fn designator(&mut self) -> RuleResult {
        if self.match_punctuator('[') {
            let index = self.constant_expression()?;
            let index = self.require(index, "designator")?;
            self.expect_punctuator(']', "designator")?;
            return Ok(Some(AstNode::valued(AstKind::Designator, "[", vec![index])));
        }
        if self.match_punctuator('.') {
            let member = self.expect_kind(TokenKind::Identifier, "designator")?;
            return Ok(Some(AstNode::valued(
                AstKind::Designator,
                ".",
                vec![AstNode::leaf(AstKind::Identifier, member.lexeme)],
            )));
        }
        Ok(None)
    }
}
