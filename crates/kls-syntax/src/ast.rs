//! Typed views over [`SyntaxNode`]s.

use crate::syntax_kind::{SyntaxKind, SyntaxNode, SyntaxToken};

pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(syntax: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

pub mod support {
    use super::AstNode;
    use crate::syntax_kind::{SyntaxKind, SyntaxNode, SyntaxToken};

    pub fn child<N: AstNode>(node: &SyntaxNode) -> Option<N> {
        node.children().find_map(N::cast)
    }

    pub fn children<'a, N: AstNode + 'a>(node: &'a SyntaxNode) -> impl Iterator<Item = N> + 'a {
        node.children().filter_map(N::cast)
    }

    pub fn token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
        node.children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|tok| tok.kind() == kind)
    }

    /// Expression children, in source order.
    pub fn expressions(node: &SyntaxNode) -> impl Iterator<Item = SyntaxNode> {
        node.children().filter(|n| n.kind().is_expression())
    }

    /// The first operator-like token among the node's direct children.
    pub fn operator(node: &SyntaxNode) -> Option<SyntaxToken> {
        node.children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|tok| !tok.kind().is_trivia())
    }
}

macro_rules! ast_nodes {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, PartialEq, Eq, Hash)]
            pub struct $name {
                syntax: SyntaxNode,
            }

            impl AstNode for $name {
                fn can_cast(kind: SyntaxKind) -> bool {
                    kind == SyntaxKind::$kind
                }

                fn cast(syntax: SyntaxNode) -> Option<Self> {
                    Self::can_cast(syntax.kind()).then(|| Self { syntax })
                }

                fn syntax(&self) -> &SyntaxNode {
                    &self.syntax
                }
            }
        )*
    };
}

ast_nodes! {
    SourceFile => SourceFile,
    ClassDeclaration => ClassDeclaration,
    ClassBody => ClassBody,
    FunctionDeclaration => FunctionDeclaration,
    ParameterList => ParameterList,
    Parameter => Parameter,
    TypeReference => TypeReference,
    PropertyDeclaration => PropertyDeclaration,
    Block => Block,
    DotQualifiedExpression => DotQualifiedExpression,
    SafeQualifiedExpression => SafeQualifiedExpression,
    CallExpression => CallExpression,
    ReferenceExpression => ReferenceExpression,
    LiteralExpression => LiteralExpression,
    BinaryExpression => BinaryExpression,
    PrefixExpression => PrefixExpression,
    ParenthesizedExpression => ParenthesizedExpression,
    IfExpression => IfExpression,
    ReturnExpression => ReturnExpression,
}

fn name_token(node: &SyntaxNode) -> Option<SyntaxToken> {
    support::token(node, SyntaxKind::Identifier)
}

impl SourceFile {
    pub fn package_name(&self) -> Option<String> {
        let directive = self
            .syntax
            .children()
            .find(|n| n.kind() == SyntaxKind::PackageDirective)?;
        let name = directive
            .children()
            .find(|n| n.kind() == SyntaxKind::QualifiedName)?;
        Some(name.text().to_string().split_whitespace().collect())
    }

    /// Top-level declarations.
    pub fn declarations(&self) -> impl Iterator<Item = SyntaxNode> {
        self.syntax.children().filter(|n| n.kind().is_declaration())
    }
}

impl ClassDeclaration {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.syntax)
    }

    /// Primary constructor parameters.
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> {
        support::child::<ParameterList>(&self.syntax)
            .into_iter()
            .flat_map(|list| list.parameters().collect::<Vec<_>>())
    }

    pub fn members(&self) -> impl Iterator<Item = SyntaxNode> {
        support::child::<ClassBody>(&self.syntax)
            .into_iter()
            .flat_map(|body| {
                body.syntax
                    .children()
                    .filter(|n| n.kind().is_declaration())
                    .collect::<Vec<_>>()
            })
    }
}

impl FunctionDeclaration {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.syntax)
    }

    pub fn parameters(&self) -> impl Iterator<Item = Parameter> {
        support::child::<ParameterList>(&self.syntax)
            .into_iter()
            .flat_map(|list| list.parameters().collect::<Vec<_>>())
    }

    pub fn return_type(&self) -> Option<TypeReference> {
        support::child(&self.syntax)
    }

    /// The function body: a block, or the expression after `=`.
    pub fn body(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).next()
    }

    pub fn has_expression_body(&self) -> bool {
        support::token(&self.syntax, SyntaxKind::Eq).is_some()
    }
}

impl ParameterList {
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + '_ {
        support::children(&self.syntax)
    }
}

impl Parameter {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.syntax)
    }

    pub fn type_reference(&self) -> Option<TypeReference> {
        support::child(&self.syntax)
    }

    /// Whether the parameter declares a property (`val x: Int` in a primary
    /// constructor).
    pub fn has_val_or_var(&self) -> bool {
        support::token(&self.syntax, SyntaxKind::ValKw).is_some()
            || support::token(&self.syntax, SyntaxKind::VarKw).is_some()
    }

    pub fn default_value(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).next()
    }
}

impl TypeReference {
    /// The referenced type name without whitespace, type arguments or `?`.
    pub fn name_text(&self) -> String {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .take_while(|tok| !matches!(tok.kind(), SyntaxKind::Less | SyntaxKind::Question))
            .filter(|tok| matches!(tok.kind(), SyntaxKind::Identifier | SyntaxKind::Dot))
            .map(|tok| tok.text().to_string())
            .collect()
    }

    pub fn is_nullable(&self) -> bool {
        support::token(&self.syntax, SyntaxKind::Question).is_some()
    }
}

impl PropertyDeclaration {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.syntax)
    }

    pub fn type_reference(&self) -> Option<TypeReference> {
        support::child(&self.syntax)
    }

    pub fn initializer(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).next()
    }

    pub fn is_mutable(&self) -> bool {
        support::token(&self.syntax, SyntaxKind::VarKw).is_some()
    }
}

impl Block {
    pub fn statements(&self) -> impl Iterator<Item = SyntaxNode> {
        self.syntax
            .children()
            .filter(|n| n.kind().is_expression() || n.kind().is_declaration())
    }
}

impl DotQualifiedExpression {
    pub fn receiver(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).next()
    }

    pub fn selector(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).nth(1)
    }
}

impl SafeQualifiedExpression {
    pub fn receiver(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).next()
    }

    pub fn selector(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).nth(1)
    }
}

impl CallExpression {
    pub fn callee(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).next()
    }

    pub fn arguments(&self) -> Vec<SyntaxNode> {
        self.syntax
            .children()
            .filter(|n| n.kind() == SyntaxKind::ValueArgumentList)
            .flat_map(|list| list.children().collect::<Vec<_>>())
            .filter_map(|arg| support::expressions(&arg).next())
            .collect()
    }
}

impl ReferenceExpression {
    pub fn name(&self) -> Option<SyntaxToken> {
        name_token(&self.syntax)
    }
}

impl LiteralExpression {
    pub fn token(&self) -> Option<SyntaxToken> {
        support::operator(&self.syntax)
    }
}

impl BinaryExpression {
    pub fn lhs(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).next()
    }

    pub fn rhs(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).nth(1)
    }

    pub fn op(&self) -> Option<SyntaxToken> {
        support::operator(&self.syntax)
    }
}

impl PrefixExpression {
    pub fn op(&self) -> Option<SyntaxToken> {
        support::operator(&self.syntax)
    }

    pub fn operand(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).next()
    }
}

impl ParenthesizedExpression {
    pub fn expression(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).next()
    }
}

impl IfExpression {
    pub fn condition(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).next()
    }

    pub fn then_branch(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).nth(1)
    }

    pub fn else_branch(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).nth(2)
    }
}

impl ReturnExpression {
    pub fn value(&self) -> Option<SyntaxNode> {
        support::expressions(&self.syntax).next()
    }
}
