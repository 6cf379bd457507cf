use kls_syntax::ast::{
    AstNode, BinaryExpression, CallExpression, DotQualifiedExpression, IfExpression,
    PropertyDeclaration, SafeQualifiedExpression,
};
use kls_syntax::SyntaxKind;

use super::{first_of, parse};

fn initializer(text: &str) -> kls_syntax::SyntaxNode {
    let file = parse(text);
    assert!(file.errors().is_empty(), "{:?}", file.errors());
    let property =
        PropertyDeclaration::cast(first_of(&file.syntax(), SyntaxKind::PropertyDeclaration)).unwrap();
    property.initializer().unwrap()
}

#[test]
fn member_call_chain_nests_left_to_right() {
    let expr = initializer("val y = a.b(c)?.d");
    let safe = SafeQualifiedExpression::cast(expr).unwrap();
    assert_eq!(safe.selector().unwrap().to_string(), "d");

    let dot = DotQualifiedExpression::cast(safe.receiver().unwrap()).unwrap();
    assert_eq!(dot.receiver().unwrap().to_string(), "a");

    let call = CallExpression::cast(dot.selector().unwrap()).unwrap();
    assert_eq!(call.callee().unwrap().kind(), SyntaxKind::ReferenceExpression);
    let args: Vec<_> = call.arguments().iter().map(|a| a.to_string()).collect();
    assert_eq!(args, vec!["c"]);
}

#[test]
fn direct_call_wraps_callee() {
    let expr = initializer("val s = listOf(1, \"two\", x.y)");
    let call = CallExpression::cast(expr).unwrap();
    assert_eq!(call.callee().unwrap().to_string(), "listOf");
    let kinds: Vec<_> = call.arguments().iter().map(|a| a.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            SyntaxKind::LiteralExpression,
            SyntaxKind::LiteralExpression,
            SyntaxKind::DotQualifiedExpression
        ]
    );
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let expr = initializer("val z = 1 + 2 * 3 - 4");
    let outer = BinaryExpression::cast(expr).unwrap();
    assert_eq!(outer.op().unwrap().kind(), SyntaxKind::Minus);
    let inner = BinaryExpression::cast(outer.lhs().unwrap()).unwrap();
    assert_eq!(inner.op().unwrap().kind(), SyntaxKind::Plus);
    assert_eq!(inner.rhs().unwrap().to_string(), "2 * 3");
}

#[test]
fn if_else_branches() {
    let expr = initializer("val m = if (a > b) a else { b }");
    let if_expr = IfExpression::cast(expr).unwrap();
    assert_eq!(if_expr.condition().unwrap().kind(), SyntaxKind::BinaryExpression);
    assert_eq!(if_expr.then_branch().unwrap().to_string(), "a");
    assert_eq!(if_expr.else_branch().unwrap().kind(), SyntaxKind::Block);
}

#[test]
fn line_break_ends_a_statement() {
    let file = parse("fun f() {\n    val a = b\n    (c)\n    -d\n}");
    assert!(file.errors().is_empty(), "{:?}", file.errors());
    let block = first_of(&file.syntax(), SyntaxKind::Block);
    let kinds: Vec<_> = block.children().map(|n| n.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            SyntaxKind::PropertyDeclaration,
            SyntaxKind::ParenthesizedExpression,
            SyntaxKind::PrefixExpression
        ]
    );
}

#[test]
fn logical_operators_continue_across_lines() {
    let expr = initializer("val ok = a\n    && b");
    assert_eq!(expr.kind(), SyntaxKind::BinaryExpression);
}
