use kls_syntax::{SyntaxKind, TextRange, TextSize};
use kls_test_utils::{extract_cursor, offset_of, DeclarationKind, SketchType};
use pretty_assertions::assert_eq;

use super::{fs_path, path, Fixture};

#[test]
fn type_at_point_follows_unsaved_edits() {
    let fx = Fixture::new(&[("Main.kt", "fun f(a: Int) = a + 1")]);
    fx.source_path.current_version(&path("Main.kt")).unwrap();
    fx.put("Main.kt", "fun f(a: Int) = a + 42");

    let compiled = fx.source_path.latest_compiled_version(&path("Main.kt")).unwrap();
    assert!(compiled.is_stale());
    assert_eq!(compiled.type_at_point(20.into()), Some(SketchType::Int));
    assert_eq!(compiled.type_at_point(16.into()), Some(SketchType::Int));
    assert_eq!(fx.frontend.file_analysis_count(), 1);
    assert_eq!(fx.frontend.expression_analysis_count(), 2);
}

#[test]
fn type_at_point_widens_to_the_member_access() {
    let (text, cursor) = extract_cursor(
        "class Box(val label: String)\nfun f(b: Box) {\n    b.la$0bel\n}",
    );
    let fx = Fixture::new(&[("Main.kt", text.as_str())]);
    let compiled = fx.source_path.current_version(&path("Main.kt")).unwrap();

    assert_eq!(compiled.type_at_point(cursor), Some(SketchType::String));
}

#[test]
fn type_at_point_on_a_parameter_name() {
    let fx = Fixture::new(&[("Main.kt", "fun f(a: Int) = a")]);
    let compiled = fx.source_path.current_version(&path("Main.kt")).unwrap();

    assert_eq!(compiled.type_at_point(6.into()), Some(SketchType::Int));
}

#[test]
fn reference_at_point_resolves_across_files() {
    let fx = Fixture::new(&[
        ("A.kt", "class Box(val value: Int)"),
        ("B.kt", "fun use(b: Box) = b.value"),
    ]);
    let compiled = fx.source_path.current_version(&path("B.kt")).unwrap();

    let (key, target) = compiled.reference_at_point(22.into()).unwrap();
    assert_eq!(key.range, TextRange::new(20.into(), 25.into()));
    assert_eq!(key.kind, SyntaxKind::ReferenceExpression);
    assert_eq!(target.name, "value");
    assert_eq!(target.kind, DeclarationKind::Property);
    assert_eq!(target.container.as_deref(), Some("Box"));
    assert_eq!(target.path, fs_path("A.kt"));
    assert_eq!(target.range, TextRange::new(14.into(), 19.into()));

    let (_, receiver) = compiled.reference_at_point(18.into()).unwrap();
    assert_eq!(receiver.name, "b");
    assert_eq!(receiver.kind, DeclarationKind::Parameter);
    assert_eq!(receiver.ty, Some(SketchType::Class("Box".into())));
}

#[test]
fn reference_at_point_on_a_class_name() {
    let fx = Fixture::new(&[("Main.kt", "\n\nclass Widget\nval w = Widget()")]);
    let compiled = fx.source_path.current_version(&path("Main.kt")).unwrap();

    let (key, target) = compiled.reference_at_point(8.into()).unwrap();
    assert_eq!(key.kind, SyntaxKind::TypeReference);
    assert_eq!(target.kind, DeclarationKind::Class);
    assert_eq!(target.name, "Widget");
    assert_eq!(target.range, TextRange::new(8.into(), 14.into()));
}

#[test]
fn reference_expression_at_point_maps_the_cursor_back() {
    let text = "class Box(val value: Int)\nfun use(b: Box) = b.value";
    let fx = Fixture::new(&[("Main.kt", text)]);
    fx.source_path.current_version(&path("Main.kt")).unwrap();
    fx.put("Main.kt", &format!("\n{text}"));

    let compiled = fx.source_path.latest_compiled_version(&path("Main.kt")).unwrap();
    let cursor = offset_of(text, "b.value", 0) + TextSize::from(1);
    let (key, target) = compiled.reference_expression_at_point(cursor).unwrap();

    assert_eq!(key.range, TextRange::at(offset_of(text, "b.value", 0), 1.into()));
    assert_eq!(target.name, "b");
    assert_eq!(fx.frontend.expression_analysis_count(), 0);
}

#[test]
fn scope_at_point_picks_the_innermost_scope() {
    let text = "fun f(a: Int) {\n    val b = a\n}";
    let fx = Fixture::new(&[("Main.kt", text)]);
    let compiled = fx.source_path.current_version(&path("Main.kt")).unwrap();

    let block = compiled.scope_at_point(offset_of(text, "b =", 0)).unwrap();
    assert_eq!(block.local_names(), vec!["b"]);
    assert_eq!(
        block.lookup("a").map(|declaration| declaration.kind),
        Some(DeclarationKind::Parameter)
    );

    let function = compiled.scope_at_point(6.into()).unwrap();
    assert_eq!(function.local_names(), vec!["a"]);
}

#[test]
fn element_and_declaration_at_point() {
    let text = "class Widget\nfun make() = Widget()";
    let fx = Fixture::new(&[("Main.kt", text)]);
    let compiled = fx.source_path.current_version(&path("Main.kt")).unwrap();

    let element = compiled.element_at_point(18.into()).unwrap();
    assert_eq!(element.kind(), SyntaxKind::FunctionDeclaration);

    let (declaration, name) = compiled.declaration_at_point(18.into()).unwrap();
    assert_eq!(declaration.kind(), SyntaxKind::FunctionDeclaration);
    assert_eq!(name, TextRange::new(17.into(), 21.into()));

    let call = offset_of(text, "Widget()", 0);
    let element = compiled.element_at_point(call).unwrap();
    assert_eq!(element.kind(), SyntaxKind::ReferenceExpression);

    let (declaration, name) = compiled.declaration_at_point(7.into()).unwrap();
    assert_eq!(declaration.kind(), SyntaxKind::ClassDeclaration);
    assert_eq!(name, TextRange::new(6.into(), 12.into()));
}

#[test]
fn failed_expression_analysis_yields_nothing() {
    let fx = Fixture::new(&[("Main.kt", "val a = 1 + 2")]);
    let compiled = fx.source_path.current_version(&path("Main.kt")).unwrap();
    fx.frontend.fail_expression_analysis(true);

    assert_eq!(compiled.type_at_point(8.into()), None);
    assert!(compiled.reference_at_point(8.into()).is_none());
    assert_eq!(fx.frontend.expression_analysis_count(), 2);
}

#[test]
fn position_helpers_use_the_live_text() {
    let fx = Fixture::new(&[("Main.kt", "fun f() {\n    1\n}")]);
    fx.source_path.current_version(&path("Main.kt")).unwrap();
    fx.put("Main.kt", "fun f() {\n    val x = 1\n}");

    let compiled = fx.source_path.latest_compiled_version(&path("Main.kt")).unwrap();
    let cursor = TextSize::from(19);
    assert_eq!(compiled.line_before(cursor), "    val x");
    assert_eq!(compiled.line_after(cursor), " = 1");
    assert_eq!(compiled.describe_position(cursor), "Main.kt 2:10");
}
