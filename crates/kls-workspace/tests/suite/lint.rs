use std::sync::Arc;

use kls_core::{Position, Range};
use kls_db::Severity;
use kls_test_utils::SketchFrontend;
use kls_vfs::ContentChange;
use kls_workspace::LintDiagnostic;
use pretty_assertions::assert_eq;
use rayon::prelude::*;

use super::Fixture;

fn files() -> Fixture {
    Fixture::new(&[("A.kt", "val a = missing"), ("B.kt", "val b = 1")])
}

#[test]
fn lint_reports_editor_ranges() {
    let fx = files();
    let diagnostics = fx.workspace.lint(&[fx.file("A.kt"), fx.file("B.kt")]);

    assert_eq!(
        diagnostics,
        vec![LintDiagnostic {
            path: fx.file("A.kt"),
            range: Range::new(Position::new(0, 8), Position::new(0, 15)),
            severity: Severity::Error,
            message: "Unresolved reference: missing".to_owned(),
        }]
    );
}

#[test]
fn lint_compiles_the_batch_once() {
    let fx = files();
    let paths = [fx.file("A.kt"), fx.file("B.kt")];

    fx.workspace.lint(&paths);
    fx.workspace.lint(&paths);

    assert_eq!(fx.frontend.file_analysis_count(), 1);
    assert_eq!(fx.frontend.analyzed_file_count(), 2);
}

#[test]
fn fixing_a_file_clears_its_diagnostics() {
    let fx = files();
    let a = fx.file("A.kt");
    assert_eq!(fx.workspace.lint(std::slice::from_ref(&a)).len(), 1);

    fx.workspace.open_document(a.clone(), "val a = missing", 1);
    fx.workspace
        .change_document(&a, 2, &[ContentChange::full("val a = b")]);

    assert!(fx.workspace.lint(std::slice::from_ref(&a)).is_empty());
}

#[test]
fn replaced_frontend_recompiles_compiled_files() {
    let fx = files();
    fx.workspace.lint(&[fx.file("A.kt"), fx.file("B.kt")]);

    let replacement = Arc::new(SketchFrontend::new());
    fx.workspace.replace_frontend(Arc::clone(&replacement));

    assert_eq!(replacement.file_analysis_count(), 2);
    assert_eq!(fx.frontend.file_analysis_count(), 1);
}

#[test]
fn concurrent_edits_and_lints_settle() {
    let fx = files();
    let a = fx.file("A.kt");
    fx.workspace.open_document(a.clone(), "val a = missing", 0);

    (1..=20).into_par_iter().for_each(|version| {
        if version % 2 == 0 {
            let text = format!("val a = {version}");
            fx.workspace
                .change_document(&a, version, &[ContentChange::full(text)]);
        } else {
            fx.workspace.lint(std::slice::from_ref(&a));
        }
    });

    fx.workspace
        .change_document(&a, 100, &[ContentChange::full("val a = missing + 1")]);
    let diagnostics = fx.workspace.lint(std::slice::from_ref(&a));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "Unresolved reference: missing");
}

#[test]
fn relinting_a_batch_drops_fixed_diagnostics() {
    let fx = Fixture::new(&[("A.kt", "val a = missing"), ("B.kt", "val b = nothing")]);
    let (a, b) = (fx.file("A.kt"), fx.file("B.kt"));
    let paths = [a.clone(), b.clone()];
    assert_eq!(fx.workspace.lint(&paths).len(), 2);

    fx.workspace.open_document(a.clone(), "val a = missing", 1);
    fx.workspace
        .change_document(&a, 2, &[ContentChange::full("val a = 1")]);

    let diagnostics = fx.workspace.lint(&paths);
    let reported: Vec<_> = diagnostics
        .iter()
        .map(|diagnostic| (diagnostic.path.clone(), diagnostic.message.as_str()))
        .collect();
    assert_eq!(reported, vec![(b, "Unresolved reference: nothing")]);
}
