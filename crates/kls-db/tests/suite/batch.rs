use std::path::Path;
use std::sync::Arc;

use kls_db::{CompilationKind, SyntaxKey};
use kls_syntax::{SyntaxKind, TextRange};
use kls_test_utils::SketchType;
use pretty_assertions::assert_eq;

use super::{fs_path, path, Fixture};

const FILES: &[(&str, &str)] = &[
    ("A.kt", "val a = 1"),
    ("B.kt", "val b = a + 1"),
    ("C.kt", "val c = \"c\""),
];

fn all_paths() -> Vec<kls_vfs::VfsPath> {
    FILES.iter().map(|(name, _)| path(name)).collect()
}

#[test]
fn changed_files_are_analyzed_in_one_call() {
    let fx = Fixture::new(FILES);

    let composite = fx.source_path.compile_files(&all_paths());
    assert_eq!(fx.frontend.file_analysis_count(), 1);
    assert_eq!(fx.frontend.analyzed_file_count(), 3);
    assert_eq!(composite.contexts().len(), 1);

    fx.put("B.kt", "val b = a + 2");
    let composite = fx.source_path.compile_files(&all_paths());
    assert_eq!(fx.frontend.file_analysis_count(), 2);
    assert_eq!(fx.frontend.analyzed_file_count(), 4);
    // The new context for B and the shared one still used by A and C.
    assert_eq!(composite.contexts().len(), 2);
}

#[test]
fn unchanged_batch_makes_no_analyzer_call() {
    let fx = Fixture::new(FILES);
    let first = fx.source_path.compile_files(&all_paths());
    let second = fx.source_path.compile_files(&all_paths());

    assert_eq!(fx.frontend.file_analysis_count(), 1);
    assert_eq!(second.contexts().len(), 1);
    assert!(Arc::ptr_eq(&first.contexts()[0], &second.contexts()[0]));
}

#[test]
fn batch_results_match_single_file_compiles() {
    let batched = Fixture::new(FILES);
    let single = Fixture::new(FILES);

    let composite = batched.source_path.compile_files(&all_paths());
    single.source_path.compile_if_changed(&path("B.kt")).unwrap();
    let alone = single.source_path.compiled_context(&path("B.kt")).unwrap();

    let key = SyntaxKey::new(
        fs_path("B.kt"),
        TextRange::new(8.into(), 13.into()),
        SyntaxKind::BinaryExpression,
    );
    assert_eq!(composite.type_of(&key), Some(&SketchType::Int));
    assert_eq!(alone.type_of(&key), Some(&SketchType::Int));
    assert_eq!(
        composite.diagnostics_for(Path::new("/ws/B.kt")),
        alone.diagnostics().to_vec()
    );
}

#[test]
fn build_scripts_are_compiled_separately() {
    let fx = Fixture::new(&[
        ("A.kt", "val a = 1"),
        ("build.gradle.kts", "val version = \"1.0\""),
    ]);

    let composite = fx
        .source_path
        .compile_files(&[path("A.kt"), path("build.gradle.kts")]);
    assert_eq!(fx.frontend.file_analysis_count(), 2);
    assert_eq!(composite.contexts().len(), 2);

    let script = fx.source_path.current_version(&path("build.gradle.kts")).unwrap();
    assert_eq!(script.kind(), CompilationKind::BuildScript);
    assert!(script.is_script());
    assert_eq!(fx.frontend.file_analysis_count(), 2);
}

#[test]
fn unknown_paths_are_skipped() {
    let fx = Fixture::new(FILES);
    let composite = fx
        .source_path
        .compile_files(&[path("Missing.kt"), path("A.kt")]);
    assert_eq!(composite.contexts().len(), 1);
    assert_eq!(fx.frontend.analyzed_file_count(), 1);
}

#[test]
fn failed_batch_keeps_previous_contexts() {
    let fx = Fixture::new(FILES);
    let first = fx.source_path.compile_files(&all_paths());

    fx.frontend.fail_file_analysis(true);
    fx.put("A.kt", "val a = 5");
    let composite = fx.source_path.compile_files(&all_paths());

    assert_eq!(composite.contexts().len(), 1);
    assert!(Arc::ptr_eq(&first.contexts()[0], &composite.contexts()[0]));
    let compiled = fx.source_path.latest_compiled_version(&path("A.kt")).unwrap();
    assert!(compiled.is_stale());
}

#[test]
fn diagnostics_are_reported_per_file() {
    let fx = Fixture::new(&[("A.kt", "val a = 1"), ("B.kt", "val b = missing")]);
    let composite = fx.source_path.compile_files(&[path("A.kt"), path("B.kt")]);

    assert!(composite.diagnostics_for(Path::new("/ws/A.kt")).is_empty());
    let messages: Vec<String> = composite
        .diagnostics_for(Path::new("/ws/B.kt"))
        .into_iter()
        .map(|diagnostic| diagnostic.message)
        .collect();
    assert_eq!(messages, vec!["Unresolved reference: missing".to_string()]);
}

#[test]
fn compile_all_files_skips_temporary_files() {
    let fx = Fixture::new(&[("A.kt", "val a = 1"), ("B.kt", "val b = 2")]);
    fx.source_path
        .put(&path("T.kt"), Arc::from("val t = 3"), true);

    fx.source_path.compile_all_files();

    assert_eq!(fx.frontend.file_analysis_count(), 2);
    assert!(fx.source_path.compiled_context(&path("A.kt")).is_some());
    assert!(fx.source_path.compiled_context(&path("B.kt")).is_some());
    assert!(fx.source_path.compiled_context(&path("T.kt")).is_none());
}

#[test]
fn recompiled_files_ignore_their_old_batch_context() {
    let fx = Fixture::new(&[("A.kt", "val a = missing"), ("B.kt", "val b = nothing")]);
    let paths = [path("A.kt"), path("B.kt")];
    fx.source_path.compile_files(&paths);

    fx.put("A.kt", "val a = 1");
    let composite = fx.source_path.compile_files(&paths);

    assert_eq!(composite.contexts().len(), 2);
    assert!(composite.diagnostics_for(Path::new("/ws/A.kt")).is_empty());
    let messages: Vec<&str> = composite
        .diagnostics()
        .map(|diagnostic| diagnostic.message.as_str())
        .collect();
    assert_eq!(messages, vec!["Unresolved reference: nothing"]);

    let literal = SyntaxKey::new(
        fs_path("A.kt"),
        TextRange::new(8.into(), 9.into()),
        SyntaxKind::LiteralExpression,
    );
    assert_eq!(composite.type_of(&literal), Some(&SketchType::Int));
    assert!(composite.context_of(Path::new("/ws/Missing.kt")).is_none());
}
