use std::sync::Arc;
use std::time::Duration;

use kls_db::SourcePath;
use kls_test_utils::SketchFrontend;
use rayon::prelude::*;

use super::path;

fn workspace(files: usize) -> (Arc<SketchFrontend>, SourcePath<SketchFrontend>) {
    let frontend = Arc::new(SketchFrontend::new());
    frontend.set_analysis_delay(Duration::from_millis(2));
    let source_path = SourcePath::new(Arc::clone(&frontend));
    for i in 0..files {
        let text = format!("fun f{i}(a: Int) = a + {i}");
        source_path.put(&path(&format!("F{i}.kt")), Arc::from(text.as_str()), false);
    }
    (frontend, source_path)
}

#[test]
fn analyzer_calls_never_overlap() {
    let (frontend, source_path) = workspace(8);

    let types: Vec<_> = (0..8)
        .into_par_iter()
        .map(|i| {
            let compiled = source_path.current_version(&path(&format!("F{i}.kt")))?;
            compiled.type_at_point(17.into())
        })
        .collect();

    assert!(types.iter().all(Option::is_some), "{types:?}");
    assert_eq!(frontend.file_analysis_count(), 8);
    assert_eq!(frontend.expression_analysis_count(), 8);
    assert_eq!(frontend.max_concurrent_analyses(), 1);
}

#[test]
fn concurrent_queries_compile_a_file_once() {
    let (frontend, source_path) = workspace(1);

    let contexts: Vec<_> = (0..16)
        .into_par_iter()
        .filter_map(|_| source_path.current_version(&path("F0.kt")))
        .map(|compiled| Arc::clone(compiled.compile()))
        .collect();

    assert_eq!(contexts.len(), 16);
    assert_eq!(frontend.file_analysis_count(), 1);
    assert!(contexts.iter().all(|context| Arc::ptr_eq(context, &contexts[0])));
}

#[test]
fn edits_racing_with_compiles_settle_on_the_last_text() {
    let (_, source_path) = workspace(1);

    (0..20).into_par_iter().for_each(|i| {
        if i % 2 == 0 {
            let text = format!("fun f0(a: Int) = a + {i}");
            source_path.put(&path("F0.kt"), Arc::from(text.as_str()), false);
        } else {
            source_path.current_version(&path("F0.kt"));
        }
    });

    source_path.put(&path("F0.kt"), Arc::from("val done = true"), false);
    let compiled = source_path.current_version(&path("F0.kt")).unwrap();
    assert!(!compiled.is_stale());
    assert_eq!(&**compiled.parse().text(), "val done = true");
}
