use kls_core::{Position, Range};
use kls_vfs::{ContentChange, VfsPath};

use super::{content, harness, path, SinkEvent};

#[test]
fn newer_versions_apply_and_older_ones_are_ignored() {
    let mut h = harness();
    let f = path("/ws/F.kt");
    h.files.open(f.clone(), "val x = 1", 0);

    assert!(h.files.edit(&f, 1, &[ContentChange::full("val x = 2")]));
    assert_eq!(content(&h.files, "/ws/F.kt").as_deref(), Some("val x = 2"));
    assert_eq!(h.files.get(&f).map(|t| t.version()), Some(1));

    assert!(!h.files.edit(&f, 0, &[ContentChange::full("val x = 3")]));
    assert_eq!(content(&h.files, "/ws/F.kt").as_deref(), Some("val x = 2"));
    assert_eq!(h.files.get(&f).map(|t| t.version()), Some(1));
}

#[test]
fn repeated_version_is_ignored() {
    let mut h = harness();
    let f = path("/ws/F.kt");
    h.files.open(f.clone(), "a", 3);
    assert!(h.files.edit(&f, 4, &[ContentChange::full("b")]));
    assert!(!h.files.edit(&f, 4, &[ContentChange::full("c")]));
    assert_eq!(content(&h.files, "/ws/F.kt").as_deref(), Some("b"));
}

#[test]
fn ranged_changes_apply_in_order() {
    let mut h = harness();
    let f = path("/ws/F.kt");
    h.files.open(f.clone(), "fun f() {\n    a\n}\n", 1);

    let changes = [
        ContentChange::replace(Range::new(Position::new(1, 4), Position::new(1, 5)), "b + c"),
        ContentChange::replace(Range::point(Position::new(0, 0)), "// hi\n"),
    ];
    assert!(h.files.edit(&f, 2, &changes));
    assert_eq!(
        content(&h.files, "/ws/F.kt").as_deref(),
        Some("// hi\nfun f() {\n    b + c\n}\n")
    );
}

#[test]
fn accepted_edits_reach_the_sink() {
    let mut h = harness();
    let f = path("/ws/F.kt");
    h.files.open(f.clone(), "val x = 1", 0);
    assert_eq!(
        h.sink.take(),
        vec![SinkEvent::Put {
            path: f.clone(),
            content: "val x = 1".into(),
            temporary: false,
        }]
    );

    h.files.edit(&f, 1, &[ContentChange::full("val x = 2")]);
    h.files.edit(&f, 1, &[ContentChange::full("ignored")]);
    assert_eq!(
        h.sink.take(),
        vec![SinkEvent::Put {
            path: f,
            content: "val x = 2".into(),
            temporary: false,
        }]
    );
}

#[test]
fn untracked_and_inverted_edits_do_nothing() {
    let mut h = harness();
    assert!(!h.files.edit(&path("/ws/Missing.kt"), 1, &[ContentChange::full("x")]));

    let f = path("/ws/F.kt");
    h.files.open(f.clone(), "abc", 0);
    let inverted = ContentChange::replace(
        Range::new(Position::new(0, 2), Position::new(0, 1)),
        "x",
    );
    assert!(!h.files.edit(&f, 1, &[inverted]));
    assert_eq!(h.files.get(&f).map(|t| t.version()), Some(0));
}

#[test]
fn excluded_and_foreign_files_open_as_temporary() {
    let mut h = harness();
    h.files.open(path("/ws/build/Gen.kt"), "class Gen", 0);
    h.files.open(path("/tmp/Scratch.kt"), "class Scratch", 0);
    h.files.open(VfsPath::uri("untitled:Untitled-1"), "val a = 1", 0);
    h.files.open(path("/ws/src/Main.kt"), "class Main", 0);

    let temporary = |p: &VfsPath| h.files.get(p).map(|t| t.is_temporary());
    assert_eq!(temporary(&path("/ws/build/Gen.kt")), Some(true));
    assert_eq!(temporary(&path("/tmp/Scratch.kt")), Some(true));
    assert_eq!(temporary(&VfsPath::uri("untitled:Untitled-1")), Some(true));
    assert_eq!(temporary(&path("/ws/src/Main.kt")), Some(false));
}

#[test]
fn crlf_is_normalized_on_open_and_edit() {
    let mut h = harness();
    let f = path("/ws/F.kt");
    h.files.open(f.clone(), "a\r\nb", 0);
    assert_eq!(content(&h.files, "/ws/F.kt").as_deref(), Some("a\nb"));
    h.files.edit(&f, 1, &[ContentChange::full("c\r\nd\r\n")]);
    assert_eq!(content(&h.files, "/ws/F.kt").as_deref(), Some("c\nd\n"));
}
