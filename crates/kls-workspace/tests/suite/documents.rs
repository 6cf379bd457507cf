use kls_core::Position;
use kls_test_utils::{SketchType, TempWorkspace};
use kls_vfs::{ContentChange, FileChange, FileChangeKind, VfsPath};
use pretty_assertions::assert_eq;

use super::Fixture;

#[test]
fn editor_changes_reach_the_cache() {
    let fx = Fixture::new(&[("Main.kt", "val a = 1")]);
    let main = fx.file("Main.kt");

    fx.workspace.open_document(main.clone(), "val a = 1", 1);
    assert!(fx
        .workspace
        .change_document(&main, 2, &[ContentChange::full("val a = \"s\"")]));

    let compiled = fx.workspace.current_version(&main).unwrap();
    assert_eq!(compiled.type_at_point(8.into()), Some(SketchType::String));
    assert_eq!(fx.workspace.document_version(&main), Some(2));
}

#[test]
fn stale_versions_are_rejected() {
    let fx = Fixture::new(&[("Main.kt", "val a = 1")]);
    let main = fx.file("Main.kt");

    fx.workspace.open_document(main.clone(), "val a = 1", 3);
    assert!(!fx
        .workspace
        .change_document(&main, 2, &[ContentChange::full("val a = 2")]));
    assert_eq!(fx.workspace.content(&main).as_deref(), Some("val a = 1"));
}

#[test]
fn closing_reverts_to_the_disk_text() {
    let fx = Fixture::new(&[("Main.kt", "val a = 1")]);
    let main = fx.file("Main.kt");

    fx.workspace.open_document(main.clone(), "val a = 2", 1);
    assert_eq!(
        fx.workspace.source_path().content(&main).as_deref(),
        Some("val a = 2")
    );

    fx.workspace.close_document(&main);
    assert!(!fx.workspace.is_open(&main));
    assert_eq!(
        fx.workspace.source_path().content(&main).as_deref(),
        Some("val a = 1")
    );
}

#[test]
fn files_outside_the_root_are_temporary_while_open() {
    let fx = Fixture::new(&[("Main.kt", "val a = 1")]);
    let scratch_dir = TempWorkspace::new(&[]);
    let scratch = VfsPath::local(scratch_dir.path("Scratch.kt"));

    fx.workspace.open_document(scratch.clone(), "val s = a", 1);
    assert_eq!(fx.workspace.source_path().is_temporary(&scratch), Some(true));

    let compiled = fx.workspace.current_version(&scratch).unwrap();
    assert_eq!(compiled.type_at_point(8.into()), Some(SketchType::Int));
    assert_eq!(fx.tracked().len(), 2);

    fx.workspace.close_document(&scratch);
    assert!(!fx.workspace.source_path().contains(&scratch));
}

#[test]
fn watcher_events_update_closed_files_only() {
    let fx = Fixture::new(&[("Main.kt", "val a = 1")]);
    let main = fx.file("Main.kt");
    let new = fx.file("New.kt");

    fx.dir.write("New.kt", "val n = 1");
    fx.workspace
        .did_change_watched_files(&[FileChange::new(new.clone(), FileChangeKind::Created)]);
    assert!(fx.workspace.source_path().contains(&new));

    fx.workspace.open_document(main.clone(), "val a = 3", 1);
    fx.dir.write("Main.kt", "val a = 4");
    fx.workspace
        .did_change_watched_files(&[FileChange::new(main.clone(), FileChangeKind::Modified)]);
    assert_eq!(fx.workspace.content(&main).as_deref(), Some("val a = 3"));

    fx.dir.remove("New.kt");
    fx.workspace
        .did_change_watched_files(&[FileChange::new(new.clone(), FileChangeKind::Deleted)]);
    assert!(!fx.workspace.source_path().contains(&new));
}

#[test]
fn config_changes_are_not_loaded_as_sources() {
    let fx = Fixture::new(&[("kls.toml", "[scripts]\nenabled = false\n"), ("A.kt", "val a = 1")]);
    let before = fx.tracked();

    fx.dir.write("kls.toml", "[scripts]\nenabled = true\n");
    fx.workspace.did_change_watched_files(&[FileChange::new(
        fx.file("kls.toml"),
        FileChangeKind::Modified,
    )]);

    assert_eq!(fx.tracked(), before);
    assert!(!fx.workspace.config().scripts.enabled);
}

#[test]
fn positions_map_to_offsets_in_the_live_text() {
    let fx = Fixture::new(&[("Main.kt", "fun f() {\n    1\n}")]);
    let main = fx.file("Main.kt");

    assert_eq!(fx.workspace.offset_at(&main, Position::new(1, 4)), Some(14.into()));
    assert_eq!(fx.workspace.offset_at(&main, Position::new(7, 0)), None);
    assert_eq!(fx.workspace.offset_at(&fx.file("Missing.kt"), Position::new(0, 0)), None);
}
