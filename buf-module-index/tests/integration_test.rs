//! Integration tests for buf-module-index

use std::path::PathBuf;

use buf_module_index::config::ScanConfig;
use buf_module_index::coordinates::ModuleCoordinates;
use buf_module_index::document::FileContent;
use buf_module_index::host::{IndexUpdate, MemoryIndexHost, ProjectScope};
use buf_module_index::index::{BufModuleIndex, FileIndexExtension, all_project_modules};
use buf_module_index::scan::scan_workspace;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/buf-workspace")
}

async fn index_workspace(
    root: &std::path::Path,
    project: &ProjectScope,
) -> MemoryIndexHost<BufModuleIndex> {
    let host = MemoryIndexHost::new(BufModuleIndex::new());
    for file in scan_workspace(root, &ScanConfig::default()).await.unwrap() {
        host.update_file(project, &file);
    }
    host
}

/// Index the fixture workspace end to end
#[tokio::test]
async fn test_index_fixture_workspace() {
    let project = ProjectScope::new("buf-workspace", fixture_root());
    let host = index_workspace(&fixture_root(), &project).await;

    let modules = all_project_modules(&host, &project).unwrap();

    // payments pins two modules, users one complete entry plus an incomplete one
    assert_eq!(modules.len(), 3);

    let googleapis: Vec<&ModuleCoordinates> = modules
        .iter()
        .filter(|m| m.module_name() == "buf.build/googleapis/googleapis")
        .collect();
    assert_eq!(googleapis.len(), 2, "same module from two lock files stays distinct");
    assert_ne!(
        googleapis[0].lock_file_location,
        googleapis[1].lock_file_location
    );

    let protovalidate = modules
        .iter()
        .find(|m| m.repository == "protovalidate")
        .unwrap();
    assert_eq!(protovalidate.commit, "46a4cf4ba1094a34bcd89a6c67163b4b");
    assert!(
        protovalidate
            .lock_file_location
            .ends_with("proto/payments/buf.lock")
    );

    let stats = host.stats();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.keys, 3);
}

/// Editing, renaming and deleting lock files keeps the index in sync
#[tokio::test]
async fn test_reindex_after_changes() {
    let dir = tempfile::tempdir().unwrap();
    let lock = dir.path().join("buf.lock");
    std::fs::write(
        &lock,
        "version: v1\ndeps:\n  - {remote: buf.build, owner: acme, repository: pet, commit: v1}\n",
    )
    .unwrap();

    let project = ProjectScope::new("tmp", dir.path());
    let host = index_workspace(dir.path(), &project).await;
    let modules = all_project_modules(&host, &project).unwrap();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].commit, "v1");
    let location = modules[0].lock_file_location.clone();

    // `buf dep update` bumps the commit
    let updated = FileContent::from_text(
        Some(location.clone()),
        "buf.lock",
        "version: v1\ndeps:\n  - {remote: buf.build, owner: acme, repository: pet, commit: v2}\n",
    );
    assert_eq!(host.update_file(&project, &updated), 1);
    let modules = all_project_modules(&host, &project).unwrap();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].commit, "v2");

    // The file is deleted
    assert!(host.remove_file(&project, &location));
    assert!(all_project_modules(&host, &project).unwrap().is_empty());
}

/// Entries survive a snapshot only while the index version is unchanged
#[tokio::test]
async fn test_snapshot_survives_restart() {
    let project = ProjectScope::new("buf-workspace", fixture_root());
    let host = index_workspace(&fixture_root(), &project).await;
    let before = all_project_modules(&host, &project).unwrap();

    let restored = MemoryIndexHost::restore(BufModuleIndex::new(), host.snapshot());
    assert_eq!(all_project_modules(&restored, &project).unwrap(), before);
    assert_eq!(restored.extension().version(), host.extension().version());
}

/// A lock file whose deps are all malformed contributes nothing
#[test]
fn test_malformed_lock_file() {
    let content = r#"
version: v1
deps:
  - remote: buf.build
  - owner: acme
    repository: pet
  - "buf.build/acme/pet"
"#;
    let file = FileContent::from_text(
        Some("file:///p/buf.lock".to_string()),
        "buf.lock",
        content,
    );
    assert!(BufModuleIndex::new().index(&file).is_empty());
}
