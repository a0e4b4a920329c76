//! Operation execution against the in-memory drive

use std::sync::Arc;
use std::time::Duration;

use driveops_core::config::ConfigBuilder;
use driveops_core::domain::{
    ContentKey, FileSource, FolderSpec, MediaOptions, Operation, RemoteId, ResourceMetadata,
    SourceFile, StoreRef,
};
use driveops_core::ports::{NoopObserver, SyncEvent};
use driveops_core::usecases::{
    ListingSettings, OperationError, OperationExecutor, OperationOutcome, ResolutionCache,
};
use serde_json::json;
use tokio::sync::Barrier;

use crate::common::{FakeContent, FakeDrive, Recorder};

const PERMISSION_MESSAGE: &str =
    "The user does not have sufficient permissions for this file.";

fn executor(drive: &Arc<FakeDrive>, content: FakeContent) -> OperationExecutor {
    OperationExecutor::new(
        drive.clone(),
        Arc::new(content),
        Arc::new(NoopObserver),
        ListingSettings::default(),
    )
}

fn file(key: &str, name: Option<&str>) -> SourceFile {
    SourceFile {
        key: ContentKey::new(key.to_string()).unwrap(),
        name: name.map(str::to_string),
        resource: ResourceMetadata::new(),
        media: MediaOptions::default(),
    }
}

fn copy(files: Vec<SourceFile>, destination: FolderSpec) -> Operation {
    Operation::CopyFiles {
        source: FileSource {
            store: StoreRef {
                id: "default".to_string(),
            },
            files,
        },
        destination,
    }
}

fn delete(target: FolderSpec) -> Operation {
    Operation::DeleteFolder { target }
}

fn store() -> FakeContent {
    FakeContent::new()
        .with_entry("default", "summary", "summary.json", r#"{"ok":true}"#)
        .with_entry("default", "log", "run.log", "line 1")
}

// ============================================================================
// Copy
// ============================================================================

#[tokio::test]
async fn test_copy_creates_destination_and_files() {
    let drive = FakeDrive::new();
    let op = copy(
        vec![file("summary", None), file("log", Some("latest.log"))],
        FolderSpec::under_root(Some("Exports/daily")).unwrap(),
    );

    let report = executor(&drive, store()).execute_all(&[op]).await.unwrap();

    let OperationOutcome::Copied {
        folder_id,
        created,
        updated,
    } = &report.operations[0].outcome
    else {
        panic!("unexpected outcome: {report:?}");
    };
    assert_eq!((*created, *updated), (2, 0));

    let summary = drive.children_named(folder_id, "summary.json");
    assert_eq!(summary.len(), 1);
    assert_eq!(drive.content(&summary[0].id).as_deref(), Some(r#"{"ok":true}"#));
    assert_eq!(drive.children_named(folder_id, "latest.log").len(), 1);
    assert!(drive.children_named(folder_id, "run.log").is_empty());
}

#[tokio::test]
async fn test_rerunning_copy_updates_in_place() {
    let drive = FakeDrive::new();
    let op = copy(
        vec![file("summary", None)],
        FolderSpec::under_root(Some("Exports")).unwrap(),
    );
    let executor = executor(&drive, store());

    executor.execute_all(&[op.clone()]).await.unwrap();
    let report = executor.execute_all(&[op]).await.unwrap();

    assert_eq!(report.files_created(), 0);
    assert_eq!(report.files_updated(), 1);
    let exports = drive.children_named(&RemoteId::root(), "Exports");
    assert_eq!(exports.len(), 1);
    assert_eq!(drive.children_named(&exports[0].id, "summary.json").len(), 1);
}

#[tokio::test]
async fn test_resource_name_wins_over_entry_name() {
    let drive = FakeDrive::new();
    let mut entry = file("summary", Some("entry.json"));
    entry.resource = serde_json::from_value(json!({"name": "resource.json"})).unwrap();
    let op = copy(vec![entry], FolderSpec::under_root(Some("Out")).unwrap());

    executor(&drive, store()).execute_all(&[op]).await.unwrap();

    let out = drive.children_named(&RemoteId::root(), "Out");
    assert_eq!(drive.children_named(&out[0].id, "resource.json").len(), 1);
    assert!(drive.children_named(&out[0].id, "entry.json").is_empty());
}

#[tokio::test]
async fn test_copy_uploads_are_all_in_flight_together() {
    const FILES: usize = 4;
    let drive = FakeDrive::new();
    drive.gate_uploads(Arc::new(Barrier::new(FILES)));

    let mut content = FakeContent::new();
    let mut files = Vec::new();
    for i in 0..FILES {
        let key = format!("k{i}");
        content = content.with_entry("default", &key, &format!("f{i}.txt"), "body");
        files.push(file(&key, None));
    }
    let op = copy(files, FolderSpec::under_root(Some("Parallel")).unwrap());

    let run = executor(&drive, content);
    let report = tokio::time::timeout(Duration::from_secs(5), run.execute_all(&[op]))
        .await
        .expect("uploads were serialized instead of running concurrently")
        .unwrap();

    assert_eq!(report.files_created(), FILES);
}

#[tokio::test]
async fn test_missing_content_rejects_copy() {
    let drive = FakeDrive::new();
    let op = copy(
        vec![file("summary", None), file("absent", None)],
        FolderSpec::under_root(Some("Out")).unwrap(),
    );

    let err = executor(&drive, store()).execute_all(&[op]).await.unwrap_err();

    match err {
        OperationError::Content { key, .. } => assert_eq!(key.as_str(), "absent"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_store_is_reported() {
    let drive = FakeDrive::new();
    let op = Operation::CopyFiles {
        source: FileSource {
            store: StoreRef {
                id: "nowhere".to_string(),
            },
            files: vec![file("summary", None)],
        },
        destination: FolderSpec::under_root(Some("Out")).unwrap(),
    };

    let err = executor(&drive, store()).execute_all(&[op]).await.unwrap_err();

    assert!(matches!(err, OperationError::Store { ref store, .. } if store == "nowhere"));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_of_unresolved_folder_is_a_noop() {
    let drive = FakeDrive::new();
    let op = delete(FolderSpec::under_root(Some("Never/Created")).unwrap());

    let report = executor(&drive, store()).execute_all(&[op]).await.unwrap();

    assert_eq!(
        report.operations[0].outcome,
        OperationOutcome::NotResolved {
            segment: "Never".to_string()
        }
    );
    assert!(drive.deletes().is_empty());
}

#[tokio::test]
async fn test_delete_removes_resolved_folder() {
    let drive = FakeDrive::new();
    let old = drive.seed_folder("Old", None);
    drive.seed_file("stale.txt", old.as_str(), "x");
    let op = delete(FolderSpec::under_root(Some("Old")).unwrap());

    let report = executor(&drive, store()).execute_all(&[op]).await.unwrap();

    assert_eq!(
        report.operations[0].outcome,
        OperationOutcome::Deleted {
            folder_id: old.clone()
        }
    );
    assert_eq!(drive.deletes(), vec![old.to_string()]);
    assert!(drive.item(&old).is_none());
}

#[tokio::test]
async fn test_delete_of_already_gone_folder_is_benign() {
    let drive = FakeDrive::new();
    let gone = drive.seed_folder("Gone", None);
    drive.fail_delete(gone.as_str(), 404, &format!("File not found: {gone}."));
    let recorder = Recorder::new();
    let executor = OperationExecutor::new(
        drive.clone(),
        Arc::new(store()),
        recorder.clone(),
        ListingSettings::default(),
    );

    let report = executor
        .execute_all(&[delete(FolderSpec::under_root(Some("Gone")).unwrap())])
        .await
        .unwrap();

    assert_eq!(
        report.operations[0].outcome,
        OperationOutcome::AlreadyAbsent {
            folder_id: gone.clone()
        }
    );
    assert!(recorder
        .events()
        .contains(&SyncEvent::FolderAlreadyAbsent { folder_id: gone }));
}

#[tokio::test]
async fn test_permission_denied_names_the_folder() {
    let drive = FakeDrive::new();
    let locked = drive.seed_folder("Locked", None);
    drive.fail_delete(locked.as_str(), 403, PERMISSION_MESSAGE);

    let err = executor(&drive, store())
        .execute_all(&[delete(FolderSpec::under_root(Some("Locked")).unwrap())])
        .await
        .unwrap_err();

    assert!(matches!(err, OperationError::PermissionDenied { ref folder_id, .. } if folder_id == &locked));
    assert!(err.to_string().contains(locked.as_str()));
}

#[tokio::test]
async fn test_other_delete_errors_propagate_unchanged() {
    let drive = FakeDrive::new();
    let busy = drive.seed_folder("Busy", None);
    drive.fail_delete(busy.as_str(), 500, "Backend Error");

    let err = executor(&drive, store())
        .execute_all(&[delete(FolderSpec::under_root(Some("Busy")).unwrap())])
        .await
        .unwrap_err();

    let remote = err.as_remote().expect("a remote error");
    assert_eq!(remote.status(), Some(500));
    assert_eq!(remote.message(), "Backend Error");
}

#[tokio::test]
async fn test_storage_root_is_never_deleted() {
    let drive = FakeDrive::new();

    let err = executor(&drive, store())
        .execute_all(&[delete(FolderSpec::under_root(None).unwrap())])
        .await
        .unwrap_err();

    assert!(matches!(err, OperationError::RootDeletion));
    assert!(drive.calls().is_empty());
}

#[tokio::test]
async fn test_delete_invalidates_cached_resolution() {
    let drive = FakeDrive::new();
    let spec = FolderSpec::under_root(Some("Scratch")).unwrap();
    let cache = Arc::new(ResolutionCache::new());
    let executor = executor(&drive, store()).with_cache(cache.clone());

    executor
        .execute_all(&[
            copy(vec![file("log", None)], spec.clone()),
            delete(spec.clone()),
            copy(vec![file("log", None)], spec.clone()),
        ])
        .await
        .unwrap();

    let scratch = drive.children_named(&RemoteId::root(), "Scratch");
    assert_eq!(scratch.len(), 1);
    assert_eq!(drive.children_named(&scratch[0].id, "run.log").len(), 1);
    assert_eq!(cache.get("root/Scratch"), Some(scratch[0].id.clone()));
}

// ============================================================================
// Sequencing
// ============================================================================

#[tokio::test]
async fn test_first_failure_stops_the_run() {
    let drive = FakeDrive::new();
    let locked = drive.seed_folder("Locked", None);
    drive.fail_delete(locked.as_str(), 403, PERMISSION_MESSAGE);

    let err = executor(&drive, store())
        .execute_all(&[
            copy(vec![file("summary", None)], FolderSpec::under_root(Some("First")).unwrap()),
            delete(FolderSpec::under_root(Some("Locked")).unwrap()),
            copy(vec![file("summary", None)], FolderSpec::under_root(Some("Third")).unwrap()),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, OperationError::PermissionDenied { .. }));
    assert_eq!(drive.children_named(&RemoteId::root(), "First").len(), 1);
    assert!(drive.children_named(&RemoteId::root(), "Third").is_empty());
}

#[tokio::test]
async fn test_operations_from_config_run_in_order() {
    let drive = FakeDrive::new();
    drive.seed_folder("2023", Some(drive.seed_folder("Reports", None).as_str()));
    let recorder = Recorder::new();

    let config = ConfigBuilder::new()
        .constant(
            "reports",
            json!({"parentFolderName": "Reports", "relativePath": "2024"}),
        )
        .operation(json!({
            "type": "files-copy",
            "source": {
                "type": "key-value-store",
                "id": "default",
                "files": [{"key": "summary", "options": {"media": {"mimeType": "application/json"}}}]
            },
            "destination": "constants.reports"
        }))
        .operation(json!({
            "type": "folders-delete",
            "folder": {"parentFolderName": "Reports", "relativePath": "2023"}
        }))
        .build();
    let operations = config.operations().unwrap();

    let executor = OperationExecutor::new(
        drive.clone(),
        Arc::new(store()),
        recorder.clone(),
        config.listing_settings(),
    );
    let report = executor.execute_all(&operations).await.unwrap();

    assert_eq!(report.operations.len(), 2);
    assert!(matches!(report.operations[0].outcome, OperationOutcome::Copied { .. }));
    assert!(matches!(report.operations[1].outcome, OperationOutcome::Deleted { .. }));

    let starts: Vec<usize> = recorder
        .events()
        .iter()
        .filter_map(|e| match e {
            SyncEvent::OperationStarted { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(starts, vec![0, 1]);

    let reports = drive.children_named(&RemoteId::root(), "Reports");
    assert!(drive.children_named(&reports[0].id, "2023").is_empty());
    let year = drive.children_named(&reports[0].id, "2024");
    let copied = drive.children_named(&year[0].id, "summary.json");
    assert_eq!(copied[0].mime_type.as_deref(), Some("application/json"));
}
