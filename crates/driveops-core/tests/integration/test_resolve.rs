//! Folder resolution against the in-memory drive

use std::sync::Arc;

use driveops_core::domain::{FolderSpec, RemoteId};
use driveops_core::ports::{NoopObserver, SyncEvent};
use driveops_core::usecases::{
    AmbiguityPolicy, FolderResolver, ListingSettings, OperationError, Resolution,
    ResolutionCache, ResolveMode,
};

use crate::common::{id, Call, FakeDrive, Recorder};

fn resolver(drive: &Arc<FakeDrive>) -> FolderResolver {
    FolderResolver::new(drive.clone(), Arc::new(NoopObserver), ListingSettings::default())
}

#[tokio::test]
async fn test_resolves_nested_path_under_root() {
    let drive = FakeDrive::new();
    let a = drive.seed_folder("A", None);
    let b = drive.seed_folder("B", Some(a.as_str()));
    let spec = FolderSpec::under_root(Some("A/B")).unwrap();

    let resolution = resolver(&drive)
        .resolve(&spec, ResolveMode::ReadOnly)
        .await
        .unwrap();

    assert_eq!(resolution.id(), Some(&b));
    assert!(drive.creates().is_empty());
}

#[tokio::test]
async fn test_missing_leaf_is_not_found() {
    let drive = FakeDrive::new();
    let a = drive.seed_folder("A", None);
    let b = drive.seed_folder("B", Some(a.as_str()));
    drive.remove(&b);
    let spec = FolderSpec::under_root(Some("A/B")).unwrap();

    let resolution = resolver(&drive)
        .resolve(&spec, ResolveMode::ReadOnly)
        .await
        .unwrap();

    assert_eq!(
        resolution,
        Resolution::NotFound {
            segment: "B".to_string()
        }
    );
}

#[tokio::test]
async fn test_write_mode_creates_missing_path_in_order() {
    let drive = FakeDrive::new();
    let spec = FolderSpec::under_root(Some("A/B")).unwrap();

    let resolved = resolver(&drive).ensure(&spec).await.unwrap();

    let creates = drive.creates();
    assert_eq!(creates.len(), 2);
    assert_eq!(creates[0], ("A".to_string(), vec!["root".to_string()]));
    assert_eq!(creates[1].0, "B");

    let a = drive.children_named(&RemoteId::root(), "A");
    assert_eq!(a.len(), 1);
    assert_eq!(creates[1].1, vec![a[0].id.to_string()]);

    let b = drive.children_named(&a[0].id, "B");
    assert_eq!(b.len(), 1);
    assert_eq!(resolved.id, b[0].id);
    assert!(b[0].is_folder());
}

#[tokio::test]
async fn test_read_mode_short_circuits_on_first_miss() {
    let drive = FakeDrive::new();
    let spec = FolderSpec::under_root(Some("A/B/C")).unwrap();

    let resolution = resolver(&drive)
        .resolve(&spec, ResolveMode::ReadOnly)
        .await
        .unwrap();

    assert_eq!(
        resolution,
        Resolution::NotFound {
            segment: "A".to_string()
        }
    );
    assert_eq!(drive.list_calls(), 1);
}

#[tokio::test]
async fn test_named_anchor_searches_top_level() {
    let drive = FakeDrive::new();
    let reports = drive.seed_folder("Reports", None);
    let nested = drive.seed_folder("Reports", Some(reports.as_str()));
    let spec = FolderSpec::named("Reports", None).unwrap();

    let resolution = resolver(&drive)
        .resolve(&spec, ResolveMode::ReadOnly)
        .await
        .unwrap();

    assert_eq!(resolution.id(), Some(&reports));
    assert_ne!(resolution.id(), Some(&nested));

    let calls = drive.calls();
    let Call::List { query, .. } = &calls[0] else {
        panic!("expected a list call, got {calls:?}");
    };
    assert!(query.contains("'root' in parents"));
    assert!(query.contains("trashed=false"));
    assert!(query.contains("name = 'Reports'"));
}

#[tokio::test]
async fn test_named_anchor_is_created_without_parents() {
    let drive = FakeDrive::new();
    let spec = FolderSpec::named("Exports", Some("daily")).unwrap();

    resolver(&drive).ensure(&spec).await.unwrap();

    let creates = drive.creates();
    assert_eq!(creates[0], ("Exports".to_string(), Vec::<String>::new()));
    assert_eq!(creates[1].0, "daily");
}

#[tokio::test]
async fn test_explicit_id_anchor_is_not_looked_up() {
    let drive = FakeDrive::new();
    let anchor = drive.seed_folder("Shared", None);
    let child = drive.seed_folder("out", Some(anchor.as_str()));
    let spec = FolderSpec::with_id(anchor.clone(), Some("out")).unwrap();

    let resolution = resolver(&drive)
        .resolve(&spec, ResolveMode::ReadOnly)
        .await
        .unwrap();

    assert_eq!(resolution.id(), Some(&child));
    assert_eq!(drive.list_calls(), 1);
}

#[tokio::test]
async fn test_single_level_specs() {
    let drive = FakeDrive::new();
    let anchor = id("fld-explicit");

    let spec = FolderSpec::with_id(anchor.clone(), None).unwrap();
    let resolution = resolver(&drive)
        .resolve(&spec, ResolveMode::ReadOnly)
        .await
        .unwrap();
    assert_eq!(resolution.id(), Some(&anchor));

    let spec = FolderSpec::under_root(None).unwrap();
    let resolution = resolver(&drive)
        .resolve(&spec, ResolveMode::ReadOnly)
        .await
        .unwrap();
    assert_eq!(resolution.id(), Some(&RemoteId::root()));
    assert_eq!(drive.list_calls(), 0);
}

#[tokio::test]
async fn test_segments_only_match_under_their_parent() {
    let drive = FakeDrive::new();
    let a = drive.seed_folder("A", None);
    let other = drive.seed_folder("Other", None);
    drive.seed_folder("B", Some(other.as_str()));
    let spec = FolderSpec::under_root(Some("A/B")).unwrap();

    let resolution = resolver(&drive)
        .resolve(&spec, ResolveMode::ReadOnly)
        .await
        .unwrap();

    assert!(resolution.id().is_none());
    assert!(drive.children_named(&a, "B").is_empty());
}

#[tokio::test]
async fn test_first_match_wins_on_duplicates() {
    let drive = FakeDrive::new();
    let first = drive.seed_folder("Dup", None);
    drive.seed_folder("Dup", None);
    let spec = FolderSpec::under_root(Some("Dup")).unwrap();

    let resolution = resolver(&drive)
        .resolve(&spec, ResolveMode::ReadOnly)
        .await
        .unwrap();

    assert_eq!(resolution.id(), Some(&first));
}

#[tokio::test]
async fn test_error_on_ambiguous_policy() {
    let drive = FakeDrive::new();
    drive.seed_folder("Dup", None);
    drive.seed_folder("Dup", None);
    let spec = FolderSpec::under_root(Some("Dup")).unwrap();

    let err = resolver(&drive)
        .with_policy(AmbiguityPolicy::ErrorOnAmbiguous)
        .resolve(&spec, ResolveMode::ReadOnly)
        .await
        .unwrap_err();

    match err {
        OperationError::AmbiguousFolder { name, count, .. } => {
            assert_eq!(name, "Dup");
            assert_eq!(count, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_by_explicit_id_policy_refuses_named_anchor() {
    let drive = FakeDrive::new();
    drive.seed_folder("Reports", None);
    let spec = FolderSpec::named("Reports", None).unwrap();

    let err = resolver(&drive)
        .with_policy(AmbiguityPolicy::ByExplicitId)
        .resolve(&spec, ResolveMode::ReadOnly)
        .await
        .unwrap_err();

    assert!(matches!(err, OperationError::ExplicitIdRequired { .. }));
    assert_eq!(drive.list_calls(), 0);
}

#[tokio::test]
async fn test_cache_skips_repeat_lookups() {
    let drive = FakeDrive::new();
    let a = drive.seed_folder("A", None);
    drive.seed_folder("B", Some(a.as_str()));
    let cache = Arc::new(ResolutionCache::new());
    let resolver = resolver(&drive).with_cache(cache.clone());
    let spec = FolderSpec::under_root(Some("A/B")).unwrap();

    let first = resolver.find(&spec).await.unwrap().unwrap();
    let lookups = drive.list_calls();
    let second = resolver.find(&spec).await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(drive.list_calls(), lookups);
    assert_eq!(cache.get("root/A"), Some(a));
}

#[tokio::test]
async fn test_cache_keeps_slash_in_anchor_name_apart_from_nested_path() {
    let drive = FakeDrive::new();
    let a = drive.seed_folder("a", None);
    drive.seed_folder("b", Some(a.as_str()));
    let cache = Arc::new(ResolutionCache::new());
    let resolver = resolver(&drive).with_cache(cache.clone());

    let nested = FolderSpec::named("a", Some("b")).unwrap();
    assert!(resolver.find(&nested).await.unwrap().is_some());

    let slashed = FolderSpec::named("a/b", None).unwrap();
    assert!(resolver.find(&slashed).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cache_never_records_misses() {
    let drive = FakeDrive::new();
    let cache = Arc::new(ResolutionCache::new());
    let resolver = resolver(&drive).with_cache(cache.clone());
    let spec = FolderSpec::under_root(Some("Later")).unwrap();

    assert!(resolver.find(&spec).await.unwrap().is_none());
    assert!(cache.is_empty());

    let created = drive.seed_folder("Later", None);
    let found = resolver.find(&spec).await.unwrap().unwrap();
    assert_eq!(found.id, created);
}

#[tokio::test]
async fn test_resolution_events() {
    let drive = FakeDrive::new();
    let recorder = Recorder::new();
    let resolver =
        FolderResolver::new(drive.clone(), recorder.clone(), ListingSettings::default());
    let spec = FolderSpec::under_root(Some("New")).unwrap();

    resolver.ensure(&spec).await.unwrap();

    let events = recorder.events();
    assert!(events.iter().any(|e| matches!(
        e,
        SyncEvent::FolderCreated { name, parent: Some(p), .. } if name == "New" && p.is_root()
    )));
    assert!(matches!(
        events.last(),
        Some(SyncEvent::FolderResolved { spec, .. }) if spec == "{root}/New"
    ));
    assert!(events
        .iter()
        .any(|e| matches!(e, SyncEvent::PageFetched { page: 1, .. })));
}
