//! Integration tests for the watcher registry
//!
//! These tests use temporary directories and real filesystem operations
//! to validate the events a host would receive.

use fswatch_core::config::WatcherConfig;
use fswatch_watcher::{ChangeKind, WatchEvent, WatchOptions, WatcherId, WatcherService};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::time::{timeout, Instant};

/// Helper to create a test file
async fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    tokio::fs::write(&path, content).await.unwrap();
    path
}

/// Start a watcher and return its id plus the receiving end of its sink
fn start_watch(
    service: &mut WatcherService,
    path: &Path,
    options: WatchOptions,
) -> (WatcherId, UnboundedReceiver<WatchEvent>) {
    let (tx, rx) = unbounded_channel();
    let id = service.create(path, &options, Arc::new(tx)).unwrap();
    (id, rx)
}

/// Wait for the first event of `kind`, skipping others
async fn wait_for_kind(
    events: &mut UnboundedReceiver<WatchEvent>,
    kind: ChangeKind,
) -> Option<WatchEvent> {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match timeout(remaining, events.recv()).await {
            Ok(Some(event)) if event.kind() == Some(kind) => return Some(event),
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => return None,
        }
    }
}

/// Collect everything a watcher emits within `window`
#[cfg(target_os = "linux")]
async fn collect_for(
    events: &mut UnboundedReceiver<WatchEvent>,
    window: Duration,
) -> Vec<WatchEvent> {
    let deadline = Instant::now() + window;
    let mut collected = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match timeout(remaining, events.recv()).await {
            Ok(Some(event)) => collected.push(event),
            Ok(None) | Err(_) => return collected,
        }
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_write_to_watched_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(temp_dir.path(), "a.txt", "a").await;

    let mut service = WatcherService::new(WatcherConfig::default());
    let (id, mut events) = start_watch(&mut service, &file, WatchOptions::default());
    assert_eq!(id, WatcherId::new(1));
    settle().await;

    let mut handle = std::fs::OpenOptions::new()
        .append(true)
        .open(&file)
        .unwrap();
    handle.write_all(b"more bytes").unwrap();
    drop(handle);

    let event = wait_for_kind(&mut events, ChangeKind::Write)
        .await
        .expect("Expected a write event");
    assert_eq!(event, WatchEvent::Write { path: file });
}

#[tokio::test]
async fn test_file_creation_reports_watched_directory() {
    let temp_dir = TempDir::new().unwrap();

    let mut service = WatcherService::new(WatcherConfig::default());
    let (_id, mut events) = start_watch(&mut service, temp_dir.path(), WatchOptions::default());
    settle().await;

    create_test_file(temp_dir.path(), "new.txt", "content").await;

    let event = wait_for_kind(&mut events, ChangeKind::Create)
        .await
        .expect("Expected a create event");
    assert_eq!(event.path(), temp_dir.path());
}

#[tokio::test]
async fn test_recursive_remove_reports_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    tokio::fs::create_dir(root.join("subdir")).await.unwrap();
    let file1 = create_test_file(root, "file1", "1").await;
    create_test_file(root, "file2", "2").await;

    let mut service = WatcherService::new(WatcherConfig::default());
    let (_id, mut events) =
        start_watch(&mut service, root, WatchOptions::new().with_recursive(true));
    settle().await;

    tokio::fs::remove_file(&file1).await.unwrap();

    let event = wait_for_kind(&mut events, ChangeKind::Remove)
        .await
        .expect("Expected a remove event");
    assert_eq!(
        event,
        WatchEvent::Remove {
            path: root.to_path_buf()
        }
    );
}

#[tokio::test]
async fn test_recursive_watch_sees_nested_directory() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("src").join("modules");
    tokio::fs::create_dir_all(&nested).await.unwrap();

    let mut service = WatcherService::new(WatcherConfig::default());
    let (_id, mut events) = start_watch(
        &mut service,
        temp_dir.path(),
        WatchOptions::new().with_recursive(true),
    );
    settle().await;

    create_test_file(&nested, "module.rs", "pub fn test() {}").await;

    let event = wait_for_kind(&mut events, ChangeKind::Create)
        .await
        .expect("Expected a create event from the nested directory");
    assert_eq!(event.path(), temp_dir.path());
}

#[tokio::test]
async fn test_non_recursive_watch_ignores_nested_directory() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("nested");
    tokio::fs::create_dir(&nested).await.unwrap();

    let mut service = WatcherService::new(WatcherConfig::default());
    let (_id, mut events) = start_watch(&mut service, temp_dir.path(), WatchOptions::default());
    settle().await;

    create_test_file(&nested, "deep.txt", "x").await;

    assert!(
        wait_for_kind(&mut events, ChangeKind::Create).await.is_none(),
        "Nested directory should not be watched without recursive"
    );
}

#[tokio::test]
async fn test_rename_carries_dest() {
    let temp_dir = TempDir::new().unwrap();
    let old = create_test_file(temp_dir.path(), "old.txt", "x").await;

    let mut service = WatcherService::new(WatcherConfig::default());
    let (_id, mut events) = start_watch(&mut service, temp_dir.path(), WatchOptions::default());
    settle().await;

    tokio::fs::rename(&old, temp_dir.path().join("new.txt"))
        .await
        .unwrap();

    match wait_for_kind(&mut events, ChangeKind::Rename).await {
        Some(WatchEvent::Rename { path, dest }) => {
            assert_eq!(path, temp_dir.path());
            let dest = dest.expect("Rename should carry a destination");
            assert!(!dest.as_os_str().is_empty());
        }
        other => panic!("Expected Rename event, got {other:?}"),
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_single_rename_reported_once() {
    let temp_dir = TempDir::new().unwrap();
    let old = create_test_file(temp_dir.path(), "old.txt", "x").await;

    let mut service = WatcherService::new(WatcherConfig::default());
    let (_id, mut events) = start_watch(&mut service, temp_dir.path(), WatchOptions::default());
    settle().await;

    std::fs::rename(&old, temp_dir.path().join("new.txt")).unwrap();

    let collected = collect_for(&mut events, Duration::from_secs(1)).await;
    let renames = collected
        .iter()
        .filter(|e| e.kind() == Some(ChangeKind::Rename))
        .count();
    assert_eq!(renames, 1, "{collected:?}");
    assert!(
        collected.iter().any(|e| e.kind() == Some(ChangeKind::Create)),
        "{collected:?}"
    );
}

#[tokio::test]
async fn test_no_events_after_cancel() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(temp_dir.path(), "a.txt", "a").await;

    let mut service = WatcherService::new(WatcherConfig::default());
    let (id, mut events) = start_watch(&mut service, &file, WatchOptions::default());
    settle().await;

    assert!(service.cancel(id));
    assert!(!service.cancel(id));

    tokio::fs::write(&file, "changed after cancel").await.unwrap();

    match timeout(Duration::from_millis(500), events.recv()).await {
        Err(_) | Ok(None) => {}
        Ok(Some(event)) => panic!("Received event after cancel: {event:?}"),
    }
}

#[tokio::test]
async fn test_watchers_are_independent() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();

    let mut service = WatcherService::new(WatcherConfig::default());
    let (first, mut first_events) =
        start_watch(&mut service, first_dir.path(), WatchOptions::default());
    let (_second, mut second_events) =
        start_watch(&mut service, second_dir.path(), WatchOptions::default());
    settle().await;

    service.cancel(first);
    create_test_file(second_dir.path(), "still.txt", "watched").await;

    let event = wait_for_kind(&mut second_events, ChangeKind::Create)
        .await
        .expect("Second watcher should keep running");
    assert_eq!(event.path(), second_dir.path());
    assert!(wait_for_kind(&mut first_events, ChangeKind::Create)
        .await
        .is_none());
}
