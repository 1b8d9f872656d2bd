//! The full service against a real watched directory.

use std::path::Path;
use std::time::Duration;

use pdfcollate::service;
use tokio::sync::oneshot;

use crate::common::{Workspace, page_markers, write_marked_pdf};

async fn wait_for_file(path: &Path) {
    for _ in 0..500 {
        if path.exists() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{} was never written", path.display());
}

/// Write the fixture elsewhere and copy it in so the watcher sees a single
/// create/close pair.
fn drop_scan(ws: &Workspace, staging: &Path, name: &str, markers: &[&str]) {
    let staged = staging.join(name);
    write_marked_pdf(&staged, markers);
    std::fs::copy(&staged, ws.source.join(name)).unwrap();
}

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_service_collates_dropped_scans() {
    let ws = Workspace::new();
    let staging = tempfile::TempDir::new().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let service = tokio::spawn(service::run(ws.config(), async move {
        let _ = stop_rx.await;
    }));

    // Give the watcher time to register.
    let output = ws.output("front-collated.pdf");
    wait_for_file(&ws.destination).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    drop_scan(&ws, staging.path(), "front.pdf", &["1", "3"]);
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop_scan(&ws, staging.path(), "back.pdf", &["4", "2"]);

    wait_for_file(&output).await;
    stop_tx.send(()).unwrap();
    service.await.unwrap().unwrap();

    assert_eq!(page_markers(&output), vec!["1", "2", "3", "4"]);
    assert!(!ws.source.join("front.pdf").exists());
    assert!(!ws.source.join("back.pdf").exists());
}

#[tokio::test]
async fn test_service_stops_on_shutdown() {
    let ws = Workspace::new();

    tokio::time::timeout(
        Duration::from_secs(5),
        service::run(ws.config(), std::future::ready(())),
    )
    .await
    .expect("service did not stop")
    .unwrap();

    assert!(ws.destination.is_dir());
}
