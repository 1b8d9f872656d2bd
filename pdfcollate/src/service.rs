//! The long-running collation service.
//!
//! [`run`] wires the watcher to a [`Collator`] and keeps going until the
//! shutdown future resolves. [`dispatch`] is the event loop on its own so it
//! can be driven by any event source.

use std::fs;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task;
use tracing::{debug, error, info};

use crate::collate::{Collator, PairingStateMachine};
use crate::config::Config;
use crate::error::{CollateError, Result};
use crate::io::{PageCounter, PdfReader};
use crate::merge::{InterleavingMerger, Merger};
use crate::watch::{DirectoryWatcher, FileEvent, FileEventKind};

/// Watch `config.source_dir` and collate pairs until `shutdown` resolves.
///
/// # Errors
///
/// Fails before any event is handled if the configuration is invalid, the
/// destination directory cannot be created, or the watch cannot be set up.
/// Errors while handling individual files are logged and never end the
/// service.
pub async fn run<F>(config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    config.validate()?;

    fs::create_dir_all(&config.destination_dir).map_err(|e| CollateError::FailedToCreateOutput {
        path: config.destination_dir.clone(),
        source: e,
    })?;

    info!(
        source = %config.source_dir.display(),
        destination = %config.destination_dir.display(),
        timeout = %humantime::format_duration(config.collate_timeout),
        suffix = %config.output_name_suffix,
        delete_old_files = config.delete_old_files,
        "Starting {} {}",
        crate::NAME,
        crate::VERSION
    );

    let machine = PairingStateMachine::new(config.clone(), PdfReader::new(), InterleavingMerger::new());
    let collator = Arc::new(Collator::new(machine));

    let (tx, rx) = mpsc::unbounded_channel();
    let watcher = DirectoryWatcher::start(&config.source_dir, tx)?;

    dispatch(collator, rx, shutdown).await;

    drop(watcher);
    info!("Stopped");
    Ok(())
}

/// Feed `events` into `collator` until `shutdown` resolves or the stream ends.
///
/// Creations are queued onto a single worker that applies them in arrival
/// order and may block while the session is busy. Completions are applied
/// right away so they can free the session for a blocked creation.
pub async fn dispatch<C, M, F>(
    collator: Arc<Collator<C, M>>,
    mut events: UnboundedReceiver<FileEvent>,
    shutdown: F,
) where
    C: PageCounter + Send + 'static,
    M: Merger + Send + 'static,
    F: Future<Output = ()>,
{
    let (creation_tx, mut creation_rx) = mpsc::unbounded_channel::<FileEvent>();

    let creation_lane = {
        let collator = Arc::clone(&collator);
        tokio::spawn(async move {
            while let Some(event) = creation_rx.recv().await {
                let collator = Arc::clone(&collator);
                let handled = task::spawn_blocking(move || {
                    collator.on_file_created(&event.path, event.observed_at)
                })
                .await;
                if let Err(e) = handled {
                    error!(error = %e, "Creation handler failed");
                }
            }
        })
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    debug!("Event stream ended");
                    break;
                };

                match event.kind {
                    FileEventKind::Created => {
                        collator.announce_creation(&event.path);
                        if creation_tx.send(event).is_err() {
                            error!("Creation worker stopped unexpectedly");
                            break;
                        }
                    }
                    FileEventKind::Completed => {
                        let collator = Arc::clone(&collator);
                        let handled = task::spawn_blocking(move || {
                            collator.on_file_completed(&event.path, event.observed_at)
                        })
                        .await;
                        if let Err(e) = handled {
                            error!(error = %e, "Completion handler failed");
                        }
                    }
                }
            }
        }
    }

    collator.close();
    drop(creation_tx);
    if let Err(e) = creation_lane.await {
        error!(error = %e, "Creation worker failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collate::State;
    use crate::merge::MergeReport;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    struct FixedPages;

    impl PageCounter for FixedPages {
        fn count_pages(&self, _path: &Path) -> Result<usize> {
            Ok(4)
        }
    }

    #[derive(Clone, Default)]
    struct RecordingMerger(Arc<Mutex<Vec<PathBuf>>>);

    impl Merger for RecordingMerger {
        fn merge(&self, first: &Path, _second: &Path, destination: &Path) -> Result<MergeReport> {
            self.0.lock().unwrap().push(first.to_path_buf());
            Ok(MergeReport {
                output_path: destination.to_path_buf(),
                total_pages: 8,
                file_size: 0,
                merge_time: Duration::ZERO,
            })
        }
    }

    type TestCollator = Arc<Collator<FixedPages, RecordingMerger>>;

    fn collator() -> (TestCollator, RecordingMerger) {
        let merger = RecordingMerger::default();
        let config = Config {
            delete_old_files: false,
            ..Config::default()
        };
        let machine = PairingStateMachine::new(config, FixedPages, merger.clone());
        (Arc::new(Collator::new(machine)), merger)
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_dispatch_merges_in_order() {
        let (collator, merger) = collator();
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(dispatch(Arc::clone(&collator), rx, async move {
            let _ = stop_rx.await;
        }));

        for event in [
            FileEvent::created("/files/a.pdf"),
            FileEvent::completed("/files/a.pdf"),
            FileEvent::created("/files/b.pdf"),
            FileEvent::completed("/files/b.pdf"),
        ] {
            tx.send(event).unwrap();
        }

        wait_for(|| merger.0.lock().unwrap().len() == 1).await;
        assert_eq!(collator.state(), State::WaitingForFirst);

        stop_tx.send(()).unwrap();
        handle.await.unwrap();
        assert!(collator.is_closed());
    }

    #[tokio::test]
    async fn test_dispatch_handles_back_to_back_creations() {
        let (collator, merger) = collator();
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(dispatch(Arc::clone(&collator), rx, async move {
            let _ = stop_rx.await;
        }));

        // The second scan starts before the first one is closed and finishes
        // before the first one does.
        for event in [
            FileEvent::created("/files/a.pdf"),
            FileEvent::created("/files/b.pdf"),
            FileEvent::completed("/files/b.pdf"),
            FileEvent::completed("/files/a.pdf"),
        ] {
            tx.send(event).unwrap();
        }

        wait_for(|| merger.0.lock().unwrap().len() == 1).await;
        assert_eq!(merger.0.lock().unwrap()[0], PathBuf::from("/files/a.pdf"));

        stop_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_shutdown_releases_blocked_creation() {
        let (collator, merger) = collator();
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(dispatch(Arc::clone(&collator), rx, async move {
            let _ = stop_rx.await;
        }));

        tx.send(FileEvent::created("/files/a.pdf")).unwrap();
        tx.send(FileEvent::created("/files/b.pdf")).unwrap();
        wait_for(|| collator.state() == State::ReceivingFirst).await;

        stop_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("dispatch did not stop")
            .unwrap();

        assert!(merger.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_stops_when_events_end() {
        let (collator, _) = collator();
        let (tx, rx) = mpsc::unbounded_channel::<FileEvent>();
        drop(tx);

        dispatch(Arc::clone(&collator), rx, std::future::pending()).await;

        assert!(collator.is_closed());
    }

    #[tokio::test]
    async fn test_run_rejects_missing_source() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            source_dir: dir.path().join("missing"),
            destination_dir: dir.path().join("out"),
            ..Config::default()
        };

        let err = run(config, std::future::ready(())).await.unwrap_err();

        assert!(matches!(err, CollateError::InvalidConfig { .. }));
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_run_creates_destination_and_stops() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            source_dir: dir.path().to_path_buf(),
            destination_dir: dir.path().join("out"),
            ..Config::default()
        };

        run(config, std::future::ready(())).await.unwrap();

        assert!(dir.path().join("out").is_dir());
    }
}
