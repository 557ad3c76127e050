//! # Directory Watch Trigger
//!
//! Watches a directory for new photos and feeds their paths to the print
//! pipeline. This is pure stimulus production: no printing logic lives
//! here.
//!
//! ## Emission Rules
//!
//! - Only newly created files are emitted
//! - Hidden (dot-prefixed) names are ignored
//! - A path is emitted only after its size has been stable for the
//!   configured window, so half-written captures never reach the printer
//!
//! ## Serialized Job Loop
//!
//! [`run`] drives one job at a time: the next path is not taken from the
//! watcher until the previous job finished. Failed jobs are logged and
//! the loop continues; Ctrl-C stops dispatching immediately. An in-flight
//! job interrupted by process termination may leave spool files behind —
//! that is accepted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::WatchConfig;
use crate::error::PapershotError;
use crate::pipeline::Pipeline;

/// Watches one directory (non-recursive) for newly created files.
pub struct DirectoryWatcher {
    // Held for its Drop; dropping the watcher stops event delivery
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<PathBuf>,
    poll: Duration,
    stability: Duration,
}

impl DirectoryWatcher {
    pub fn new(config: &WatchConfig) -> Result<Self, PapershotError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
                Ok(event) if matches!(event.kind, EventKind::Create(_)) => {
                    for path in event.paths {
                        let _ = tx.send(path);
                    }
                }
                Ok(_) => {}
                Err(e) => log::warn!("watch event error: {}", e),
            })
            .map_err(|e| PapershotError::Watch(e.to_string()))?;
        watcher
            .watch(&config.dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                PapershotError::Watch(format!("cannot watch {}: {}", config.dir.display(), e))
            })?;
        Ok(Self {
            _watcher: watcher,
            rx,
            poll: Duration::from_millis(config.poll_ms),
            stability: Duration::from_millis(config.stability_ms),
        })
    }

    /// The next fully written, non-hidden photo. `None` when the watch
    /// backend has shut down.
    pub async fn next(&mut self) -> Option<PathBuf> {
        loop {
            let path = self.rx.recv().await?;
            if is_hidden(&path) {
                log::debug!("ignoring hidden file {}", path.display());
                continue;
            }
            if !self.wait_for_stable(&path).await {
                log::debug!("{} vanished before it stabilized", path.display());
                continue;
            }
            return Some(path);
        }
    }

    /// Wait until the file's size stops changing for the stability
    /// window. Returns `false` if the file disappears while waiting.
    async fn wait_for_stable(&self, path: &Path) -> bool {
        let mut last_len = None;
        let mut stable_for = Duration::ZERO;
        loop {
            match tokio::fs::metadata(path).await {
                Ok(meta) => {
                    let len = meta.len();
                    if last_len == Some(len) {
                        stable_for += self.poll;
                        if stable_for >= self.stability {
                            return true;
                        }
                    } else {
                        stable_for = Duration::ZERO;
                        last_len = Some(len);
                    }
                }
                Err(_) => return false,
            }
            tokio::time::sleep(self.poll).await;
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// The serialized watch loop: one job at a time, failed jobs never stop
/// the loop, Ctrl-C stops dispatching.
pub async fn run(pipeline: &mut Pipeline, config: &WatchConfig) -> Result<(), PapershotError> {
    let mut watcher = DirectoryWatcher::new(config)?;
    log::info!("watching {} for new photos", config.dir.display());
    // One pinned listener for the whole loop: a signal that arrives while
    // a job is printing (no select in flight) is retained and observed on
    // the next iteration instead of being dropped with a per-iteration
    // future.
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                log::info!("interrupted; no further jobs will be dispatched");
                return Ok(());
            }
            path = watcher.next() => {
                match path {
                    Some(path) => {
                        // Outcome (including failure) is logged by the
                        // pipeline; the loop lives on for the next photo
                        let _job = pipeline.print(&path).await;
                    }
                    None => {
                        return Err(PapershotError::Watch(
                            "watch channel closed".to_string(),
                        ));
                    }
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new("img/.capture.jpg.tmp")));
        assert!(is_hidden(Path::new(".hidden")));
        assert!(!is_hidden(Path::new("img/capture.jpg")));
        assert!(!is_hidden(Path::new("img/photo.with.dots.png")));
    }

    fn fast_config(dir: &Path) -> WatchConfig {
        WatchConfig {
            dir: dir.to_path_buf(),
            poll_ms: 10,
            stability_ms: 30,
        }
    }

    #[tokio::test]
    async fn test_emits_new_file_after_it_stabilizes() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = DirectoryWatcher::new(&fast_config(dir.path())).unwrap();

        let path = dir.path().join("photo.jpg");
        fs::write(&path, b"jpeg bytes").unwrap();

        let emitted = tokio::time::timeout(Duration::from_secs(5), watcher.next())
            .await
            .expect("watcher should emit within the timeout")
            .expect("channel open");
        assert_eq!(emitted.file_name(), path.file_name());
    }

    #[tokio::test]
    async fn test_hidden_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = DirectoryWatcher::new(&fast_config(dir.path())).unwrap();

        fs::write(dir.path().join(".partial.jpg"), b"x").unwrap();
        fs::write(dir.path().join("real.jpg"), b"jpeg bytes").unwrap();

        let emitted = tokio::time::timeout(Duration::from_secs(5), watcher.next())
            .await
            .expect("watcher should emit within the timeout")
            .expect("channel open");
        assert_eq!(emitted.file_name().unwrap(), "real.jpg");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_interrupt_during_a_job_stops_the_loop() {
        use std::collections::VecDeque;
        use std::sync::Arc;

        use crate::config::{Config, PrintConfig};
        use crate::transport::device::TransportFactory;
        use crate::transport::mock::{DsrScript, MockTransport};
        use crate::transport::{DeviceAdapter, Transport};

        let dir = tempfile::tempdir().unwrap();
        let watch_dir = dir.path().join("img");
        fs::create_dir_all(&watch_dir).unwrap();

        // A long DSR back-off keeps the job printing for several hundred
        // milliseconds, so the interrupt lands while no select is in
        // flight.
        let mock = MockTransport::new()
            .dsr(DsrScript::Sequence(VecDeque::from(vec![false; 500])));
        let config = Config {
            print: PrintConfig {
                spool_dir: dir.path().join("spool"),
                width_dots: 64,
                ..PrintConfig::default()
            },
            ..Config::default()
        };
        let factory: TransportFactory =
            Arc::new(move || Ok(Box::new(mock.clone()) as Box<dyn Transport>));
        let adapter = DeviceAdapter::new(factory, Duration::from_millis(1), None);
        let mut pipeline = Pipeline::new(config, adapter);

        let watch_config = WatchConfig {
            dir: watch_dir.clone(),
            poll_ms: 10,
            stability_ms: 20,
        };
        let run_loop = run(&mut pipeline, &watch_config);
        tokio::pin!(run_loop);

        let drive = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let img = image::RgbImage::from_pixel(32, 64, image::Rgb([128, 128, 128]));
            image::DynamicImage::ImageRgb8(img)
                .save(watch_dir.join("photo.png"))
                .unwrap();
            // By now the job is mid-print, spinning on ready polls
            tokio::time::sleep(Duration::from_millis(150)).await;
            unsafe {
                libc::raise(libc::SIGINT);
            }
        };

        let (stopped, _) = tokio::join!(
            tokio::time::timeout(Duration::from_secs(10), &mut run_loop),
            drive
        );
        stopped
            .expect("loop must stop after the interrupt")
            .expect("clean shutdown");
    }

    #[tokio::test]
    async fn test_watching_missing_directory_errors() {
        let config = WatchConfig {
            dir: PathBuf::from("/nonexistent/watchdir"),
            ..WatchConfig::default()
        };
        assert!(matches!(
            DirectoryWatcher::new(&config),
            Err(PapershotError::Watch(_))
        ));
    }
}
