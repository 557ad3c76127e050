//! # Print Jobs
//!
//! The orchestrator that drives one photo end to end:
//!
//! ```text
//! Pending → Preprocessing → Chunking → Printing → Completed | Failed
//! ```
//!
//! Strip mode (the default) transmits the bitmap as height-bounded strips
//! under DSR flow control: for each strip in order, wait-ready, transmit
//! (write + drain), wait-ready again to confirm, then delete the strip's
//! spool artifact. Whole-image mode loads the spooled bitmap back and
//! transmits it in a single write.
//!
//! ## Failure Semantics
//!
//! Preprocess and split errors fail the job before any device
//! interaction. A transmission error aborts the remaining strips;
//! already-printed strips are not retracted (paper is irreversible), so a
//! failed job can leave partial physical output. On abort, the spool
//! bitmap and the not-yet-transmitted strips' artifacts are deleted.
//! Spool deletion failures are logged and never affect job state.
//! No automatic retries anywhere: a failed job requires a new trigger.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::config::Config;
use crate::error::PapershotError;
use crate::protocol::text::{Alignment, Font, TextLine};
use crate::protocol::{commands, graphics};
use crate::render::MonoBitmap;
use crate::transport::DeviceAdapter;

use super::preprocess::{Preprocessor, Processed};
use super::strips::{self, Strip};

/// Lifecycle states of a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Preprocessing,
    Chunking,
    Printing,
    Completed,
    Failed,
}

/// One print job. Owned by the pipeline for its lifetime and dropped
/// afterwards; job history is not persisted.
#[derive(Debug)]
pub struct PrintJob {
    pub id: Uuid,
    pub source: PathBuf,
    pub state: JobState,
    pub strips_sent: usize,
    pub created_at: DateTime<Local>,
    error: Option<PapershotError>,
}

impl PrintJob {
    fn new(source: &Path) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.to_path_buf(),
            state: JobState::Pending,
            strips_sent: 0,
            created_at: Local::now(),
            error: None,
        }
    }

    fn fail(&mut self, error: PapershotError) {
        log::error!("job {} failed: {}", self.id, error);
        self.state = JobState::Failed;
        self.error = Some(error);
    }

    /// The failure, if the job failed.
    pub fn error(&self) -> Option<&PapershotError> {
        self.error.as_ref()
    }

    /// Convert a failed job into `Err` for `?`-style callers.
    pub fn into_result(self) -> Result<PrintJob, PapershotError> {
        match self.state {
            JobState::Failed => Err(self
                .error
                .unwrap_or_else(|| PapershotError::Transport("job failed".to_string()))),
            _ => Ok(self),
        }
    }
}

/// # Print Pipeline
///
/// Owns the device adapter and runs jobs one at a time; `&mut self` on
/// [`Pipeline::print`] is what serializes access to the connection.
pub struct Pipeline {
    config: Config,
    adapter: DeviceAdapter,
    preprocessor: Preprocessor,
}

impl Pipeline {
    pub fn new(config: Config, adapter: DeviceAdapter) -> Self {
        let preprocessor = Preprocessor::new(&config.print);
        Self {
            config,
            adapter,
            preprocessor,
        }
    }

    /// Build a pipeline over the serial device named in the config.
    pub fn with_serial(config: Config) -> Self {
        let adapter = DeviceAdapter::from_serial(&config.serial);
        Self::new(config, adapter)
    }

    /// Open the device connection eagerly, so a missing or busy device
    /// surfaces before the first job. Jobs otherwise open on demand.
    pub async fn connect(&mut self) -> Result<(), PapershotError> {
        self.adapter.open().await
    }

    /// Run one job end to end. Never panics or propagates: the outcome,
    /// success or failure, is the returned job.
    pub async fn print(&mut self, source: &Path) -> PrintJob {
        let mut job = PrintJob::new(source);
        log::info!("job {}: printing {}", job.id, source.display());

        if self.config.print.whole_image {
            self.print_whole(&mut job).await;
        } else {
            self.print_strips(&mut job).await;
        }

        match job.state {
            JobState::Completed => log::info!(
                "job {}: completed ({} strips)",
                job.id,
                job.strips_sent
            ),
            JobState::Failed => log::warn!(
                "job {}: failed after {} strips",
                job.id,
                job.strips_sent
            ),
            _ => {}
        }
        job
    }

    /// Strip mode: preprocess → split to files → transmit under flow
    /// control → cleanup.
    async fn print_strips(&mut self, job: &mut PrintJob) {
        job.state = JobState::Preprocessing;
        let processed = match self.preprocessor.process(&job.source, job.id) {
            Ok(p) => p,
            Err(e) => return job.fail(e),
        };

        job.state = JobState::Chunking;
        let strips = match strips::split_to_files(
            &processed.bitmap,
            self.config.print.strip_rows,
            &processed.path,
        ) {
            Ok(s) => s,
            Err(e) => {
                remove_artifact(&processed.path);
                return job.fail(e);
            }
        };

        job.state = JobState::Printing;
        let result = self.transmit_strips(job, &strips).await;
        if let Err(e) = result {
            self.abort_cleanup(&processed, &strips[job.strips_sent..]).await;
            return job.fail(e);
        }

        remove_artifact(&processed.path);
        job.state = JobState::Completed;
    }

    /// Whole-image mode: preprocess → load the spooled bitmap back →
    /// single write → cleanup.
    async fn print_whole(&mut self, job: &mut PrintJob) {
        job.state = JobState::Preprocessing;
        let processed = match self.preprocessor.process(&job.source, job.id) {
            Ok(p) => p,
            Err(e) => return job.fail(e),
        };
        let bitmap = match MonoBitmap::load_png(&processed.path) {
            Ok(b) => b,
            Err(e) => {
                remove_artifact(&processed.path);
                return job.fail(e);
            }
        };

        job.state = JobState::Printing;
        let result = self.transmit_whole(&bitmap).await;
        remove_artifact(&processed.path);
        if let Err(e) = result {
            return job.fail(e);
        }
        job.state = JobState::Completed;
    }

    /// The per-strip transmit loop. Strips go out strictly in ascending
    /// `top` order; no strip's write begins before the previous strip's
    /// write and drain both completed.
    async fn transmit_strips(
        &mut self,
        job: &mut PrintJob,
        strips: &[Strip],
    ) -> Result<(), PapershotError> {
        self.adapter.open().await?;
        self.adapter.write(commands::init()).await?;

        for strip in strips {
            self.adapter.wait_ready().await?;
            log::debug!(
                "job {}: strip {}/{} ({} rows at {})",
                job.id,
                strip.index + 1,
                strips.len(),
                strip.height,
                strip.top
            );
            let data = graphics::bit_image(&strip.bitmap, self.config.print.density);
            self.adapter.write(data).await?;
            // Confirm the printer drained this strip before the next one
            self.adapter.wait_ready().await?;

            if let Some(path) = &strip.path {
                remove_artifact(path);
            }
            job.strips_sent += 1;
        }

        self.adapter.wait_ready().await?;
        self.adapter.write(self.trailer()).await?;
        self.adapter.flush().await?;
        if let Err(e) = self.adapter.close(self.close_delay()).await {
            log::warn!("job {}: close reported: {}", job.id, e);
        }
        Ok(())
    }

    async fn transmit_whole(&mut self, bitmap: &MonoBitmap) -> Result<(), PapershotError> {
        self.adapter.open().await?;

        let mut data = commands::init();
        data.extend(graphics::bit_image(bitmap, self.config.print.density));
        data.extend(self.trailer());
        self.adapter.write(data).await?;

        self.adapter.wait_ready().await?;
        self.adapter.flush().await?;
        if let Err(e) = self.adapter.close(self.close_delay()).await {
            log::warn!("close reported: {}", e);
        }
        Ok(())
    }

    /// Caption, feed and cut printed after the photo.
    fn trailer(&self) -> Vec<u8> {
        let print = &self.config.print;
        let mut data = Vec::new();
        if let Some(caption) = &print.caption {
            let (w, h) = print.caption_size;
            data.extend(
                TextLine::new(caption)
                    .font(Font::B)
                    .align(Alignment::Center)
                    .size(w, h)
                    .build(),
            );
        }
        data.extend(commands::feed_lines(print.feed_lines));
        data.extend(commands::cut_feed(print.cut_partial, print.cut_feed));
        data
    }

    fn close_delay(&self) -> Duration {
        Duration::from_millis(self.config.serial.close_delay_ms)
    }

    /// After a transmission error: delete the artifacts of the strips
    /// that never went out, plus the spool bitmap, and close the device.
    async fn abort_cleanup(&mut self, processed: &Processed, remaining: &[Strip]) {
        for strip in remaining {
            if let Some(path) = &strip.path {
                remove_artifact(path);
            }
        }
        remove_artifact(&processed.path);
        if let Err(e) = self.adapter.close(self.close_delay()).await {
            log::warn!("close after aborted job reported: {}", e);
        }
    }
}

/// Delete a spool artifact. Failure is logged and non-fatal.
fn remove_artifact(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        log::warn!("failed to clean up {}: {}", path.display(), e);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrintConfig;
    use crate::transport::device::TransportFactory;
    use crate::transport::{MockTransport, Transport};
    use std::sync::Arc;

    fn mock_pipeline(spool_dir: &Path, mock: MockTransport) -> Pipeline {
        let config = Config {
            print: PrintConfig {
                spool_dir: spool_dir.to_path_buf(),
                width_dots: 64,
                strip_rows: 24,
                ..PrintConfig::default()
            },
            ..Config::default()
        };
        let factory: TransportFactory =
            Arc::new(move || Ok(Box::new(mock.clone()) as Box<dyn Transport>));
        let adapter = DeviceAdapter::new(factory, Duration::from_millis(1), None);
        Pipeline::new(config, adapter)
    }

    #[tokio::test]
    async fn test_job_fails_before_device_on_bad_source() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockTransport::new();
        let mut pipeline = mock_pipeline(dir.path(), mock.clone());

        let job = pipeline.print(Path::new("/nonexistent/photo.jpg")).await;
        assert_eq!(job.state, JobState::Failed);
        assert!(matches!(job.error(), Some(PapershotError::Decode(_))));
        // No device interaction at all
        assert!(mock.ops().is_empty());
    }

    #[tokio::test]
    async fn test_into_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = mock_pipeline(dir.path(), MockTransport::new());
        let job = pipeline.print(Path::new("/nonexistent/photo.jpg")).await;
        assert!(job.into_result().is_err());
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = PrintJob::new(Path::new("photo.jpg"));
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.strips_sent, 0);
        assert!(job.error().is_none());
    }
}
