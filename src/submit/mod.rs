/// Submission pipeline
///
/// Takes the text mirror as it stands, POSTs it to the generation service and
/// streams the archive back with progress reporting. At most one generation runs
/// at a time; the busy flag and the progress indicator are reset on every exit
/// path, including errors.

mod save;

pub use save::{archive_filename, save_archive, NoDialog, PromptDialog, SaveChoice, SaveDialog, SaveTo};

use crate::config::Config;
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Archive stem used when the document has no project name
pub const DEFAULT_ARCHIVE_STEM: &str = "operator-sdk-project";

/// Upper bound on the buffer reserved up front from Content-Length
const PREALLOC_LIMIT: u64 = 8 << 20;

/// What the progress indicator should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "stage", content = "percent", rename_all = "camelCase")]
pub enum Progress {
    #[default]
    Idle,
    /// Request sent, no response yet
    Generating,
    /// Body streaming with a known length
    Downloading(u8),
    /// Body streaming without a Content-Length
    Indeterminate,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("A generation is already in progress")]
    Busy,

    #[error("Invalid JSON in editor. Please fix before generating.")]
    InvalidDocument(#[source] serde_json::Error),

    #[error("Generation failed: {body}")]
    Backend { status: u16, body: String },

    #[error("Error sending data to backend: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Download cancelled by user")]
    Cancelled,

    #[error("Failed to write archive: {0}")]
    Io(#[from] std::io::Error),
}

/// A saved archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArchive {
    pub path: PathBuf,
    pub filename: String,
    pub bytes: u64,
}

/// Client for the generation service
pub struct Generator {
    client: reqwest::Client,
    endpoint: String,
    download_dir: PathBuf,
    in_flight: AtomicBool,
    progress: watch::Sender<Progress>,
}

/// Holds the busy flag for one generation
struct InFlight<'a>(&'a Generator);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.progress.send_replace(Progress::Idle);
        self.0.in_flight.store(false, Ordering::Release);
    }
}

impl Generator {
    pub fn new(api_url: &str, download_dir: impl Into<PathBuf>) -> Self {
        let (progress, _) = watch::channel(Progress::Idle);
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/v1/generate", api_url.trim_end_matches('/')),
            download_dir: download_dir.into(),
            in_flight: AtomicBool::new(false),
            progress,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.generator.api_url, &config.download.dir)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// True while a generation is outstanding; the trigger should be disabled
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn progress(&self) -> Progress {
        *self.progress.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    pub async fn generate(&self, mirror_text: &str, dialog: &dyn SaveDialog) -> Result<GeneratedArchive, SubmitError> {
        self.generate_with_progress(mirror_text, dialog, |_| {}).await
    }

    /// Run one generation, calling `on_progress` on every stage change.
    ///
    /// The mirror text is parsed here and sent verbatim, so a valid hand edit is
    /// used even if the structured project has not caught up.
    pub async fn generate_with_progress(
        &self,
        mirror_text: &str,
        dialog: &dyn SaveDialog,
        mut on_progress: impl FnMut(Progress) + Send,
    ) -> Result<GeneratedArchive, SubmitError> {
        let _guard = self.begin()?;

        let document: Value = serde_json::from_str(mirror_text).map_err(SubmitError::InvalidDocument)?;
        let filename = archive_filename(document.get("projectName").and_then(Value::as_str));

        tracing::info!("🚀 Generating {} via {}", filename, self.endpoint);
        self.report(Progress::Generating, &mut on_progress);

        let result = self.fetch_archive(&document, &mut on_progress).await;
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("❌ {}", e);
                return Err(e);
            }
        };
        self.report(Progress::Idle, &mut on_progress);

        let path = save_archive(&bytes, &filename, dialog, &self.download_dir).await?;
        tracing::info!("📦 Archive saved to {} ({} bytes)", path.display(), bytes.len());

        Ok(GeneratedArchive {
            path,
            filename,
            bytes: bytes.len() as u64,
        })
    }

    fn begin(&self) -> Result<InFlight<'_>, SubmitError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SubmitError::Busy)?;
        Ok(InFlight(self))
    }

    fn report(&self, progress: Progress, on_progress: &mut impl FnMut(Progress)) {
        let previous = self.progress.send_replace(progress);
        if previous != progress {
            on_progress(progress);
        }
    }

    async fn fetch_archive(
        &self,
        document: &Value,
        on_progress: &mut (impl FnMut(Progress) + Send),
    ) -> Result<Vec<u8>, SubmitError> {
        let response = self.client.post(&self.endpoint).json(document).send().await?;

        let status = response.status();
        tracing::debug!("📡 Response status: {}", status);
        if !status.is_success() {
            let body = response.text().await?;
            return Err(SubmitError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let total = response.content_length().filter(|len| *len > 0);
        // Content-Length is only trusted for progress; the body may be shorter.
        let mut buffer = Vec::with_capacity(total.map_or(0, |len| len.min(PREALLOC_LIMIT)) as usize);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
            let progress = match total {
                Some(total) => Progress::Downloading(percent(buffer.len() as u64, total)),
                None => Progress::Indeterminate,
            };
            self.report(progress, on_progress);
        }
        Ok(buffer)
    }
}

fn percent(loaded: u64, total: u64) -> u8 {
    ((loaded as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds() {
        assert_eq!(percent(0, 3), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(3, 3), 100);
    }

    #[test]
    fn test_endpoint_joins_base() {
        let generator = Generator::new("http://backend.local/", ".");
        assert_eq!(generator.endpoint(), "http://backend.local/api/v1/generate");
    }

    #[tokio::test]
    async fn test_invalid_mirror_blocks_and_resets() {
        let generator = Generator::new("http://127.0.0.1:9", ".");
        let err = generator.generate("{not json", &NoDialog).await.unwrap_err();
        assert!(matches!(err, SubmitError::InvalidDocument(_)));
        assert_eq!(err.to_string(), "Invalid JSON in editor. Please fix before generating.");
        assert!(!generator.is_busy());
        assert_eq!(generator.progress(), Progress::Idle);
    }

    #[test]
    fn test_second_generation_is_busy() {
        let generator = Generator::new("http://127.0.0.1:9", ".");
        let guard = generator.begin().unwrap();
        assert!(generator.is_busy());
        assert!(matches!(generator.begin(), Err(SubmitError::Busy)));
        drop(guard);
        assert!(!generator.is_busy());
    }

    #[test]
    fn test_subscribers_see_reset_to_idle() {
        let generator = Generator::new("http://127.0.0.1:9", ".");
        let mut progress = generator.subscribe();
        let guard = generator.begin().unwrap();
        generator.progress.send_replace(Progress::Generating);
        assert_eq!(*progress.borrow_and_update(), Progress::Generating);
        drop(guard);
        assert!(progress.has_changed().unwrap());
        assert_eq!(*progress.borrow(), Progress::Idle);
    }

    #[test]
    fn test_progress_serializes_with_stage() {
        assert_eq!(
            serde_json::to_value(Progress::Downloading(40)).unwrap(),
            serde_json::json!({"stage": "downloading", "percent": 40})
        );
        assert_eq!(serde_json::to_value(Progress::Idle).unwrap(), serde_json::json!({"stage": "idle"}));
    }
}
