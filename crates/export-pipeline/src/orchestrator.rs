//! Export orchestration.
//!
//! One sequential state machine per export attempt:
//!
//! ```text
//! idle → preparing → downloading-media → uploading → rendering
//!      → downloading-result → complete
//! ```
//!
//! with `error` reachable from every non-terminal phase. JSON exports take
//! the short path `preparing → complete`. A new attempt always starts from
//! scratch; there are no resume semantics and no retries at any layer.
//!
//! The orchestrator owns the export state; there is no global singleton.
//! Observers subscribe to a watch channel; progress is monotonically
//! non-decreasing within an attempt and resets only when an attempt starts
//! or fails.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use clipflow_common::ClipflowError;
use clipflow_edl_core::Quality;
use clipflow_timeline_model::TimelineDocument;

use crate::fetch::{fetch_media_batch, MediaRequest, MediaSource};
use crate::payload::EditInstructions;
use crate::submit::{MediaFile, RenderError, RenderService};

/// What the export should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportType {
    /// Serialize the EDL itself; no media is fetched, nothing is rendered.
    Json,
    /// Full render through the remote service.
    Mp4,
}

impl FromStr for ExportType {
    type Err = ClipflowError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "json" => Ok(ExportType::Json),
            "mp4" => Ok(ExportType::Mp4),
            other => Err(ClipflowError::export(format!(
                "Unknown export type: {other}. Use: json, mp4"
            ))),
        }
    }
}

/// Lifecycle phase of the current (or last) export attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportPhase {
    #[default]
    Idle,
    Preparing,
    DownloadingMedia,
    Uploading,
    Rendering,
    DownloadingResult,
    Complete,
    Error,
}

impl ExportPhase {
    /// Terminal for the attempt; only a fresh `start_export` leaves it.
    pub fn is_terminal(self) -> bool {
        matches!(self, ExportPhase::Complete | ExportPhase::Error)
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportPhase::Idle => "idle",
            ExportPhase::Preparing => "preparing",
            ExportPhase::DownloadingMedia => "downloading-media",
            ExportPhase::Uploading => "uploading",
            ExportPhase::Rendering => "rendering",
            ExportPhase::DownloadingResult => "downloading-result",
            ExportPhase::Complete => "complete",
            ExportPhase::Error => "error",
        }
    }
}

/// Declared kind of a terminal artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Json,
    Mp4,
}

impl OutputKind {
    pub fn mime(self) -> &'static str {
        match self {
            OutputKind::Json => "application/json",
            OutputKind::Mp4 => "video/mp4",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Json => "json",
            OutputKind::Mp4 => "mp4",
        }
    }
}

/// Terminal downloadable artifact. The consumer performs the actual save;
/// the pipeline only hands over bytes and their declared kind.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub data: Arc<Vec<u8>>,
    pub kind: OutputKind,
}

/// Observable state of the orchestrator, published on every transition.
#[derive(Debug, Clone, Default)]
pub struct ExportState {
    pub phase: ExportPhase,

    /// 0-100; monotonically non-decreasing within one attempt.
    pub progress: u8,

    /// Display-only status line; never machine-parsed downstream.
    pub status_message: String,

    /// Present once the attempt completes.
    pub output: Option<ExportOutput>,
}

/// Everything one export attempt needs, captured up front.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// The timeline snapshot to export. `None` reproduces the editor's
    /// "nothing to export" failure.
    pub payload: Option<TimelineDocument>,

    pub export_type: ExportType,
    pub quality: Quality,
}

/// Fatal export failure. Progress is reset to 0 and the state machine
/// parks in `error`; recovery is an explicit new `start_export`.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Payload is not defined")]
    MissingPayload,

    #[error("No media found in timeline")]
    NoMedia,

    #[error("Could not download any media files")]
    AllFetchesFailed,

    #[error("An export is already in progress")]
    Busy,

    #[error("Export cancelled")]
    Cancelled,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to serialize EDL: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
}

impl From<ExportError> for ClipflowError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Render(render) => ClipflowError::render(render.to_string()),
            other => ClipflowError::export(other.to_string()),
        }
    }
}

/// Requests cancellation of the in-flight attempt. Checked between stages;
/// a cancelled attempt terminates in `error` with no partial output.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Drives one export attempt at a time through the full pipeline.
pub struct ExportOrchestrator<F, S> {
    fetcher: F,
    renderer: S,
    state: watch::Sender<ExportState>,
    in_flight: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<F: MediaSource, S: RenderService> ExportOrchestrator<F, S> {
    pub fn new(fetcher: F, renderer: S) -> Self {
        let (state, _) = watch::channel(ExportState::default());
        Self {
            fetcher,
            renderer,
            state,
            in_flight: Arc::new(AtomicBool::new(false)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to state transitions. Watch semantics: observers see the
    /// latest state, not necessarily every intermediate one.
    pub fn subscribe(&self) -> watch::Receiver<ExportState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ExportState {
        self.state.borrow().clone()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Run one export attempt to its terminal state.
    ///
    /// Only one attempt may be active; a concurrent call is rejected with
    /// [`ExportError::Busy`] and leaves the in-flight attempt untouched.
    /// Any prior terminal state is abandoned unconditionally.
    pub async fn start_export(&self, request: ExportRequest) -> Result<ExportOutput, ExportError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(ExportError::Busy);
        }
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));
        self.cancelled.store(false, Ordering::SeqCst);

        self.state.send_replace(ExportState {
            phase: ExportPhase::Preparing,
            progress: 0,
            status_message: "Preparing...".to_string(),
            output: None,
        });

        match self.run(request).await {
            Ok(output) => Ok(output),
            Err(err) => {
                tracing::error!(error = %err, "Export failed");
                self.state.send_replace(ExportState {
                    phase: ExportPhase::Error,
                    progress: 0,
                    status_message: format!("Error: {err}"),
                    output: None,
                });
                Err(err)
            }
        }
    }

    async fn run(&self, request: ExportRequest) -> Result<ExportOutput, ExportError> {
        let doc = request.payload.ok_or(ExportError::MissingPayload)?;

        self.transition(ExportPhase::Preparing, 5, "Extracting timeline data...");
        let edl = clipflow_edl_core::build(&doc, request.quality);
        tracing::info!(
            project = %edl.project_id,
            video_segments = edl.video_segments.len(),
            audio_segments = edl.audio_segments.len(),
            text_segments = edl.text_segments.len(),
            quality = %edl.quality,
            "EDL built"
        );

        match request.export_type {
            ExportType::Json => self.export_json(&edl),
            ExportType::Mp4 => self.export_mp4(&edl).await,
        }
    }

    fn export_json(
        &self,
        edl: &clipflow_edl_core::EditDecisionList,
    ) -> Result<ExportOutput, ExportError> {
        self.transition(ExportPhase::Preparing, 50, "Creating JSON...");
        let json = serde_json::to_vec_pretty(edl)?;
        let output = ExportOutput {
            data: Arc::new(json),
            kind: OutputKind::Json,
        };
        self.complete(output.clone(), "Ready!");
        Ok(output)
    }

    async fn export_mp4(
        &self,
        edl: &clipflow_edl_core::EditDecisionList,
    ) -> Result<ExportOutput, ExportError> {
        let media = edl.media_segments();
        if media.is_empty() {
            return Err(ExportError::NoMedia);
        }

        let requests: Vec<MediaRequest> = media
            .iter()
            .map(|segment| MediaRequest {
                segment_id: segment.id().to_string(),
                filename: segment.filename(),
                source_url: segment.source_url().to_string(),
                kind: segment.kind_label().to_string(),
                name: segment.name().to_string(),
            })
            .collect();
        let total = requests.len();

        self.check_cancelled()?;
        self.transition(
            ExportPhase::DownloadingMedia,
            10,
            "Downloading media files...",
        );
        let fetched = fetch_media_batch(&self.fetcher, requests, |done, total| {
            // 30-point band for the download stage, keyed to completions.
            let progress = 10 + ((done as f64 / total as f64) * 30.0).floor() as u8;
            self.transition(
                ExportPhase::DownloadingMedia,
                progress,
                format!("Downloading media files... ({done}/{total})"),
            );
        })
        .await;
        self.check_cancelled()?;

        if fetched.is_empty() {
            return Err(ExportError::AllFetchesFailed);
        }
        if fetched.len() < total {
            tracing::warn!(
                fetched = fetched.len(),
                total,
                "Proceeding with a partial media set"
            );
        }

        self.transition(ExportPhase::Uploading, 40, "Uploading to render server...");
        let files: Vec<MediaFile> = fetched
            .into_iter()
            .map(|media| MediaFile {
                segment_id: media.segment_id,
                filename: media.filename,
                bytes: media.bytes,
            })
            .collect();
        let edits = EditInstructions::from_edl(edl);

        self.check_cancelled()?;
        self.transition(ExportPhase::Rendering, 50, "Rendering with FFmpeg...");
        let artifact = self.renderer.submit(files, edits).await?;

        self.check_cancelled()?;
        self.transition(
            ExportPhase::DownloadingResult,
            90,
            "Downloading rendered video...",
        );
        let output = ExportOutput {
            data: Arc::new(artifact.bytes),
            kind: OutputKind::Mp4,
        };
        self.complete(output.clone(), "Complete!");
        Ok(output)
    }

    fn check_cancelled(&self) -> Result<(), ExportError> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(ExportError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn transition(&self, phase: ExportPhase, progress: u8, message: impl Into<String>) {
        self.state.send_modify(|state| {
            state.phase = phase;
            // Monotone within the attempt; resets happen only via send_replace.
            state.progress = state.progress.max(progress.min(100));
            state.status_message = message.into();
        });
        tracing::debug!(phase = phase.label(), progress, "Export state transition");
    }

    fn complete(&self, output: ExportOutput, message: &str) {
        self.state.send_replace(ExportState {
            phase: ExportPhase::Complete,
            progress: 100,
            status_message: message.to_string(),
            output: Some(output),
        });
    }
}
