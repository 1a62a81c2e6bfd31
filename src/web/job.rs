// Background YouTube aggregation job, started via POST /api/youtube/jobs.
//
// Only one job runs at a time; starting another returns 409 while one is
// active. Progress is written from the aggregator's synchronous callback
// into atomics, so GET /api/youtube/jobs never waits on the running job.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::aggregate::{CancelFlag, Outcome, ScanProgress};
use crate::analysis::{AggregationMode, Analyzer, VideoReport};
use crate::models::ModelBackend;

/// What the client asked the job to do.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub url: String,
    pub mode: AggregationMode,
    pub backend: ModelBackend,
    pub username: String,
}

#[derive(Debug, Clone, Default)]
struct JobState {
    running: bool,
    url: Option<String>,
    mode: Option<AggregationMode>,
    started_by: Option<String>,
    started_at: Option<String>,
    finished_at: Option<String>,
    message: String,
    result: Option<VideoReport>,
    error: Option<String>,
    cancel: CancelFlag,
}

/// Snapshot returned by GET /api/youtube/jobs.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub running: bool,
    pub url: Option<String>,
    pub mode: Option<AggregationMode>,
    pub started_by: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    /// Fraction of fetched comments scanned, in [0, 1].
    pub progress: f64,
    pub scanned: usize,
    pub total: usize,
    pub message: String,
    pub result: Option<VideoReport>,
    pub error: Option<String>,
}

/// The single job slot shared through AppState.
#[derive(Default)]
pub struct YoutubeJob {
    state: RwLock<JobState>,
    scanned: AtomicUsize,
    total: AtomicUsize,
}

impl YoutubeJob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for a new run. Returns the run's cancel flag, or None
    /// if a job is already running.
    pub async fn try_start(&self, request: &JobRequest) -> Option<CancelFlag> {
        let mut state = self.state.write().await;
        if state.running {
            return None;
        }

        let cancel = CancelFlag::new();
        *state = JobState {
            running: true,
            url: Some(request.url.clone()),
            mode: Some(request.mode),
            started_by: Some(request.username.clone()),
            started_at: Some(Utc::now().to_rfc3339()),
            message: "Fetching comments…".to_string(),
            cancel: cancel.clone(),
            ..JobState::default()
        };
        self.scanned.store(0, Ordering::SeqCst);
        self.total.store(0, Ordering::SeqCst);
        Some(cancel)
    }

    /// Ask the running job to stop. Returns false when nothing is running.
    pub async fn cancel(&self) -> bool {
        let mut state = self.state.write().await;
        if !state.running {
            return false;
        }
        state.cancel.cancel();
        state.message = "Cancelling…".to_string();
        true
    }

    pub fn record_progress(&self, progress: ScanProgress) {
        self.total.store(progress.total, Ordering::SeqCst);
        self.scanned.store(progress.scanned, Ordering::SeqCst);
    }

    pub async fn status(&self) -> JobStatus {
        let state = self.state.read().await;
        let progress = ScanProgress {
            scanned: self.scanned.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
        };
        JobStatus {
            running: state.running,
            url: state.url.clone(),
            mode: state.mode,
            started_by: state.started_by.clone(),
            started_at: state.started_at.clone(),
            finished_at: state.finished_at.clone(),
            progress: job_fraction(&state, progress),
            scanned: progress.scanned,
            total: progress.total,
            message: state.message.clone(),
            result: state.result.clone(),
            error: state.error.clone(),
        }
    }

    async fn finish(&self, result: anyhow::Result<VideoReport>) {
        let mut state = self.state.write().await;
        state.running = false;
        state.finished_at = Some(Utc::now().to_rfc3339());

        match result {
            Ok(report) => {
                state.message = completion_message(&report);
                info!(message = %state.message, "YouTube job finished");
                state.result = Some(report);
                state.error = None;
            }
            Err(e) => {
                error!(error = %e, "YouTube job failed");
                state.message = "Job failed".to_string();
                state.error = Some(format!("{e:#}"));
            }
        }
    }
}

/// Human-readable summary of a finished run.
pub fn completion_message(report: &VideoReport) -> String {
    let tally = report.tally();
    let base = match report.outcome() {
        Outcome::NoComments => {
            "No comments found for this video or comments could not be fetched.".to_string()
        }
        Outcome::NoValidComments => "No valid comments to analyze.".to_string(),
        Outcome::Analyzed => format!("Analyzed {} comments.", tally.analyzed),
    };
    if tally.cancelled {
        format!("Cancelled. {base}")
    } else {
        base
    }
}

/// Run the job in a background tokio task. Returns immediately; callers poll
/// `YoutubeJob::status` to track it.
pub fn launch_job(
    analyzer: Arc<Analyzer>,
    job: Arc<YoutubeJob>,
    request: JobRequest,
    cancel: CancelFlag,
) {
    tokio::spawn(async move {
        let progress_job = Arc::clone(&job);
        let mut progress = move |p: ScanProgress| progress_job.record_progress(p);

        let result = analyzer
            .analyze_video(
                &request.url,
                request.mode,
                request.backend,
                analyzer.comment_limit(),
                &mut progress,
                Some(&cancel),
            )
            .await;

        job.finish(result).await;
    });
}

/// Nothing counts as scanned until the first event arrives, which also
/// keeps the reported fraction increasing while comments are fetched.
fn job_fraction(state: &JobState, progress: ScanProgress) -> f64 {
    if state.running && progress.total > 0 || !state.running && state.result.is_some() {
        progress.fraction()
    } else {
        0.0
    }
}
