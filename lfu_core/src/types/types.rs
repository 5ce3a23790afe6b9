use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default request timeout: one hour, the same window the server allows for a
/// large upload.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3_600_000);

/// Largest file the conversion service accepts (40 GiB).
pub const MAX_FILE_SIZE: u64 = 40 * 1024 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload failed with status {0}")]
    Status(u16),

    #[error("Upload failed")]
    Transport(#[source] reqwest::Error),

    #[error("Upload timed out")]
    TimedOut,

    #[error("Invalid JSON response")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Upload cancelled")]
    Cancelled,

    #[error("An upload is already in progress")]
    Busy,

    #[error("Cannot read upload file: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is {size} bytes, larger than the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("Unsupported conversion: {from} to {to}")]
    UnsupportedConversion { from: String, to: String },

    #[error("Invalid YouTube URL: {0}")]
    InvalidYoutubeUrl(String),
}

/// Lifecycle of a single `LargeFileUploader`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadState {
    Idle,
    Uploading,
    Done,
    Failed,
    Cancelled,
}

/// Raw progress report sent from the body stream to the notifier.
///
/// `loaded` is cumulative so a late or coalesced event never under-counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub loaded: u64,
    pub total: Option<u64>,
}

/// Per-call overrides for `LargeFileUploader::upload`.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub timeout: Option<Duration>,
}

impl UploadOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// Body of the `202 Accepted` answer from `/api/convert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionAccepted {
    pub job_id: String,
    pub status: String,
}

/// Body of `/api/status/{job_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub status: String,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl JobStatus {
    /// `completed` and `failed` are the only states a job never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "completed" | "failed")
    }
}
