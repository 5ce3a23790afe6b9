//! Streaming multipart uploads with progress, speed and ETA reporting.
//!
//! [`uploader::LargeFileUploader`] sends one upload at a time to a conversion
//! service, notifying [`progress::UploadObserver`]s as bytes go out and when
//! the request completes or fails. [`display::ProgressPanel`] turns progress
//! snapshots into the text a front end shows.

pub mod display;
pub mod progress;
pub mod types;
pub mod uploader;

pub use types::types::{
    ConversionAccepted, JobStatus, UploadError, UploadOptions, UploadState, DEFAULT_TIMEOUT,
    MAX_FILE_SIZE,
};
