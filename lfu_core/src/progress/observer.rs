use async_trait::async_trait;
use serde_json::Value;

use super::snapshot::ProgressInfo;
use crate::types::types::UploadError;

/// Trait for anything that wants to follow an upload.
///
/// Lifecycle:
/// - `on_progress` is called for every progress event while the body is sent,
///   as long as the body size is known.
/// - `on_complete` is called once with the parsed JSON body after a 2xx answer.
/// - `on_error` is called once when the upload fails (bad status, transport
///   failure, timeout, malformed JSON).
///
/// A cancelled upload reaches neither `on_complete` nor `on_error`.
#[async_trait]
pub trait UploadObserver: Send + Sync + 'static {
    async fn on_progress(&self, info: &ProgressInfo);

    async fn on_complete(&self, response: &Value);

    async fn on_error(&self, error: &UploadError);
}
