use serde::Serialize;

use crate::progress::snapshot::{format_file_size, ProgressInfo, UNKNOWN};

pub const PROGRESS_CONTAINER: &str = "progress-container";
pub const PROGRESS_BAR: &str = "progress-bar";
pub const PROGRESS_TEXT: &str = "progress-text";
pub const UPLOAD_SPEED: &str = "upload-speed";
pub const UPLOAD_REMAINING: &str = "upload-remaining";
pub const UPLOAD_SIZE: &str = "upload-size";

/// The details block added under the bar on the first progress update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadDetails {
    pub speed: String,
    pub remaining: String,
    pub size: String,
}

impl UploadDetails {
    fn placeholder() -> Self {
        Self {
            speed: format!("Speed: {}", UNKNOWN),
            remaining: format!("Time remaining: {}", UNKNOWN),
            size: format!("Size: {}", UNKNOWN),
        }
    }
}

/// Text content of the progress panel, keyed by the element ids a front end
/// renders it into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressPanel {
    /// Width of `progress-bar`, e.g. `"42%"`.
    pub bar_width: String,
    /// Content of `progress-text`.
    pub text: String,
    details: Option<UploadDetails>,
}

impl ProgressPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the first call to `show_upload_progress`.
    pub fn details(&self) -> Option<&UploadDetails> {
        self.details.as_ref()
    }

    /// Whether an element with `id` exists. The container, bar and text are
    /// always there; the details elements appear with the details block.
    pub fn has_element(&self, id: &str) -> bool {
        match id {
            PROGRESS_CONTAINER | PROGRESS_BAR | PROGRESS_TEXT => true,
            UPLOAD_SPEED | UPLOAD_REMAINING | UPLOAD_SIZE => self.details.is_some(),
            _ => false,
        }
    }

    /// Text of a leaf element. `progress-container` has no text of its own;
    /// use `has_element` and `details` for it.
    pub fn element_text(&self, id: &str) -> Option<&str> {
        match id {
            PROGRESS_BAR => Some(self.bar_width.as_str()),
            PROGRESS_TEXT => Some(self.text.as_str()),
            UPLOAD_SPEED => self.details.as_ref().map(|d| d.speed.as_str()),
            UPLOAD_REMAINING => self.details.as_ref().map(|d| d.remaining.as_str()),
            UPLOAD_SIZE => self.details.as_ref().map(|d| d.size.as_str()),
            _ => None,
        }
    }

    fn ensure_details(&mut self) -> &mut UploadDetails {
        self.details.get_or_insert_with(|| {
            log::debug!("[ProgressPanel] adding details block to {}", PROGRESS_CONTAINER);
            UploadDetails::placeholder()
        })
    }
}

/// Render `info` into the panel, adding the details block the first time.
pub fn show_upload_progress(panel: &mut ProgressPanel, info: &ProgressInfo) {
    panel.bar_width = format!("{}%", info.percent);
    panel.text = format!("Uploading... {}%", info.percent);

    let details = panel.ensure_details();
    details.speed = format!("Speed: {}", info.speed);
    details.remaining = format!("Time remaining: {}", info.remaining);
    details.size = format!(
        "Size: {} / {}",
        format_file_size(info.loaded),
        format_file_size(info.total)
    );
}
