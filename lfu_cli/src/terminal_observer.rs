use std::sync::Mutex;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use lfu_core::display::{show_upload_progress, ProgressPanel};
use lfu_core::progress::{ProgressInfo, UploadObserver};
use lfu_core::UploadError;

/// Renders upload progress as a single indicatif bar whose message is the
/// speed / remaining / size lines of a `ProgressPanel`.
pub struct TerminalProgressObserver {
    bar: ProgressBar,
    panel: Mutex<ProgressPanel>,
}

impl TerminalProgressObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("[{bar:30.cyan/blue}] {prefix} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        Self {
            bar,
            panel: Mutex::new(ProgressPanel::new()),
        }
    }
}

#[async_trait]
impl UploadObserver for TerminalProgressObserver {
    async fn on_progress(&self, info: &ProgressInfo) {
        let mut panel = self.panel.lock().unwrap();
        show_upload_progress(&mut panel, info);

        self.bar.set_position(u64::from(info.percent));
        self.bar.set_prefix(panel.text.clone());
        if let Some(details) = panel.details() {
            self.bar.set_message(format!(
                "{} | {} | {}",
                details.speed, details.remaining, details.size
            ));
        }
    }

    async fn on_complete(&self, response: &Value) {
        self.bar.finish_with_message(format!("Upload complete: {}", response));
    }

    async fn on_error(&self, error: &UploadError) {
        self.bar.abandon_with_message(format!("Error: {}", error));
    }
}
