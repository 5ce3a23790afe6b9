use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use tokio::sync::mpsc;

use super::progress_stream::progress_body;
use crate::types::types::{ProgressEvent, UploadError};

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone)]
struct FilePart {
    field: String,
    path: PathBuf,
}

/// Description of a multipart request body: text fields in insertion order
/// plus at most one file streamed from disk.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    fields: Vec<(String, String)>,
    file: Option<FilePart>,
}

/// A `reqwest` form ready to send, with the size of its file part.
pub(crate) struct PreparedForm {
    pub form: Form,
    pub total: Option<u64>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Attach the file to stream. A second call replaces the first.
    pub fn file(mut self, field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.file = Some(FilePart {
            field: field.into(),
            path: path.into(),
        });
        self
    }

    /// Form for converting a local file, as `/api/convert` expects it.
    pub fn conversion(from: &str, to: &str, path: impl Into<PathBuf>) -> Self {
        Self::new()
            .text("from", from)
            .text("to", to)
            .text("source", "upload")
            .file("file", path)
    }

    /// Form asking the service to fetch and convert a YouTube video.
    pub fn youtube(to: &str, url: &str) -> Self {
        Self::new()
            .text("from", "youtube")
            .text("to", to)
            .text("source", "youtube")
            .text("url", url)
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path.as_path())
    }

    /// Opens the file part (if any), enforces `max_file_size` and builds the
    /// multipart body. Nothing touches the network here.
    pub(crate) async fn prepare(
        self,
        max_file_size: u64,
        progress_tx: mpsc::UnboundedSender<ProgressEvent>,
    ) -> Result<PreparedForm, UploadError> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }

        let Some(file_part) = self.file else {
            return Ok(PreparedForm { form, total: None });
        };

        let file = tokio::fs::File::open(&file_part.path).await?;
        let size = file.metadata().await?.len();
        if size > max_file_size {
            return Err(UploadError::FileTooLarge {
                size,
                limit: max_file_size,
            });
        }

        let file_name = file_part
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_part.field.clone());

        let part = Part::stream_with_length(progress_body(file, size, progress_tx), size)
            .file_name(file_name)
            .mime_str(OCTET_STREAM)
            .map_err(UploadError::Transport)?;

        Ok(PreparedForm {
            form: form.part(file_part.field, part),
            total: Some(size),
        })
    }
}
