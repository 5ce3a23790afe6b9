use futures::TryStreamExt;
use reqwest::Body;
use tokio::fs::File;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;

use crate::types::types::ProgressEvent;

/// Read buffer for the file part (256 KB).
const CHUNK_SIZE: usize = 256 * 1024;

/// Wraps `file` into a streaming request body that reports the cumulative
/// number of bytes handed to the HTTP client after every chunk.
///
/// The sender lives inside the stream, so the channel closes once the client
/// drops the body.
pub fn progress_body(
    file: File,
    total: u64,
    progress_tx: mpsc::UnboundedSender<ProgressEvent>,
) -> Body {
    let mut loaded: u64 = 0;
    let stream = ReaderStream::with_capacity(file, CHUNK_SIZE).inspect_ok(move |chunk| {
        loaded += chunk.len() as u64;
        // Receiver gone means nobody is listening any more; keep sending the body.
        let _ = progress_tx.send(ProgressEvent {
            loaded,
            total: Some(total),
        });
    });
    Body::wrap_stream(stream)
}
