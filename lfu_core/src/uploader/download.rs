use std::path::Path;

use futures::StreamExt;
use reqwest::{Client, Url};
use tokio::io::AsyncWriteExt;

use crate::types::types::UploadError;

pub const DOWNLOAD_PATH: &str = "/api/download/";

/// Write buffer for the converted file (256 KB).
const WRITE_BUFFER: usize = 256 * 1024;

fn download_url(base_url: &Url, job_id: &str) -> Result<Url, UploadError> {
    let mut url = base_url
        .join(DOWNLOAD_PATH)
        .map_err(|e| UploadError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| UploadError::InvalidUrl(base_url.to_string()))?
        .pop_if_empty()
        .push(job_id);
    Ok(url)
}

/// `GET /api/download/{job_id}` and stream the converted file into `dest`.
///
/// The service answers 400 while the job is not `completed` and 404 when the
/// job or its output is gone; both surface as `UploadError::Status` and leave
/// `dest` untouched. Returns the number of bytes written.
pub async fn download_result(
    client: &Client,
    base_url: &Url,
    job_id: &str,
    dest: &Path,
) -> Result<u64, UploadError> {
    let url = download_url(base_url, job_id)?;
    let response = client.get(url).send().await.map_err(UploadError::Transport)?;

    let status = response.status();
    if !status.is_success() {
        log::warn!("[download_result] job {}: server answered {}", job_id, status);
        return Err(UploadError::Status(status.as_u16()));
    }
    log::info!(
        "[download_result] job {}: saving to {} (content_length={:?})",
        job_id,
        dest.display(),
        response.content_length()
    );

    let file = tokio::fs::File::create(dest).await?;
    let mut writer = tokio::io::BufWriter::with_capacity(WRITE_BUFFER, file);
    let mut written: u64 = 0;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(UploadError::Transport)?;
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;

    log::info!("[download_result] job {}: wrote {} bytes", job_id, written);
    Ok(written)
}
