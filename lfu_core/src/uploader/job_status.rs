use std::time::Duration;

use reqwest::{Client, Url};

use super::large_file_uploader::read_json;
use crate::types::types::{JobStatus, UploadError};

pub const STATUS_PATH: &str = "/api/status/";

fn status_url(base_url: &Url, job_id: &str) -> Result<Url, UploadError> {
    let mut url = base_url
        .join(STATUS_PATH)
        .map_err(|e| UploadError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| UploadError::InvalidUrl(base_url.to_string()))?
        .pop_if_empty()
        .push(job_id);
    Ok(url)
}

/// One `GET /api/status/{job_id}`.
pub async fn fetch_job_status(
    client: &Client,
    base_url: &Url,
    job_id: &str,
) -> Result<JobStatus, UploadError> {
    let url = status_url(base_url, job_id)?;
    let response = client.get(url).send().await.map_err(UploadError::Transport)?;
    read_json(response).await
}

/// Poll the job every `interval` until it is `completed` or `failed`.
/// `on_update` sees every status fetched, including the last one.
pub async fn wait_for_job<F>(
    client: &Client,
    base_url: &Url,
    job_id: &str,
    interval: Duration,
    mut on_update: F,
) -> Result<JobStatus, UploadError>
where
    F: FnMut(&JobStatus),
{
    loop {
        let status = fetch_job_status(client, base_url, job_id).await?;
        on_update(&status);
        if status.is_terminal() {
            log::info!("[wait_for_job] job {} finished as {}", job_id, status.status);
            return Ok(status);
        }
        log::debug!(
            "[wait_for_job] job {} is {} ({:?}%)",
            job_id,
            status.status,
            status.progress
        );
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_url_appends_job_id() {
        let base = Url::parse("http://localhost:5000/").unwrap();
        let url = status_url(&base, "abc-123").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/status/abc-123");
    }

    #[test]
    fn status_url_escapes_job_id() {
        let base = Url::parse("http://localhost:5000").unwrap();
        let url = status_url(&base, "a/b").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/status/a%2Fb");
    }
}
