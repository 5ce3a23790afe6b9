use reqwest::{Client, Url};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lfu_core::uploader::download::download_result;
use lfu_core::UploadError;

/// Generates deterministic test data.
fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

fn base(server: &MockServer) -> Url {
    Url::parse(&server.uri()).unwrap()
}

#[tokio::test]
async fn test_download_result_streams_file_to_disk() {
    let body = generate_test_data(512 * 1024);
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/job-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body.clone())
                .insert_header("Content-Type", "application/octet-stream")
                .insert_header(
                    "Content-Disposition",
                    "attachment; filename=\"converted.mp3\"",
                ),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("converted.mp3");

    let written = download_result(&Client::new(), &base(&server), "job-1", &dest)
        .await
        .unwrap();

    assert_eq!(written, body.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[tokio::test]
async fn test_download_before_completion_is_status_400() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/busy"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Job not completed"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.wav");

    let result = download_result(&Client::new(), &base(&server), "busy", &dest).await;

    assert!(matches!(result, Err(UploadError::Status(400))));
    assert!(!dest.exists(), "no file should be created for an error answer");
}

#[tokio::test]
async fn test_download_unknown_job_is_status_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Job not found"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.zip");

    let result = download_result(&Client::new(), &base(&server), "gone", &dest).await;

    assert!(matches!(result, Err(UploadError::Status(404))));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_download_into_missing_directory_is_io_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 16]))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("no_such_dir").join("out.bin");

    let result = download_result(&Client::new(), &base(&server), "job", &dest).await;
    assert!(matches!(result, Err(UploadError::Io(_))));
}
