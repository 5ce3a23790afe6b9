use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::form::UploadForm;
use crate::progress::notifier::ProgressNotifier;
use crate::progress::observer::UploadObserver;
use crate::types::types::{
    UploadError, UploadOptions, UploadState, DEFAULT_TIMEOUT, MAX_FILE_SIZE,
};

/// Path the conversion service accepts uploads on.
pub const CONVERT_PATH: &str = "/api/convert";

/// Sends one multipart upload at a time and reports its progress, outcome
/// and failures to the registered observers.
///
/// `upload` and `cancel` both take `&self`; wrap the uploader in an `Arc` to
/// cancel from another task.
pub struct LargeFileUploader {
    client: Client,
    base_url: Url,
    endpoint: Url,
    headers: Vec<(String, String)>,
    timeout: Duration,
    max_file_size: u64,
    observers: Vec<Arc<dyn UploadObserver>>,
    state: Mutex<UploadState>,
    cancel_token: Mutex<Option<CancellationToken>>,
}

pub struct LargeFileUploaderBuilder {
    base_url: String,
    endpoint: String,
    client: Option<Client>,
    headers: Vec<(String, String)>,
    timeout: Duration,
    max_file_size: u64,
}

impl LargeFileUploaderBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: CONVERT_PATH.to_string(),
            client: None,
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            max_file_size: MAX_FILE_SIZE,
        }
    }

    /// Default timeout for every upload; `UploadOptions::timeout` overrides it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path (or absolute URL) to POST to instead of `/api/convert`.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn add_header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> Result<LargeFileUploader, UploadError> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| UploadError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        let endpoint = base_url
            .join(&self.endpoint)
            .map_err(|e| UploadError::InvalidUrl(format!("{}: {}", self.endpoint, e)))?;

        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .tcp_nodelay(true)
                .build()
                .map_err(UploadError::Transport)?,
        };

        Ok(LargeFileUploader {
            client,
            base_url,
            endpoint,
            headers: self.headers,
            timeout: self.timeout,
            max_file_size: self.max_file_size,
            observers: Vec::new(),
            state: Mutex::new(UploadState::Idle),
            cancel_token: Mutex::new(None),
        })
    }
}

/// Poisoning is ignored: the guarded values are plain enums and options.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LargeFileUploader {
    /// Uploader posting to `{base_url}/api/convert` with default settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self, UploadError> {
        LargeFileUploaderBuilder::new(base_url).build()
    }

    pub fn builder(base_url: impl Into<String>) -> LargeFileUploaderBuilder {
        LargeFileUploaderBuilder::new(base_url)
    }

    /// Register an observer. Must be called before `upload()`.
    pub fn add_observer(&mut self, observer: Box<dyn UploadObserver>) {
        self.observers.push(Arc::from(observer));
    }

    pub fn state(&self) -> UploadState {
        *lock(&self.state)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Abort the in-flight upload, if any. The pending `upload()` call returns
    /// `UploadError::Cancelled` and no observer callback fires for it.
    pub fn cancel(&self) {
        if let Some(token) = lock(&self.cancel_token).as_ref() {
            log::info!("[LargeFileUploader] cancelling upload to {}", self.endpoint);
            token.cancel();
        }
    }

    /// POST `form` as a multipart body and return the parsed JSON answer.
    ///
    /// Fails with `Busy` without touching observers when another upload from
    /// this instance is still running. Every other failure except `Cancelled`
    /// is reported to `on_error` exactly once before being returned.
    pub async fn upload(
        &self,
        form: UploadForm,
        options: UploadOptions,
    ) -> Result<Value, UploadError> {
        let token = self.begin()?;
        // A zero timeout means "not set", like an unset request timeout.
        let timeout = options
            .timeout
            .filter(|t| !t.is_zero())
            .unwrap_or(self.timeout);

        let result = self.send_form(form, timeout, &token).await;

        let final_state = match &result {
            Ok(_) => UploadState::Done,
            Err(UploadError::Cancelled) => UploadState::Cancelled,
            Err(_) => UploadState::Failed,
        };
        *lock(&self.cancel_token) = None;
        *lock(&self.state) = final_state;

        match &result {
            Ok(response) => {
                log::info!("[LargeFileUploader] upload to {} complete", self.endpoint);
                for observer in &self.observers {
                    observer.on_complete(response).await;
                }
            }
            Err(UploadError::Cancelled) => {
                log::info!("[LargeFileUploader] upload to {} cancelled", self.endpoint);
            }
            Err(error) => {
                log::warn!("[LargeFileUploader] upload to {} failed: {}", self.endpoint, error);
                for observer in &self.observers {
                    observer.on_error(error).await;
                }
            }
        }

        result
    }

    /// Move `Idle`/finished → `Uploading` and hand out a fresh cancel token.
    fn begin(&self) -> Result<CancellationToken, UploadError> {
        let mut state = lock(&self.state);
        if *state == UploadState::Uploading {
            return Err(UploadError::Busy);
        }
        *state = UploadState::Uploading;

        let token = CancellationToken::new();
        *lock(&self.cancel_token) = Some(token.clone());
        Ok(token)
    }

    async fn send_form(
        &self,
        form: UploadForm,
        timeout: Duration,
        token: &CancellationToken,
    ) -> Result<Value, UploadError> {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let body_finished = CancellationToken::new();

        let notifier = ProgressNotifier::new(self.observers.clone(), Instant::now());
        let finished = body_finished.clone();
        let notifier_handle = tokio::spawn(async move {
            notifier.run(progress_rx, finished).await;
        });

        let result = async {
            let prepared = form.prepare(self.max_file_size, progress_tx).await?;
            log::info!(
                "[LargeFileUploader] POST {} (file bytes={:?}, timeout={:?})",
                self.endpoint,
                prepared.total,
                timeout
            );

            let mut builder = self.client.post(self.endpoint.clone());
            for (key, value) in &self.headers {
                builder = builder.header(key, value);
            }
            let request = builder.multipart(prepared.form);

            tokio::select! {
                biased;
                _ = token.cancelled() => Err(UploadError::Cancelled),
                _ = tokio::time::sleep(timeout) => Err(UploadError::TimedOut),
                response = send_for_json(request) => response,
            }
        }
        .await;

        // Progress must reach observers before the terminal callback.
        body_finished.cancel();
        let _ = notifier_handle.await;

        result
    }
}

async fn send_for_json(request: RequestBuilder) -> Result<Value, UploadError> {
    let response = request.send().await.map_err(UploadError::Transport)?;
    read_json(response).await
}

/// Turn a response into `T`: non-2xx becomes `Status`, an unparsable body
/// becomes `InvalidJson`.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, UploadError> {
    let status = response.status();
    if !status.is_success() {
        log::debug!("[read_json] {} answered {}", response.url(), status);
        return Err(UploadError::Status(status.as_u16()));
    }
    let text = response.text().await.map_err(UploadError::Transport)?;
    serde_json::from_str(&text).map_err(UploadError::InvalidJson)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_resolved_against_origin() {
        let uploader = LargeFileUploader::new("http://localhost:5000/app/").unwrap();
        assert_eq!(uploader.endpoint().as_str(), "http://localhost:5000/api/convert");
        assert_eq!(uploader.state(), UploadState::Idle);
    }

    #[test]
    fn custom_endpoint_is_used() {
        let uploader = LargeFileUploader::builder("http://localhost:5000")
            .with_endpoint("/upload")
            .build()
            .unwrap();
        assert_eq!(uploader.endpoint().as_str(), "http://localhost:5000/upload");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = LargeFileUploader::new("not a url");
        assert!(matches!(result, Err(UploadError::InvalidUrl(_))));
    }

    #[test]
    fn cancel_without_upload_is_noop() {
        let uploader = LargeFileUploader::new("http://localhost:5000").unwrap();
        uploader.cancel();
        assert_eq!(uploader.state(), UploadState::Idle);
    }
}
