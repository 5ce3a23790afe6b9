use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;

use lfu_core::uploader::download::download_result;
use lfu_core::uploader::job_status::wait_for_job;
use lfu_core::uploader::validate::{validate_conversion, validate_youtube_url};
use lfu_core::uploader::{LargeFileUploader, UploadForm};
use lfu_core::{ConversionAccepted, JobStatus, UploadError, UploadOptions};

mod terminal_observer;
use terminal_observer::TerminalProgressObserver;

#[derive(Parser)]
#[command(name = "lfu", about = "Large file uploader for the conversion service")]
struct Args {
    /// Base URL of the conversion service
    #[arg(short, long, default_value = "http://127.0.0.1:5000")]
    server: String,

    /// File to upload
    #[arg(short, long, required_unless_present = "youtube_url")]
    file: Option<PathBuf>,

    /// Source format (defaults to the file extension)
    #[arg(long)]
    from: Option<String>,

    /// Target format
    #[arg(short, long)]
    to: String,

    /// Convert a YouTube video instead of uploading a file
    #[arg(long, conflicts_with = "file")]
    youtube_url: Option<String>,

    /// Request timeout in milliseconds (0 uses the one-hour default)
    #[arg(long, default_value = "3600000")]
    timeout_ms: u64,

    /// Poll the job status until the conversion finishes, then download the result
    #[arg(short, long)]
    wait: bool,

    #[arg(long, default_value = "2")]
    poll_interval_secs: u64,

    /// Where to save the converted file once the job completes
    /// (defaults to `converted.<to>`; implies --wait)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("converted.{}", self.to)))
    }
}

fn build_form(args: &Args) -> Result<UploadForm, String> {
    if let Some(url) = &args.youtube_url {
        validate_youtube_url(url).map_err(|e| e.to_string())?;
        validate_conversion("youtube", &args.to).map_err(|e| e.to_string())?;
        return Ok(UploadForm::youtube(&args.to, url));
    }
    let file = args.file.as_ref().ok_or("either --file or --youtube-url is required")?;
    let from = match &args.from {
        Some(from) => from.clone(),
        None => file
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .ok_or("cannot infer --from without a file extension")?,
    };
    validate_conversion(&from, &args.to).map_err(|e| e.to_string())?;
    Ok(UploadForm::conversion(&from, &args.to, file))
}

/// A `failed` job is an error for the caller; anything else passes through.
fn job_outcome(status: JobStatus) -> Result<JobStatus, UploadError> {
    if status.status == "failed" {
        return Err(UploadError::JobFailed {
            message: status
                .error_message
                .unwrap_or_else(|| "no error message".to_string()),
            job_id: status.job_id,
        });
    }
    Ok(status)
}

async fn run(args: Args, form: UploadForm) -> Result<(), UploadError> {
    let mut uploader = LargeFileUploader::new(args.server.clone())?;
    uploader.add_observer(Box::new(TerminalProgressObserver::new()));
    let uploader = Arc::new(uploader);

    // Ctrl-C cancels the in-flight upload instead of killing the process.
    let ctrl_c_uploader = uploader.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_uploader.cancel();
        }
    });

    println!("Uploading to {}", uploader.endpoint());
    let start = Instant::now();
    let options = UploadOptions::with_timeout(Duration::from_millis(args.timeout_ms));
    let response = uploader.upload(form, options).await?;
    println!("Upload finished in {:.2}s", start.elapsed().as_secs_f64());

    if !args.wait && args.output.is_none() {
        return Ok(());
    }

    let accepted: ConversionAccepted =
        serde_json::from_value(response).map_err(UploadError::InvalidJson)?;
    println!("Job {} is {}", accepted.job_id, accepted.status);

    let status = wait_for_job(
        uploader.client(),
        uploader.base_url(),
        &accepted.job_id,
        Duration::from_secs(args.poll_interval_secs),
        |s| log::info!("job {}: {} ({}%)", s.job_id, s.status, s.progress.unwrap_or(0)),
    )
    .await?;
    let status = job_outcome(status)?;
    println!("Job {} {}", status.job_id, status.status);

    let dest = args.output_path();
    let written = download_result(uploader.client(), uploader.base_url(), &status.job_id, &dest).await?;
    println!("Saved {} bytes to {}", written, dest.display());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    let form = match build_form(&args) {
        Ok(form) => form,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::from(2);
        }
    };

    match run(args, form).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
