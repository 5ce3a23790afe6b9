pub mod download;
pub mod form;
pub mod job_status;
pub mod large_file_uploader;
pub mod progress_stream;
pub mod validate;

pub use form::UploadForm;
pub use large_file_uploader::{LargeFileUploader, LargeFileUploaderBuilder};
