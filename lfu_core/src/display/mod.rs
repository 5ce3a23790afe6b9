pub mod panel;

pub use panel::{show_upload_progress, ProgressPanel, UploadDetails};
