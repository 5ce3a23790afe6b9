pub mod notifier;
pub mod observer;
pub mod snapshot;

pub use notifier::ProgressNotifier;
pub use observer::UploadObserver;
pub use snapshot::{format_file_size, format_speed, format_time, ProgressInfo};
