//! File transfers: downloads streamed to disk and uploads read from disk.

mod download;
pub mod progress;
mod upload;

pub use download::FileDownload;
pub use progress::{ProgressHandler, DEFAULT_BUFFER_SIZE};
pub use upload::FileUpload;
