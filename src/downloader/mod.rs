pub mod control;
pub mod controller;
pub mod core;
pub mod error;
pub mod models;
pub mod progress;

pub use control::TransferControl;
pub use controller::TransferController;
pub use error::DownloadError;
pub use models::{ProgressUpdate, TransferEvent, TransferOutcome, TransferRequest, TransferState, TransferStatus};
pub use progress::ConsoleReporter;
