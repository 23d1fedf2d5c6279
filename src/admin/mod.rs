pub mod error;
pub mod maintenance;
pub mod upload;

pub use error::{MaintenanceError, UploadError};
pub use maintenance::{MaintenanceSweep, SweepTally};
pub use upload::{UploadFile, UploadPipeline, UploadResult, UploadSummary, UploadTask};
