mod batch;
mod group;
mod operation;
mod photo;

pub use batch::{
    batch_info, BatchFolderData, LocationSummary, PhotoWithMetadata, UploadBatch, ROOT_LOCATION,
};
pub use group::{GroupId, PhotoGroup};
pub use operation::{
    BatchArchive, BatchFailure, PendingDownload, ProgressEvent, RunOutcome, RunReport,
};
pub use photo::PhotoFile;
