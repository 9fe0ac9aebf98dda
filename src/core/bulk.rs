use std::sync::mpsc::Sender;

use crate::core::packing::plan_batches;
use crate::core::size::format_megabytes;
use crate::http::{ArchiveTransport, TransportError, UploadRequest};
use crate::models::{
    BatchArchive, BatchFailure, BatchFolderData, PendingDownload, ProgressEvent, RunReport,
    UploadBatch,
};

pub const LOCATION_FIELD: &str = "locations[]";
pub const BATCH_PHOTO_FIELD: &str = "photos_0";
pub const SEQUENCE_FIELD: &str = "sequence_numbers";

/// Uploads a folder's batches one request at a time.
pub struct BatchUploader<'a, T: ArchiveTransport + ?Sized> {
    transport: &'a T,
    batch_cap: u64,
}

impl<'a, T: ArchiveTransport + ?Sized> BatchUploader<'a, T> {
    pub fn new(transport: &'a T, batch_cap: u64) -> Self {
        Self {
            transport,
            batch_cap,
        }
    }

    pub fn plan(&self, data: &BatchFolderData) -> Vec<UploadBatch> {
        plan_batches(data, self.batch_cap)
    }

    pub fn run(&self, data: &BatchFolderData, progress_tx: Sender<ProgressEvent>) -> RunReport {
        let batches = self.plan(data);

        let _ = progress_tx.send(ProgressEvent::RunStarted {
            total_files: data.file_count(),
            total_bytes: data.total_bytes(),
            locations: data.location_count(),
            batches: batches.len(),
        });
        log::info!(
            "starting upload of {} photo(s) ({}) in {} request(s)",
            data.file_count(),
            format_megabytes(data.total_bytes()),
            batches.len()
        );

        self.run_batches(&batches, progress_tx)
    }

    /// Failed batches are recorded and the remaining ones still run.
    pub fn run_batches(
        &self,
        batches: &[UploadBatch],
        progress_tx: Sender<ProgressEvent>,
    ) -> RunReport {
        let total = batches.len();
        let mut archives = Vec::new();
        let mut failures = Vec::new();

        for (index, batch) in batches.iter().enumerate() {
            let current = index + 1;

            let _ = progress_tx.send(ProgressEvent::BatchStarted {
                current,
                total,
                location: batch.location.clone(),
                label: batch.label.clone(),
                files: batch.photos.len(),
                bytes: batch.total_bytes(),
            });
            log::info!(
                "processing \"{}\"{} ({} photos, {})",
                batch.location,
                batch.batch_info(),
                batch.photos.len(),
                format_megabytes(batch.total_bytes())
            );

            match self.upload(batch) {
                Ok(bytes) => {
                    let _ = progress_tx.send(ProgressEvent::BatchSucceeded {
                        current,
                        total,
                        label: batch.label.clone(),
                        archive_bytes: bytes.len() as u64,
                    });
                    archives.push(BatchArchive {
                        location: batch.location.clone(),
                        label: batch.label.clone(),
                        batch_index: batch.batch_index,
                        download: PendingDownload::for_label(&batch.label, bytes),
                    });
                }
                Err(err) => {
                    log::error!(
                        "error processing \"{}\"{}: {err}",
                        batch.location,
                        batch.batch_info()
                    );
                    let _ = progress_tx.send(ProgressEvent::BatchFailed {
                        current,
                        total,
                        location: batch.location.clone(),
                        label: batch.label.clone(),
                        batch_index: batch.batch_index,
                        batch_count: batch.batch_count,
                        error: err.to_string(),
                    });
                    failures.push(BatchFailure {
                        location: batch.location.clone(),
                        label: batch.label.clone(),
                        batch_index: batch.batch_index,
                        error: err.to_string(),
                    });
                }
            }
        }

        let report = RunReport { archives, failures };
        let _ = progress_tx.send(ProgressEvent::RunFinished {
            outcome: report.outcome(),
            succeeded: report.archives.len(),
            failed: report.failures.len(),
        });
        log::info!("{}", report.summary_message());

        report
    }

    fn upload(&self, batch: &UploadBatch) -> Result<Vec<u8>, TransportError> {
        let request = batch_request(batch)?;
        let response = self.transport.post_archive(&request)?;
        Ok(response.bytes)
    }
}

/// Multipart body for one batch: the batch label, its photos and their
/// sequence numbers as a JSON array in the same order.
pub fn batch_request(batch: &UploadBatch) -> Result<UploadRequest, TransportError> {
    let sequence = serde_json::to_string(&batch.sequence_numbers())
        .map_err(|err| TransportError::Setup(err.to_string()))?;

    let mut request = UploadRequest::new();
    request.text(LOCATION_FIELD, batch.label.clone());
    for file in batch.files() {
        request.file(BATCH_PHOTO_FIELD, file);
    }
    request.text(SEQUENCE_FIELD, sequence);

    Ok(request)
}
