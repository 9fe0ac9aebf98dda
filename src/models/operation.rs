use serde::Serialize;

/// Status updates emitted by a batch run, in the order they happen.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    RunStarted {
        total_files: usize,
        total_bytes: u64,
        locations: usize,
        batches: usize,
    },
    BatchStarted {
        current: usize,
        total: usize,
        location: String,
        label: String,
        files: usize,
        bytes: u64,
    },
    BatchSucceeded {
        current: usize,
        total: usize,
        label: String,
        archive_bytes: u64,
    },
    BatchFailed {
        current: usize,
        total: usize,
        location: String,
        label: String,
        batch_index: usize,
        batch_count: usize,
        error: String,
    },
    RunFinished {
        outcome: RunOutcome,
        succeeded: usize,
        failed: usize,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    PartialFailure,
    TotalFailure,
}

impl RunOutcome {
    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (0, _) => Self::TotalFailure,
            (_, 0) => Self::Completed,
            _ => Self::PartialFailure,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::PartialFailure => "PartialFailure",
            Self::TotalFailure => "TotalFailure",
        }
    }
}

/// Archive returned by the server, waiting to be saved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingDownload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PendingDownload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn for_label(label: &str, bytes: Vec<u8>) -> Self {
        Self::new(format!("{label}_photos.zip"), bytes)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchArchive {
    pub location: String,
    pub label: String,
    pub batch_index: usize,
    pub download: PendingDownload,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchFailure {
    pub location: String,
    pub label: String,
    pub batch_index: usize,
    pub error: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunReport {
    pub archives: Vec<BatchArchive>,
    pub failures: Vec<BatchFailure>,
}

impl RunReport {
    pub fn outcome(&self) -> RunOutcome {
        RunOutcome::from_counts(self.archives.len(), self.failures.len())
    }

    pub fn attempted(&self) -> usize {
        self.archives.len() + self.failures.len()
    }

    pub fn archive_bytes(&self) -> u64 {
        self.archives
            .iter()
            .map(|archive| archive.download.bytes.len() as u64)
            .sum()
    }

    pub fn summary_message(&self) -> String {
        match self.archives.len() {
            0 => String::from("No locations were successfully processed."),
            1 => String::from("Photos processed successfully! Download started."),
            count => format!(
                "Processing complete! Downloading {count} separate ZIP files ({:.1} MB total)...",
                self.archive_bytes() as f64 / (1024.0 * 1024.0)
            ),
        }
    }
}
