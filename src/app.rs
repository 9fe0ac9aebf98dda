use std::time::Duration;

use crate::config::{ClientConfig, DEFAULT_DISPLAY_LIMIT};
use crate::core::bulk::LOCATION_FIELD;
use crate::core::ingest::IngestError;
use crate::core::size::{self, FileListing, LimitPolicy, SizeGauge};
use crate::http::{ArchiveTransport, TransportError, UploadRequest};
use crate::models::{
    batch_info, BatchFolderData, GroupId, LocationSummary, PendingDownload, PhotoFile,
    PhotoGroup, ProgressEvent, RunOutcome,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UploadMode {
    Manual,
    Batch,
}

impl UploadMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Manual => "Manual Upload",
            Self::Batch => "Batch Folder Upload",
        }
    }
}

/// Lifecycle of one batch submission.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunPhase {
    Idle,
    Ingesting,
    Previewed,
    Uploading { current: usize, total: usize },
    Completed,
    PartialFailure,
    TotalFailure,
}

impl RunPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Ingesting => "Ingesting",
            Self::Previewed => "Previewed",
            Self::Uploading { .. } => "Uploading",
            Self::Completed => "Completed",
            Self::PartialFailure => "PartialFailure",
            Self::TotalFailure => "TotalFailure",
        }
    }

    pub fn is_uploading(self) -> bool {
        matches!(self, Self::Uploading { .. })
    }
}

impl From<RunOutcome> for RunPhase {
    fn from(value: RunOutcome) -> Self {
        match value {
            RunOutcome::Completed => Self::Completed,
            RunOutcome::PartialFailure => Self::PartialFailure,
            RunOutcome::TotalFailure => Self::TotalFailure,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlertKind {
    Danger,
    Warning,
    Success,
}

impl AlertKind {
    /// Errors stay until dismissed.
    pub fn auto_dismiss(self) -> Option<Duration> {
        match self {
            Self::Danger => None,
            Self::Warning | Self::Success => Some(Duration::from_secs(5)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

#[derive(Debug)]
pub enum AppError {
    GroupNotFound(GroupId),
    LastGroup,
    NoValidGroup,
    NoFoldersDetected,
    UploadInProgress,
    TotalSizeExceeded { total: u64, limit: u64 },
    Transport(TransportError),
    Ingest(IngestError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GroupNotFound(id) => write!(f, "photo group not found: {id}"),
            Self::LastGroup => write!(f, "the last photo group cannot be removed"),
            Self::NoValidGroup => write!(f, "no group has both a location name and photos"),
            Self::NoFoldersDetected => write!(f, "no folders detected"),
            Self::UploadInProgress => write!(f, "an upload is already running"),
            Self::TotalSizeExceeded { total, limit } => write!(
                f,
                "selection of {total} bytes exceeds the {limit} byte limit"
            ),
            Self::Transport(err) => write!(f, "upload failed: {err}"),
            Self::Ingest(err) => write!(f, "folder ingest failed: {err}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<TransportError> for AppError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

impl From<IngestError> for AppError {
    fn from(value: IngestError) -> Self {
        Self::Ingest(value)
    }
}

impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            Self::NoValidGroup => String::from("Please add at least one location with photos."),
            Self::NoFoldersDetected => String::from("No folders detected. Please try again."),
            Self::TotalSizeExceeded { limit, .. } => format!(
                "Total upload size exceeds the {} limit. Please reduce the number of files.",
                size::format_file_size(*limit)
            ),
            other => other.to_string(),
        }
    }
}

/// Strips everything outside letters, digits, space, hyphen and underscore.
pub fn sanitize_location(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '-' | '_'))
        .collect()
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub groups: Vec<PhotoGroup>,
    pub mode: UploadMode,
    pub phase: RunPhase,
    pub alert: Option<Alert>,
    pub batch: Option<BatchFolderData>,
    pub display_limit: u64,
    pub limit_policy: LimitPolicy,
    next_group_id: GroupId,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            groups: vec![PhotoGroup::new(0)],
            mode: UploadMode::Manual,
            phase: RunPhase::Idle,
            alert: None,
            batch: None,
            display_limit: DEFAULT_DISPLAY_LIMIT,
            limit_policy: LimitPolicy::Warn,
            next_group_id: 1,
        }
    }
}

impl AppState {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            display_limit: config.display_limit_bytes,
            limit_policy: config.limit_policy,
            ..Self::default()
        }
    }

    pub fn add_group(&mut self) -> GroupId {
        let id = self.next_group_id;
        self.next_group_id += 1;
        self.groups.push(PhotoGroup::new(id));
        id
    }

    pub fn remove_group(&mut self, id: GroupId) -> Result<(), AppError> {
        let index = self.group_index(id)?;
        if self.groups.len() == 1 {
            return Err(AppError::LastGroup);
        }

        self.groups.remove(index);
        Ok(())
    }

    /// The remove control is hidden while only one group exists.
    pub fn remove_control_visible(&self, id: GroupId) -> bool {
        self.groups.len() > 1 && self.group(id).is_some()
    }

    pub fn group(&self, id: GroupId) -> Option<&PhotoGroup> {
        self.groups.iter().find(|group| group.id == id)
    }

    pub fn set_location_name(&mut self, id: GroupId, raw: &str) -> Result<&str, AppError> {
        let index = self.group_index(id)?;
        let group = &mut self.groups[index];
        group.location_name = sanitize_location(raw);
        Ok(group.location_name.as_str())
    }

    /// Replaces the group's selection, the way a file input change does.
    pub fn set_files(&mut self, id: GroupId, files: Vec<PhotoFile>) -> Result<(), AppError> {
        let index = self.group_index(id)?;
        self.groups[index].files = files;
        Ok(())
    }

    pub fn file_listing(&self, id: GroupId) -> Result<Vec<FileListing>, AppError> {
        let group = self.group(id).ok_or(AppError::GroupNotFound(id))?;
        Ok(size::file_listing(group))
    }

    pub fn size_gauge(&self) -> SizeGauge {
        SizeGauge::for_groups(&self.groups, self.display_limit)
    }

    pub fn submittable_groups(&self) -> Vec<&PhotoGroup> {
        self.groups
            .iter()
            .filter(|group| group.is_submittable())
            .collect()
    }

    pub fn validate(&mut self) -> Result<(), AppError> {
        if self.submittable_groups().is_empty() {
            return Err(self.fail(AppError::NoValidGroup));
        }
        Ok(())
    }

    /// Builds the single-form request. Fields are numbered by position among
    /// the submitted groups so `photos_<n>` pairs with the n-th location.
    pub fn form_request(&mut self) -> Result<UploadRequest, AppError> {
        self.validate()?;
        self.check_size_limit()?;

        let mut request = UploadRequest::new();
        for (index, group) in self.submittable_groups().into_iter().enumerate() {
            request.text(LOCATION_FIELD, group.trimmed_name());
            let field = format!("photos_{index}");
            for file in &group.files {
                request.file(field.as_str(), file);
            }
        }

        Ok(request)
    }

    pub fn submit_form(
        &mut self,
        transport: &dyn ArchiveTransport,
    ) -> Result<PendingDownload, AppError> {
        let request = self.form_request()?;
        let fallback = self.default_download_name();

        log::info!(
            "submitting {} location(s) with {} bytes of photos",
            request.text_values(LOCATION_FIELD).len(),
            request.total_file_bytes()
        );

        match transport.post_archive(&request) {
            Ok(response) => {
                let name = response.file_name.unwrap_or(fallback);
                self.show_alert(
                    AlertKind::Success,
                    "Photos processed successfully! Download started.",
                );
                Ok(PendingDownload::new(name, response.bytes))
            }
            Err(err) => Err(self.fail(AppError::Transport(err))),
        }
    }

    pub fn show_alert(&mut self, kind: AlertKind, message: impl Into<String>) {
        self.alert = Some(Alert {
            kind,
            message: message.into(),
        });
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn set_mode(&mut self, mode: UploadMode) {
        self.mode = mode;
    }

    /// Drops the previous preview; a new ingestion never merges with it.
    pub fn begin_ingest(&mut self) {
        self.mode = UploadMode::Batch;
        self.batch = None;
        self.phase = RunPhase::Ingesting;
    }

    pub fn finish_ingest(&mut self, data: BatchFolderData) -> Vec<LocationSummary> {
        let summaries = data.summaries();
        if data.is_empty() {
            self.batch = None;
            self.phase = RunPhase::Idle;
        } else {
            self.batch = Some(data);
            self.phase = RunPhase::Previewed;
        }
        summaries
    }

    pub fn fail_ingest(&mut self, err: IngestError) -> AppError {
        self.phase = RunPhase::Idle;
        self.fail(AppError::Ingest(err))
    }

    /// Hands the previewed folder to the uploader and enters `Uploading`.
    pub fn start_batch_upload(&mut self) -> Result<BatchFolderData, AppError> {
        if self.phase.is_uploading() {
            return Err(AppError::UploadInProgress);
        }

        let Some(data) = self.batch.clone().filter(|data| !data.is_empty()) else {
            return Err(self.fail(AppError::NoFoldersDetected));
        };

        self.phase = RunPhase::Uploading {
            current: 0,
            total: 0,
        };
        self.show_alert(
            AlertKind::Success,
            format!(
                "Starting chunked upload for {} photos ({})...",
                data.file_count(),
                size::format_megabytes(data.total_bytes())
            ),
        );
        Ok(data)
    }

    pub fn apply_progress(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::RunStarted { batches, .. } => {
                self.phase = RunPhase::Uploading {
                    current: 0,
                    total: *batches,
                };
            }
            ProgressEvent::BatchStarted { current, total, .. } => {
                self.phase = RunPhase::Uploading {
                    current: *current,
                    total: *total,
                };
            }
            ProgressEvent::BatchSucceeded { .. } => {}
            ProgressEvent::BatchFailed {
                location,
                batch_index,
                batch_count,
                error,
                ..
            } => {
                self.show_alert(
                    AlertKind::Warning,
                    format!(
                        "Error processing \"{location}\"{}: {error}",
                        batch_info(*batch_index, *batch_count)
                    ),
                );
            }
            ProgressEvent::RunFinished {
                outcome,
                succeeded,
                failed,
            } => {
                self.phase = RunPhase::from(*outcome);
                let (kind, message) = match outcome {
                    RunOutcome::Completed => (
                        AlertKind::Success,
                        format!("Processed {succeeded} batch(es)."),
                    ),
                    RunOutcome::PartialFailure => (
                        AlertKind::Warning,
                        format!("Processed {succeeded} batch(es), {failed} failed."),
                    ),
                    RunOutcome::TotalFailure => (
                        AlertKind::Danger,
                        String::from("No locations were successfully processed."),
                    ),
                };
                self.show_alert(kind, message);
            }
        }
    }

    /// Back to a fresh form, as when the page is restored from cache.
    pub fn reset(&mut self) {
        *self = Self {
            display_limit: self.display_limit,
            limit_policy: self.limit_policy,
            ..Self::default()
        };
    }

    fn check_size_limit(&mut self) -> Result<(), AppError> {
        let gauge = self.size_gauge();
        if !gauge.exceeds_limit() {
            return Ok(());
        }

        let err = AppError::TotalSizeExceeded {
            total: gauge.total_bytes,
            limit: gauge.limit_bytes,
        };

        match self.limit_policy {
            LimitPolicy::Enforce => Err(self.fail(err)),
            LimitPolicy::Warn => {
                log::warn!("{err}");
                self.show_alert(AlertKind::Warning, err.user_message());
                Ok(())
            }
        }
    }

    fn default_download_name(&self) -> String {
        match self.submittable_groups().as_slice() {
            [group] => format!("{}_photos.zip", group.trimmed_name()),
            _ => String::from("multi_location_photos.zip"),
        }
    }

    fn fail(&mut self, err: AppError) -> AppError {
        self.show_alert(AlertKind::Danger, err.user_message());
        err
    }

    fn group_index(&self, id: GroupId) -> Result<usize, AppError> {
        self.groups
            .iter()
            .position(|group| group.id == id)
            .ok_or(AppError::GroupNotFound(id))
    }
}
