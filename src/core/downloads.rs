use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::models::{PendingDownload, RunReport};

pub const COMBINED_ARCHIVE_NAME: &str = "all_photos_combined.zip";

#[derive(Debug)]
pub enum DownloadError {
    Io(io::Error),
    Archive(zip::result::ZipError),
    NothingToCombine,
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Archive(err) => write!(f, "archive error: {err}"),
            Self::NothingToCombine => write!(f, "no archives to combine"),
        }
    }
}

impl std::error::Error for DownloadError {}

impl From<io::Error> for DownloadError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<zip::result::ZipError> for DownloadError {
    fn from(value: zip::result::ZipError) -> Self {
        Self::Archive(value)
    }
}

/// Where finished archives go. Returning `Ok` acknowledges the delivery.
pub trait DownloadSink {
    fn deliver(&mut self, download: &PendingDownload) -> Result<PathBuf, DownloadError>;
}

/// Saves archives into a directory, never overwriting an existing file.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn target_for(&self, file_name: &str) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }

        let path = Path::new(file_name);
        let stem = path
            .file_stem()
            .map(|value| value.to_string_lossy().to_string())
            .unwrap_or_else(|| String::from("download"));
        let ext = path
            .extension()
            .map(|value| value.to_string_lossy().to_string())
            .unwrap_or_default();

        (1..)
            .map(|index| {
                let name = if ext.is_empty() {
                    format!("{stem} ({index})")
                } else {
                    format!("{stem} ({index}).{ext}")
                };
                self.dir.join(name)
            })
            .find(|candidate| !candidate.exists())
            .unwrap_or(candidate)
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, download: &PendingDownload) -> Result<PathBuf, DownloadError> {
        fs::create_dir_all(&self.dir)?;
        let target = self.target_for(&download.file_name);
        fs::write(&target, &download.bytes)?;
        Ok(target)
    }
}

#[derive(Debug)]
pub struct Delivery {
    pub file_name: String,
    pub result: Result<PathBuf, DownloadError>,
}

/// Archives waiting to be saved, handed to the sink strictly one at a time.
#[derive(Debug, Default)]
pub struct DownloadQueue {
    pending: VecDeque<PendingDownload>,
}

impl DownloadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_report(report: &RunReport) -> Self {
        let mut queue = Self::new();
        for archive in &report.archives {
            queue.push(archive.download.clone());
        }
        queue
    }

    pub fn push(&mut self, download: PendingDownload) {
        self.pending.push_back(download);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_names(&self) -> Vec<&str> {
        self.pending
            .iter()
            .map(|download| download.file_name.as_str())
            .collect()
    }

    /// Drains the queue. The next archive only starts after the sink has
    /// answered for the previous one; a failed delivery does not stop the rest.
    pub fn process(&mut self, sink: &mut dyn DownloadSink) -> Vec<Delivery> {
        let mut deliveries = Vec::with_capacity(self.pending.len());

        while let Some(download) = self.pending.pop_front() {
            let result = sink.deliver(&download);
            match &result {
                Ok(path) => log::info!("saved {}", path.display()),
                Err(err) => log::warn!("could not save {}: {err}", download.file_name),
            }
            deliveries.push(Delivery {
                file_name: download.file_name,
                result,
            });
        }

        deliveries
    }
}

/// Merges the file entries of several archives into one. Directory entries
/// are skipped; a name seen in an earlier archive keeps its first copy.
pub fn combine_archives(archives: &[PendingDownload]) -> Result<PendingDownload, DownloadError> {
    if archives.is_empty() {
        return Err(DownloadError::NothingToCombine);
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut seen = HashSet::new();

    for archive in archives {
        let mut source = ZipArchive::new(Cursor::new(archive.bytes.as_slice()))?;

        for index in 0..source.len() {
            let mut entry = source.by_index(index)?;
            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            if !seen.insert(name.clone()) {
                log::warn!("duplicate entry {name} in {}, keeping first", archive.file_name);
                continue;
            }

            writer.start_file(name, options)?;
            io::copy(&mut entry, &mut writer)?;
        }
    }

    let bytes = writer.finish()?.into_inner();
    Ok(PendingDownload::new(COMBINED_ARCHIVE_NAME, bytes))
}
