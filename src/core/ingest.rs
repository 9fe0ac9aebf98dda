use std::fmt;
use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::core::formats;
use crate::models::{BatchFolderData, PhotoFile, ROOT_LOCATION};

pub const DEFAULT_MAX_DEPTH: usize = 32;

#[derive(Debug)]
pub enum IngestError {
    NotFound(PathBuf),
    Walk(walkdir::Error),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "folder not found: {}", path.display()),
            Self::Walk(err) => write!(f, "folder walk failed: {err}"),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<walkdir::Error> for IngestError {
    fn from(value: walkdir::Error) -> Self {
        Self::Walk(value)
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Turns a folder tree into location groups keyed by first-level subfolder.
#[derive(Clone, Copy, Debug)]
pub struct FolderIngestor {
    max_depth: usize,
}

impl Default for FolderIngestor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl FolderIngestor {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    /// Walks every dropped directory to completion. Dropped plain files are ignored.
    pub fn ingest_dropped<I, P>(&self, entries: I) -> Result<BatchFolderData>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut candidates = Vec::new();

        for entry in entries {
            let root = entry.as_ref();

            if !root.exists() {
                return Err(IngestError::NotFound(root.to_path_buf()));
            }

            if !root.is_dir() {
                log::debug!("ignoring dropped file {}", root.display());
                continue;
            }

            candidates.extend(self.walk_root(root)?);
        }

        let stats = candidates
            .par_iter()
            .map(|(location, path)| match PhotoFile::from_path(path) {
                Ok(file) => Some((location.clone(), file)),
                Err(err) => {
                    log::warn!("skipping {}: {err}", path.display());
                    None
                }
            })
            .collect::<Vec<_>>();

        let mut data = BatchFolderData::new();
        for (location, file) in stats.into_iter().flatten() {
            if file.is_image() {
                data.insert(location, file);
            }
        }

        log::info!(
            "ingested {} photo(s) across {} location(s)",
            data.file_count(),
            data.location_count()
        );
        Ok(data)
    }

    /// Groups a folder-picker listing of `root/Location/.../name` paths.
    pub fn ingest_relative<I, S>(&self, entries: I) -> BatchFolderData
    where
        I: IntoIterator<Item = (S, PhotoFile)>,
        S: AsRef<str>,
    {
        let mut data = BatchFolderData::new();

        for (relative, file) in entries {
            if !file.is_image() {
                continue;
            }

            let relative = relative.as_ref();
            if relative.split('/').filter(|part| !part.is_empty()).count() > self.max_depth + 1 {
                log::warn!("skipping {relative}: nested deeper than {}", self.max_depth);
                continue;
            }

            match location_for_relative_path(relative) {
                Some(location) => data.insert(location, file),
                None => log::debug!("skipping {relative}: no root folder in path"),
            }
        }

        data
    }

    fn walk_root(&self, root: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut found = Vec::new();

        // One level past the limit so cut-off entries can be reported.
        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(self.max_depth + 1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(err.into()),
                Err(err) => {
                    log::warn!("unreadable entry under {}: {err}", root.display());
                    continue;
                }
            };

            if entry.depth() > self.max_depth {
                log::warn!(
                    "skipping {}: nested deeper than {}",
                    entry.path().display(),
                    self.max_depth
                );
                continue;
            }

            if !entry.file_type().is_file() || !formats::is_image(entry.path()) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };

            found.push((location_below_root(relative), entry.path().to_path_buf()));
        }

        log::debug!("{} image candidate(s) under {}", found.len(), root.display());
        Ok(found)
    }
}

/// `SiteA/x/a.jpg` is in `SiteA`; `a.jpg` is in `Root`.
fn location_below_root(relative: &Path) -> String {
    let parts = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>();

    if parts.len() > 1 {
        parts[0].clone()
    } else {
        String::from(ROOT_LOCATION)
    }
}

/// Location for a `/`-separated path that still includes the picked root folder.
pub fn location_for_relative_path(relative: &str) -> Option<String> {
    let parts = relative
        .split('/')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();

    match parts.len() {
        0 | 1 => None,
        2 => Some(String::from(ROOT_LOCATION)),
        _ => Some(parts[1].to_string()),
    }
}
