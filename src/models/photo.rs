use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::core::formats;

/// A selected file on disk, with the attributes the upload flow needs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PhotoFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub modified: DateTime<Utc>,
}

impl PhotoFile {
    pub fn from_path(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let meta = fs::metadata(&path)?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }

        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Ok(Self::new(path, meta.len(), DateTime::<Utc>::from(modified)))
    }

    pub fn new(path: impl Into<PathBuf>, size: u64, modified: DateTime<Utc>) -> Self {
        let path = path.into();
        let name = file_name(&path);
        let mime = formats::guess_mime(&path);

        Self {
            path,
            name,
            size,
            mime,
            modified,
        }
    }

    pub fn is_image(&self) -> bool {
        formats::is_image_mime(&self.mime)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|value| value.to_string_lossy().to_string())
        .unwrap_or_else(|| String::from("unknown"))
}
