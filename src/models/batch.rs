use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::core::size::format_file_size;
use crate::models::PhotoFile;

/// Location used for images that sit directly under the ingested root.
pub const ROOT_LOCATION: &str = "Root";

/// Location name to photos, as discovered by one ingestion pass.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BatchFolderData {
    locations: BTreeMap<String, Vec<PhotoFile>>,
}

impl BatchFolderData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: impl Into<String>, file: PhotoFile) {
        self.locations.entry(location.into()).or_default().push(file);
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    pub fn file_count(&self) -> usize {
        self.locations.values().map(Vec::len).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.locations
            .values()
            .flat_map(|files| files.iter())
            .map(|file| file.size)
            .sum()
    }

    pub fn get(&self, location: &str) -> Option<&[PhotoFile]> {
        self.locations.get(location).map(Vec::as_slice)
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PhotoFile])> {
        self.locations
            .iter()
            .map(|(location, files)| (location.as_str(), files.as_slice()))
    }

    pub fn summaries(&self) -> Vec<LocationSummary> {
        self.iter()
            .map(|(location, files)| LocationSummary {
                location: location.to_string(),
                file_count: files.len(),
                total_bytes: files.iter().map(|file| file.size).sum(),
            })
            .collect()
    }
}

/// Preview card data for one detected location.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LocationSummary {
    pub location: String,
    pub file_count: usize,
    pub total_bytes: u64,
}

impl LocationSummary {
    pub fn photo_label(&self) -> String {
        if self.file_count == 1 {
            String::from("1 photo")
        } else {
            format!("{} photos", self.file_count)
        }
    }

    pub fn size_label(&self) -> String {
        format!("Total size: {}", format_file_size(self.total_bytes))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PhotoWithMetadata {
    pub file: PhotoFile,
    pub location: String,
    pub date_time: DateTime<Utc>,
    /// 1-based, counted per location in chronological order.
    pub sequence_number: u32,
}

/// Photos of a single location that travel in one request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadBatch {
    pub location: String,
    pub label: String,
    pub batch_index: usize,
    pub batch_count: usize,
    pub photos: Vec<PhotoWithMetadata>,
}

impl UploadBatch {
    pub fn new(
        location: impl Into<String>,
        batch_index: usize,
        batch_count: usize,
        photos: Vec<PhotoWithMetadata>,
    ) -> Self {
        let location = location.into();
        let label = if batch_count > 1 {
            format!("{location}_batch{}", batch_index + 1)
        } else {
            location.clone()
        };

        Self {
            location,
            label,
            batch_index,
            batch_count,
            photos,
        }
    }

    pub fn is_split(&self) -> bool {
        self.batch_count > 1
    }

    pub fn files(&self) -> impl Iterator<Item = &PhotoFile> {
        self.photos.iter().map(|photo| &photo.file)
    }

    pub fn sequence_numbers(&self) -> Vec<u32> {
        self.photos
            .iter()
            .map(|photo| photo.sequence_number)
            .collect()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files().map(|file| file.size).sum()
    }

    pub fn batch_info(&self) -> String {
        batch_info(self.batch_index, self.batch_count)
    }
}

/// `" (batch 2/3)"` for split locations, empty otherwise.
pub fn batch_info(batch_index: usize, batch_count: usize) -> String {
    if batch_count > 1 {
        format!(" (batch {}/{batch_count})", batch_index + 1)
    } else {
        String::new()
    }
}
