use serde::Deserialize;

use crate::models::PhotoGroup;

pub const KIB: u64 = 1024;
pub const MIB: u64 = KIB * 1024;
pub const GIB: u64 = MIB * 1024;

const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];

/// Human readable size in binary units, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return String::from("0 Bytes");
    }

    let mut unit = 0;
    let mut scale = 1u64;
    while unit + 1 < UNITS.len() && bytes >= scale * KIB {
        scale *= KIB;
        unit += 1;
    }

    let value = format!("{:.2}", bytes as f64 / scale as f64);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{value} {}", UNITS[unit])
}

pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / MIB as f64)
}

/// What happens when the selection exceeds the display limit.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LimitPolicy {
    #[default]
    Warn,
    Enforce,
}

/// Running total of the selection against the reference limit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeGauge {
    pub total_bytes: u64,
    pub limit_bytes: u64,
}

impl SizeGauge {
    pub fn new(total_bytes: u64, limit_bytes: u64) -> Self {
        Self {
            total_bytes,
            limit_bytes,
        }
    }

    pub fn for_groups(groups: &[PhotoGroup], limit_bytes: u64) -> Self {
        let total = groups.iter().map(PhotoGroup::total_bytes).sum();
        Self::new(total, limit_bytes)
    }

    pub fn total_label(&self) -> String {
        format_megabytes(self.total_bytes)
    }

    /// Not clamped: an over-limit selection reports more than 100.
    pub fn percentage(&self) -> f64 {
        if self.limit_bytes == 0 {
            return 0.0;
        }
        self.total_bytes as f64 / self.limit_bytes as f64 * 100.0
    }

    pub fn exceeds_limit(&self) -> bool {
        self.total_bytes > self.limit_bytes
    }
}

/// One line of a group's file preview.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileListing {
    pub name: String,
    pub size: String,
}

pub fn file_listing(group: &PhotoGroup) -> Vec<FileListing> {
    group
        .files
        .iter()
        .map(|file| FileListing {
            name: file.name.clone(),
            size: format_file_size(file.size),
        })
        .collect()
}
