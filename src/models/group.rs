use crate::models::PhotoFile;

pub type GroupId = u64;

/// One location card: a name plus the photos selected for it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PhotoGroup {
    pub id: GroupId,
    pub location_name: String,
    pub files: Vec<PhotoFile>,
}

impl PhotoGroup {
    pub fn new(id: GroupId) -> Self {
        Self {
            id,
            location_name: String::new(),
            files: Vec::new(),
        }
    }

    pub fn title(&self) -> String {
        format!("Photo Group {}", self.id + 1)
    }

    pub fn trimmed_name(&self) -> &str {
        self.location_name.trim()
    }

    /// A group only counts towards submission with both a name and files.
    pub fn is_submittable(&self) -> bool {
        !self.trimmed_name().is_empty() && !self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|file| file.size).sum()
    }
}
