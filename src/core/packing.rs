use crate::core::sequence::{photos_for_location, sequence_photos};
use crate::core::size::MIB;
use crate::models::{BatchFolderData, PhotoWithMetadata, UploadBatch};

pub const DEFAULT_BATCH_CAP: u64 = 20 * MIB;

/// First-fit sequential packing: keeps input order and starts a new batch
/// whenever the next item would exceed `cap`. An item larger than `cap`
/// lands alone in its own batch.
pub fn pack_by_size<T>(items: Vec<T>, cap: u64, size_of: impl Fn(&T) -> u64) -> Vec<Vec<T>> {
    let mut batches = Vec::new();
    let mut current = Vec::new();
    let mut current_size = 0u64;

    for item in items {
        let size = size_of(&item);
        if !current.is_empty() && current_size.saturating_add(size) > cap {
            batches.push(std::mem::take(&mut current));
            current_size = 0;
        }
        current_size = current_size.saturating_add(size);
        current.push(item);
    }

    if !current.is_empty() {
        batches.push(current);
    }

    batches
}

/// Sequences the whole folder and splits each location into request batches.
pub fn plan_batches(data: &BatchFolderData, cap: u64) -> Vec<UploadBatch> {
    let sequenced = sequence_photos(data);
    let mut planned = Vec::new();

    for location in data.locations() {
        let photos = photos_for_location(&sequenced, location)
            .cloned()
            .collect::<Vec<PhotoWithMetadata>>();

        let groups = pack_by_size(photos, cap, |photo| photo.file.size);
        let count = groups.len();

        planned.extend(
            groups
                .into_iter()
                .enumerate()
                .map(|(index, photos)| UploadBatch::new(location, index, count, photos)),
        );
    }

    planned
}
