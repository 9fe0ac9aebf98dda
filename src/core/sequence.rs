use std::collections::HashMap;

use crate::models::{BatchFolderData, PhotoWithMetadata};

/// Flattens every location, orders photos by modification time and numbers
/// them per location in that order.
pub fn sequence_photos(data: &BatchFolderData) -> Vec<PhotoWithMetadata> {
    let mut photos = data
        .iter()
        .flat_map(|(location, files)| {
            files.iter().map(move |file| PhotoWithMetadata {
                file: file.clone(),
                location: location.to_string(),
                date_time: file.modified,
                sequence_number: 0,
            })
        })
        .collect::<Vec<_>>();

    photos.sort_by_key(|photo| photo.date_time);

    let mut counters: HashMap<String, u32> = HashMap::new();
    for photo in &mut photos {
        let counter = counters.entry(photo.location.clone()).or_insert(0);
        *counter += 1;
        photo.sequence_number = *counter;
    }

    photos
}

/// The chronologically ordered photos of one location.
pub fn photos_for_location<'a>(
    sequenced: &'a [PhotoWithMetadata],
    location: &'a str,
) -> impl Iterator<Item = &'a PhotoWithMetadata> + 'a {
    sequenced
        .iter()
        .filter(move |photo| photo.location == location)
}
