use chrono::Utc;

use photo_renamer::core::size::{
    file_listing, format_file_size, format_megabytes, SizeGauge, GIB, KIB, MIB,
};
use photo_renamer::models::{PhotoFile, PhotoGroup};

#[test]
fn formats_sizes_in_binary_units() {
    assert_eq!(format_file_size(0), "0 Bytes");
    assert_eq!(format_file_size(1), "1 Bytes");
    assert_eq!(format_file_size(1023), "1023 Bytes");
    assert_eq!(format_file_size(1536), "1.5 KB");
    assert_eq!(format_file_size(1_048_576), "1 MB");
    assert_eq!(format_file_size(5 * MIB + 256 * KIB), "5.25 MB");
    assert_eq!(format_file_size(2 * GIB), "2 GB");
    assert_eq!(format_file_size(1234), "1.21 KB");
}

#[test]
fn sizes_past_gigabytes_stay_in_gigabytes() {
    assert_eq!(format_file_size(2048 * GIB), "2048 GB");
}

#[test]
fn gauge_totals_every_group_against_the_reference() {
    let now = Utc::now();
    let mut first = PhotoGroup::new(0);
    first.files = vec![
        PhotoFile::new("a.jpg", 512 * MIB, now),
        PhotoFile::new("b.jpg", 512 * MIB, now),
    ];
    let mut second = PhotoGroup::new(1);
    second.files = vec![PhotoFile::new("c.jpg", 1024 * MIB, now)];

    let gauge = SizeGauge::for_groups(&[first, second], 2 * GIB);

    assert_eq!(gauge.total_bytes, 2 * GIB);
    assert_eq!(gauge.total_label(), "2048.0 MB");
    assert!((gauge.percentage() - 100.0).abs() < 1e-9);
    assert!(!gauge.exceeds_limit());
}

#[test]
fn zero_limit_reports_zero_percent() {
    let gauge = SizeGauge::new(100, 0);
    assert_eq!(gauge.percentage(), 0.0);
    assert_eq!(format_megabytes(0), "0.0 MB");
}

#[test]
fn listing_shows_name_and_formatted_size() {
    let mut group = PhotoGroup::new(3);
    group.files = vec![PhotoFile::new("/tmp/shots/img_001.jpg", 1536, Utc::now())];

    let listing = file_listing(&group);

    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name, "img_001.jpg");
    assert_eq!(listing[0].size, "1.5 KB");
}
