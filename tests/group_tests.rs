use std::cell::RefCell;

use chrono::{TimeZone, Utc};

use photo_renamer::app::{sanitize_location, AlertKind, AppError, AppState, RunPhase};
use photo_renamer::core::size::LimitPolicy;
use photo_renamer::http::{ArchiveResponse, ArchiveTransport, TransportError, UploadRequest};
use photo_renamer::models::PhotoFile;

fn photo(name: &str, size: u64) -> PhotoFile {
    let modified = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    PhotoFile::new(format!("/photos/{name}"), size, modified)
}

struct RecordingTransport {
    requests: RefCell<Vec<UploadRequest>>,
    file_name: Option<String>,
}

impl ArchiveTransport for RecordingTransport {
    fn post_archive(&self, request: &UploadRequest) -> Result<ArchiveResponse, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        Ok(ArchiveResponse {
            bytes: b"zip-bytes".to_vec(),
            file_name: self.file_name.clone(),
        })
    }
}

fn assert_remove_controls(state: &AppState) {
    assert!(!state.groups.is_empty());
    for group in &state.groups {
        assert_eq!(
            state.remove_control_visible(group.id),
            state.groups.len() > 1
        );
    }
}

#[test]
fn starts_with_one_group_and_hidden_remove_control() {
    let state = AppState::default();

    assert_eq!(state.groups.len(), 1);
    assert_eq!(state.groups[0].id, 0);
    assert_eq!(state.groups[0].title(), "Photo Group 1");
    assert!(!state.remove_control_visible(0));
}

#[test]
fn last_group_cannot_be_removed() {
    let mut state = AppState::default();
    let added = state.add_group();
    assert_eq!(added, 1);
    assert!(state.remove_control_visible(0));
    assert!(state.remove_control_visible(added));

    state.remove_group(0).expect("removing one of two groups should work");
    assert_eq!(state.groups.len(), 1);
    assert!(!state.remove_control_visible(added));

    let err = state.remove_group(added).expect_err("last group must stay");
    assert!(matches!(err, AppError::LastGroup));
    assert_eq!(state.groups.len(), 1);

    let err = state.remove_group(42).expect_err("unknown id");
    assert!(matches!(err, AppError::GroupNotFound(42)));
}

#[test]
fn add_remove_sequences_keep_at_least_one_group() {
    let mut state = AppState::default();
    let script = [
        "add", "add", "remove-first", "remove-first", "remove-first", "add", "remove-last",
        "remove-last", "add", "add", "add", "remove-first", "remove-last", "remove-first",
        "remove-first",
    ];

    for step in script {
        match step {
            "add" => {
                state.add_group();
            }
            "remove-first" => {
                let id = state.groups[0].id;
                let _ = state.remove_group(id);
            }
            _ => {
                let id = state.groups[state.groups.len() - 1].id;
                let _ = state.remove_group(id);
            }
        }
        assert_remove_controls(&state);
    }

    let ids = state.groups.iter().map(|group| group.id).collect::<Vec<_>>();
    let mut deduped = ids.clone();
    deduped.dedup();
    assert_eq!(ids, deduped);
}

#[test]
fn sanitize_strips_disallowed_characters_and_is_idempotent() {
    let samples = [
        "Site A",
        "Wedding Photos 2024!",
        "café/<script>",
        "north-field_03",
        "tab\there",
        "",
        "***",
    ];

    for sample in samples {
        let once = sanitize_location(sample);
        assert_eq!(sanitize_location(&once), once);
        assert!(once
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '-' | '_')));
    }

    assert_eq!(sanitize_location("Wedding Photos 2024!"), "Wedding Photos 2024");
    assert_eq!(sanitize_location("café/<script>"), "cafscript");
    assert_eq!(sanitize_location("tab\there"), "tabhere");
}

#[test]
fn location_input_is_sanitized_on_every_change() {
    let mut state = AppState::default();

    let stored = state
        .set_location_name(0, "Site #1 (north)")
        .expect("group 0 exists")
        .to_string();

    assert_eq!(stored, "Site 1 north");
    assert_eq!(state.groups[0].location_name, "Site 1 north");
}

#[test]
fn validation_requires_a_named_group_with_files() {
    let mut state = AppState::default();
    state.set_location_name(0, "   ").expect("group exists");
    state
        .set_files(0, vec![photo("a.jpg", 10)])
        .expect("group exists");

    let err = state.validate().expect_err("blank name is not enough");
    assert!(matches!(err, AppError::NoValidGroup));
    let alert = state.alert.clone().expect("validation shows an alert");
    assert_eq!(alert.kind, AlertKind::Danger);
    assert_eq!(alert.message, "Please add at least one location with photos.");
    assert_eq!(alert.kind.auto_dismiss(), None);

    state.dismiss_alert();
    assert!(state.alert.is_none());

    let second = state.add_group();
    state.set_location_name(second, "Site B").expect("group exists");
    assert!(state.validate().is_err());

    state
        .set_files(second, vec![photo("b.jpg", 20)])
        .expect("group exists");
    state.validate().expect("named group with files is valid");
}

#[test]
fn form_fields_are_numbered_by_submitted_position() {
    let mut state = AppState::default();
    let first = state.add_group();
    let second = state.add_group();

    state.set_location_name(first, "Site A").expect("group exists");
    state
        .set_files(first, vec![photo("a1.jpg", 100), photo("a2.jpg", 200)])
        .expect("group exists");
    state.set_location_name(second, " Site B ").expect("group exists");
    state
        .set_files(second, vec![photo("b1.jpg", 300)])
        .expect("group exists");
    state.remove_group(0).expect("three groups exist");

    let request = state.form_request().expect("form should be valid");

    assert_eq!(request.text_values("locations[]"), vec!["Site A", "Site B"]);
    let photos_0 = request
        .files("photos_0")
        .iter()
        .map(|file| file.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(photos_0, vec!["a1.jpg", "a2.jpg"]);
    assert_eq!(request.files("photos_1").len(), 1);
    assert!(request.files("photos_2").is_empty());
}

#[test]
fn selection_replaces_previous_files() {
    let mut state = AppState::default();
    state
        .set_files(0, vec![photo("a.jpg", 1), photo("b.jpg", 2)])
        .expect("group exists");
    state
        .set_files(0, vec![photo("c.jpg", 3)])
        .expect("group exists");

    let listing = state.file_listing(0).expect("group exists");
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name, "c.jpg");
    assert_eq!(listing[0].size, "3 Bytes");
}

#[test]
fn enforced_limit_blocks_oversized_submission() {
    let mut state = AppState::default();
    state.display_limit = 1000;
    state.limit_policy = LimitPolicy::Enforce;
    state.set_location_name(0, "Site A").expect("group exists");
    state
        .set_files(0, vec![photo("big.jpg", 1500)])
        .expect("group exists");

    let err = state.form_request().expect_err("over the limit");
    assert!(matches!(
        err,
        AppError::TotalSizeExceeded {
            total: 1500,
            limit: 1000
        }
    ));
    assert_eq!(
        state.alert.as_ref().map(|alert| alert.kind),
        Some(AlertKind::Danger)
    );
}

#[test]
fn warn_limit_lets_oversized_submission_through() {
    let mut state = AppState::default();
    state.display_limit = 1000;
    state.limit_policy = LimitPolicy::Warn;
    state.set_location_name(0, "Site A").expect("group exists");
    state
        .set_files(0, vec![photo("big.jpg", 1500)])
        .expect("group exists");

    let gauge = state.size_gauge();
    assert!(gauge.exceeds_limit());
    assert!((gauge.percentage() - 150.0).abs() < 1e-9);

    state.form_request().expect("warn policy only warns");
    assert_eq!(
        state.alert.as_ref().map(|alert| alert.kind),
        Some(AlertKind::Warning)
    );
}

#[test]
fn submit_form_names_the_download() {
    let mut state = AppState::default();
    state.set_location_name(0, "Site A").expect("group exists");
    state
        .set_files(0, vec![photo("a.jpg", 10)])
        .expect("group exists");

    let transport = RecordingTransport {
        requests: RefCell::new(Vec::new()),
        file_name: None,
    };
    let download = state.submit_form(&transport).expect("upload succeeds");
    assert_eq!(download.file_name, "Site A_photos.zip");
    assert_eq!(download.bytes, b"zip-bytes".to_vec());
    assert_eq!(transport.requests.borrow().len(), 1);

    let second = state.add_group();
    state.set_location_name(second, "Site B").expect("group exists");
    state
        .set_files(second, vec![photo("b.jpg", 10)])
        .expect("group exists");
    let download = state.submit_form(&transport).expect("upload succeeds");
    assert_eq!(download.file_name, "multi_location_photos.zip");

    let named = RecordingTransport {
        requests: RefCell::new(Vec::new()),
        file_name: Some(String::from("server_name.zip")),
    };
    let download = state.submit_form(&named).expect("upload succeeds");
    assert_eq!(download.file_name, "server_name.zip");
}

#[test]
fn reset_returns_to_a_fresh_form() {
    let mut state = AppState::default();
    state.limit_policy = LimitPolicy::Enforce;
    state.add_group();
    state.set_location_name(0, "Site A").expect("group exists");
    state.show_alert(AlertKind::Warning, "something");
    state.phase = RunPhase::Completed;

    state.reset();

    assert_eq!(state.groups.len(), 1);
    assert!(state.groups[0].location_name.is_empty());
    assert!(state.alert.is_none());
    assert!(state.batch.is_none());
    assert_eq!(state.phase, RunPhase::Idle);
    assert_eq!(state.limit_policy, LimitPolicy::Enforce);
    assert_eq!(state.add_group(), 1);
}
