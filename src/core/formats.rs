use std::path::Path;

/// Extensions the manual upload form accepts.
pub const FORM_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];

pub fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

pub fn is_image(path: &Path) -> bool {
    is_image_mime(&guess_mime(path))
}

pub fn is_form_accepted(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|value| value.to_str()) else {
        return false;
    };

    let ext = ext.to_ascii_lowercase();
    FORM_EXTENSIONS.contains(&ext.as_str())
}

pub fn form_extensions() -> &'static [&'static str] {
    FORM_EXTENSIONS
}
