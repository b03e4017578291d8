//! MIME type <-> file extension mapping for images and common media

use std::path::Path;

/// Used when an input image's type can't be told from its extension
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// (mime type, preferred extension, other extensions)
const TYPES: &[(&str, &str, &[&str])] = &[
    ("image/png", ".png", &[]),
    ("image/jpeg", ".jpg", &[".jpeg", ".jpe"]),
    ("image/gif", ".gif", &[]),
    ("image/webp", ".webp", &[]),
    ("image/bmp", ".bmp", &[]),
    ("image/tiff", ".tiff", &[".tif"]),
    ("image/svg+xml", ".svg", &[]),
    ("image/x-icon", ".ico", &[]),
    ("image/heic", ".heic", &[]),
    ("image/heif", ".heif", &[]),
    ("image/avif", ".avif", &[]),
    ("audio/wav", ".wav", &[]),
    ("audio/mpeg", ".mp3", &[]),
    ("video/mp4", ".mp4", &[]),
    ("application/pdf", ".pdf", &[]),
    ("application/json", ".json", &[]),
    ("text/plain", ".txt", &[]),
];

/// Aliases some services send instead of the registered type
const ALIASES: &[(&str, &str)] = &[
    ("image/jpg", "image/jpeg"),
    ("image/x-ms-bmp", "image/bmp"),
    ("image/x-png", "image/png"),
    ("audio/x-wav", "audio/wav"),
];

/// Extension (with leading dot) for a declared MIME type, if known
///
/// Parameters such as `; charset=utf-8` are ignored and matching is
/// case-insensitive.
pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence.is_empty() {
        return None;
    }

    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == essence)
        .map(|(_, target)| *target)
        .unwrap_or(essence.as_str());

    TYPES
        .iter()
        .find(|(mime, _, _)| *mime == canonical)
        .map(|(_, ext, _)| *ext)
}

/// MIME type guessed from a path's extension
pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    let extension = format!(".{}", extension.trim_start_matches('.').to_ascii_lowercase());
    TYPES
        .iter()
        .find(|(_, ext, others)| *ext == extension || others.contains(&extension.as_str()))
        .map(|(mime, _, _)| *mime)
}

/// MIME type for an input image, falling back to [`DEFAULT_IMAGE_MIME`]
pub fn mime_type_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_type_for_extension)
        .unwrap_or(DEFAULT_IMAGE_MIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_common_image_types() {
        assert_eq!(extension_for_mime("image/png"), Some(".png"));
        assert_eq!(extension_for_mime("image/jpeg"), Some(".jpg"));
        assert_eq!(extension_for_mime("image/webp"), Some(".webp"));
    }

    #[test]
    fn test_extension_ignores_case_and_parameters() {
        assert_eq!(extension_for_mime("IMAGE/PNG"), Some(".png"));
        assert_eq!(extension_for_mime("image/jpeg; q=0.9"), Some(".jpg"));
        assert_eq!(extension_for_mime("image/jpg"), Some(".jpg"));
    }

    #[test]
    fn test_unknown_mime_has_no_extension() {
        assert_eq!(extension_for_mime("application/x-robogen-unknown"), None);
        assert_eq!(extension_for_mime(""), None);
    }

    #[test]
    fn test_mime_type_for_path() {
        assert_eq!(mime_type_for_path(Path::new("a/b/sketch.PNG")), "image/png");
        assert_eq!(mime_type_for_path(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(mime_type_for_path(Path::new("scan.bmp")), "image/bmp");
        assert_eq!(mime_type_for_path(Path::new("noext")), DEFAULT_IMAGE_MIME);
        assert_eq!(mime_type_for_path(Path::new("weird.xyz")), DEFAULT_IMAGE_MIME);
    }
}
