//! Content-type lookup for produced artifacts.

/// Map a filename to a content type by extension.
///
/// The table is deliberately small; anything unknown is served as an opaque
/// octet stream.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(content_type_for("clip_720p.mp4"), "video/mp4");
        assert_eq!(content_type_for("thumb.JPG"), "image/jpeg");
        assert_eq!(content_type_for("manifest.json"), "application/json");
    }

    #[test]
    fn test_unknown_defaults_to_octet_stream() {
        assert_eq!(content_type_for("archive.tar.zst"), "application/octet-stream");
        assert_eq!(content_type_for("no_extension"), "application/octet-stream");
    }
}
