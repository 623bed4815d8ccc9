//! MIME type detection module
//!
//! Maps a resolved file location to its media type, and a media type to the
//! charset that should be advertised with it.

use std::path::Path;

/// Get the media type for a file extension (case-insensitive)
///
/// # Examples
/// ```
/// use static_send::http::mime::lookup_extension;
/// assert_eq!(lookup_extension("html"), Some("text/html"));
/// assert_eq!(lookup_extension("MP4"), Some("video/mp4"));
/// assert_eq!(lookup_extension("xyz"), None);
/// ```
pub fn lookup_extension(extension: &str) -> Option<&'static str> {
    let mime = match extension.to_ascii_lowercase().as_str() {
        // Text
        "html" | "htm" | "shtml" => "text/html",
        "css" => "text/css",
        "txt" | "text" | "conf" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "xml" => "application/xml",

        // JavaScript/WASM
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" | "svgz" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "avif" => "image/avif",

        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",

        // Audio
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",

        // Documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",
        "bin" => "application/octet-stream",

        _ => return None,
    };
    Some(mime)
}

/// Get the media type for a file location
pub fn lookup(path: &Path) -> Option<&'static str> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(lookup_extension)
}

/// Default charset for a media type, if one is known
pub fn charset(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or(mime).trim();
    if essence.starts_with("text/")
        || matches!(essence, "application/javascript" | "application/json")
    {
        Some("UTF-8")
    } else {
        None
    }
}

/// Full `Content-Type` value for a location, charset included when known
pub fn content_type(path: &Path) -> Option<String> {
    let mime = lookup(path)?;
    Some(match charset(mime) {
        Some(cs) => format!("{mime}; charset={cs}"),
        None => mime.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(lookup_extension("html"), Some("text/html"));
        assert_eq!(lookup_extension("css"), Some("text/css"));
        assert_eq!(lookup_extension("js"), Some("application/javascript"));
        assert_eq!(lookup_extension("png"), Some("image/png"));
        assert_eq!(lookup_extension("mp4"), Some("video/mp4"));
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(lookup_extension("xyz"), None);
        assert_eq!(lookup(Path::new("/srv/README")), None);
        assert_eq!(content_type(Path::new("/srv/.bashrc")), None);
    }

    #[test]
    fn test_content_type_with_charset() {
        assert_eq!(
            content_type(Path::new("/srv/index.html")).as_deref(),
            Some("text/html; charset=UTF-8")
        );
        assert_eq!(
            content_type(Path::new("/srv/data.json")).as_deref(),
            Some("application/json; charset=UTF-8")
        );
        assert_eq!(
            content_type(Path::new("/srv/logo.PNG")).as_deref(),
            Some("image/png")
        );
    }
}
