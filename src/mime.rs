//! File extension to MIME type lookup for binary fields.
//!
//! Binary fields store the index of their MIME type in [`MIME_TYPES`] rather than the type
//! string. The table is append-only: ids are persisted in documents.

/// Id of `application/octet-stream`, used for unknown extensions.
pub const MIME_OCTET_STREAM: u32 = 0;

/// `(extension, mime type)` pairs. The position in the table is the id.
pub const MIME_TYPES: &[(&str, &str)] = &[
    ("bin", "application/octet-stream"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("xml", "application/xml"),
    ("js", "application/javascript"),
    ("wasm", "application/wasm"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("md", "text/markdown"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("ico", "image/vnd.microsoft.icon"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("flac", "audio/flac"),
    ("mp4", "video/mp4"),
    ("mpeg", "video/mpeg"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
    ("ttf", "font/ttf"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
];

/// Find the MIME id for a file extension, with or without its leading dot. Matching ignores
/// ASCII case. Unknown or empty extensions map to [`MIME_OCTET_STREAM`].
pub fn mime_id_for_ext(ext: &str) -> u32 {
    let ext = ext.trim_start_matches('.');
    MIME_TYPES
        .iter()
        .position(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map(|i| i as u32)
        .unwrap_or(MIME_OCTET_STREAM)
}

/// The MIME type string for an id. Ids from a newer table fall back to
/// `application/octet-stream`.
pub fn mime_by_id(id: u32) -> &'static str {
    MIME_TYPES
        .get(id as usize)
        .map(|(_, m)| *m)
        .unwrap_or(MIME_TYPES[MIME_OCTET_STREAM as usize].1)
}
