//! File name hygiene for uploads and generated artifacts

/// Maximum length of a sanitized file name, in bytes
pub const MAX_FILE_NAME_LEN: usize = 100;

/// Reduce an untrusted name to a single safe path component
///
/// Path separators and NUL bytes are dropped, anything other than ASCII
/// alphanumerics, `.`, `-` and `_` becomes `_`, and `..` sequences are
/// removed. Falls back to `fallback` when nothing usable remains.
///
/// # Examples
///
/// ```
/// use folio_domain::names::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("../../etc/passwd", "doc"), "etcpasswd");
/// assert_eq!(sanitize_file_name("Q3 report.pdf", "doc"), "Q3_report.pdf");
/// assert_eq!(sanitize_file_name("///", "doc"), "doc");
/// ```
pub fn sanitize_file_name(name: &str, fallback: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .filter(|&c| c != '/' && c != '\\' && c != '\0')
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", "");
    }

    // ASCII only at this point, so byte truncation is char-safe
    sanitized.truncate(MAX_FILE_NAME_LEN);

    let trimmed = sanitized.trim_matches('.');
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
