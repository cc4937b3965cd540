//! Filesystem-safe names for lock and storage files
//!
//! Arbitrary caller strings (often full paths) are mapped onto a single path
//! component. Long names are cut from the front so the distinguishing tail
//! (file name, map name) survives.

/// Longest sanitized name, leaving room for `.lock`/`.json` under the
/// common 255-byte filename limit.
pub const MAX_NAME_LEN: usize = 200;

/// Map an arbitrary string onto a filesystem-safe, length-bounded name
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        return "_".to_string();
    }

    // Only ASCII survives the mapping above, so byte slicing is safe.
    if cleaned.len() > MAX_NAME_LEN {
        cleaned[cleaned.len() - MAX_NAME_LEN..].to_string()
    } else {
        cleaned
    }
}
