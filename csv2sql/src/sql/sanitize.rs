//! Header clean-up: turn CSV header fields into usable column names.
//!
//! Every occurrence of a character from [`HEADER_REPLACED_CHARS`] becomes
//! `_`. Nothing else is touched, so an empty field stays empty and a field
//! starting with a digit still starts with a digit.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Characters replaced by `_` in header fields.
pub const HEADER_REPLACED_CHARS: [char; 12] =
    [' ', '|', '-', '+', '@', '#', '/', '\\', ':', '(', ')', '\''];

static HEADER_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ |\-+@#/\\:()']").expect("header character class is valid"));

/// Clean a single header field.
///
/// # Example
/// ```
/// use csv2sql::clean_header;
///
/// assert_eq!(clean_header("Full Name"), "Full_Name");
/// assert_eq!(clean_header("e-mail (work)"), "e_mail__work_");
/// ```
pub fn clean_header(field: &str) -> Cow<'_, str> {
    HEADER_CHARS.replace_all(field, "_")
}

/// Clean every field of a header record in place.
pub fn clean_header_fields(fields: &mut [String]) {
    for field in fields.iter_mut() {
        let cleaned = match clean_header(field) {
            Cow::Borrowed(_) => continue,
            Cow::Owned(cleaned) => cleaned,
        };
        debug!("Running header clean up for '{}' changed to '{}'", field, cleaned);
        *field = cleaned;
    }
}
