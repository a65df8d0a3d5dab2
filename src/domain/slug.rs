use chrono::{DateTime, Utc};

const BASE36_DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Derives a URL-safe slug from a title: lowercase, every run of
/// non-alphanumeric characters collapsed into a single hyphen, no leading
/// or trailing hyphen. A title without any alphanumeric character yields an
/// empty slug; the caller decides the fallback.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());

    for char in title.chars() {
        if char.is_ascii_alphanumeric() {
            slug.push(char.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    slug.trim_end_matches('-').to_string()
}

/// Base-36 rendering of the instant's epoch milliseconds. Appended to a
/// slug to disambiguate a collision deterministically, without a retry
/// loop; two collisions in the same millisecond are left to the storage
/// unique index.
pub fn base36_millis(instant: DateTime<Utc>) -> String {
    let mut value = instant.timestamp_millis().max(0) as u64;
    if value == 0 {
        return String::from("0");
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    digits.into_iter().map(char::from).collect()
}
