//! Logical vs. storage-unique slugs.
//!
//! Logical slugs (`defi-lending`) repeat across runs, but the durable store
//! requires slug uniqueness. The storage form appends a random suffix
//! segment (`defi-lending-x3k9qa`); [`logical_slug`] strips that last
//! dash-delimited segment. The two functions are exact inverses: for any
//! logical slug `s`, `logical_slug(&storage_slug(s)) == s`.

use rand::Rng;

const SUFFIX_LEN: usize = 6;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Makes a slug unique for storage by appending a random suffix segment.
#[must_use]
pub fn storage_slug(logical: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..SUFFIX_ALPHABET.len());
            SUFFIX_ALPHABET[idx] as char
        })
        .collect();
    format!("{logical}-{suffix}")
}

/// Recovers the logical slug by stripping the last dash-delimited segment.
///
/// A slug without any dash is returned unchanged (nothing to strip).
#[must_use]
pub fn logical_slug(storage: &str) -> &str {
    match storage.rfind('-') {
        Some(idx) => &storage[..idx],
        None => storage,
    }
}
