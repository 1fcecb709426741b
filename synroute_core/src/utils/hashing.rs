//! Utility functions for getting hashes
use std::format;
use std::hash::{DefaultHasher, Hash, Hasher};

pub(crate) fn calculate_hash<T: Hash>(t: &T) -> u64 {
    let mut s = DefaultHasher::new();
    t.hash(&mut s);
    s.finish()
}

pub(crate) fn hash_as_hex_string<T: Hash>(t: &T) -> String {
    format!("{:x}", calculate_hash(t))
}

/// Stable file-name key for a (catalog identity, reaction filter) pair.
///
/// `DefaultHasher::new()` is fixed-key, so the same inputs map to the same
/// key across processes, which is what lets a cache written by one run be
/// picked up by the next.
pub(crate) fn cache_key(identity: &str, filter_tag: &str) -> String {
    hash_as_hex_string(&(identity, filter_tag))
}
