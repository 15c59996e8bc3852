//! Identifier and version grammars.
//!
//! Package manager listings mix display names, identifiers and versions in
//! loosely aligned columns. These two predicates are what tells them apart,
//! and other automation relies on them matching exactly.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

/// Digits followed by one or more `.`-prefixed alphanumeric/`-`/`+` groups.
static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(\.[0-9A-Za-z\-+]+)+$").expect("VERSION_REGEX must compile")
});

/// Alphanumeric at both ends, `-._` allowed inside.
static ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\-._]+[A-Za-z0-9]$").expect("ID_REGEX must compile")
});

/// Whether `s` is shaped like a version number (`1.2.3`, `2021.11-beta`).
pub fn looks_like_version(s: &str) -> bool {
    VERSION_REGEX.is_match(s)
}

/// Whether `s` is shaped like a package identifier (`Vendor.App-2`).
///
/// Requires at least one `.`, which is what separates identifiers from
/// single-word display names.
pub fn looks_like_id(s: &str) -> bool {
    !s.contains(' ') && s.contains('.') && ID_REGEX.is_match(s)
}

/// Short stable hash of a display name, used for synthetic identifiers.
pub fn hash_name(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    hex::encode(&digest[..6])
}
