//! Package records and the parsers that produce them.
//!
//! - [`record`] - [`PackageRecord`] and the [`Source`] tag
//! - [`grammar`] - identifier and version predicates
//! - [`parser`] - table and JSON listing parsers

pub mod grammar;
pub mod parser;
pub mod record;

pub use grammar::{hash_name, looks_like_id, looks_like_version};
pub use parser::{is_json_shaped, parse_json_listing, parse_table, parse_table_line};
pub use record::{InstallOrigin, PackageRecord, Source};
