//! Package listing parsers.
//!
//! Two shapes are understood:
//!
//! - space-padded tables, where columns are separated by runs of two or more
//!   spaces and the meaning of each column has to be inferred
//! - JSON listings, where field names are known up front
//!
//! Neither parser fails. Lines or entries that don't fit are dropped.

use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::grammar::{looks_like_id, looks_like_version};
use super::record::{PackageRecord, Source};

/// Column separator: two or more whitespace characters.
static COLUMN_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("COLUMN_SPLIT must compile"));

/// Lines starting with these (lowercased) are banners or headers.
const BANNER_PREFIXES: &[&str] = &["found ", "no ", "the following", "name ", "id "];

/// Tokens accepted as a source column in the heuristic rule.
const SOURCE_VOCABULARY: &[&str] = &["winget", "msstore", "store", "msi", "exe", "msix"];

/// Column roles recovered from one table line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct RowFields<'a> {
    id: &'a str,
    installed: &'a str,
    available: &'a str,
    source: &'a str,
}

/// A column rule inspects `cols[1..]` and claims the row, or passes.
type ColumnRule = for<'a> fn(&[&'a str]) -> Option<RowFields<'a>>;

/// Ordered column-role rules. The first rule that claims a row wins.
const COLUMN_RULES: &[(&str, ColumnRule)] = &[
    ("id-first", id_first_rule),
    ("version-first", version_first_rule),
    ("greedy-scan", greedy_scan_rule),
];

fn column<'a>(cols: &[&'a str], index: usize) -> &'a str {
    cols.get(index).copied().unwrap_or("")
}

/// `Name  Id  Version  Available  Source`
fn id_first_rule<'a>(cols: &[&'a str]) -> Option<RowFields<'a>> {
    let second = *cols.get(1)?;
    if !looks_like_id(second) || looks_like_version(second) {
        return None;
    }
    Some(RowFields {
        id: second,
        installed: column(cols, 2),
        available: column(cols, 3),
        source: column(cols, 4),
    })
}

/// `Name  Version  Id  Available  Source`
fn version_first_rule<'a>(cols: &[&'a str]) -> Option<RowFields<'a>> {
    let second = *cols.get(1)?;
    let third = *cols.get(2)?;
    if !looks_like_version(second) || !looks_like_id(third) {
        return None;
    }
    Some(RowFields {
        id: third,
        installed: second,
        available: column(cols, 3),
        source: column(cols, 4),
    })
}

/// Single pass: first identifier, first two versions, first source tag.
fn greedy_scan_rule<'a>(cols: &[&'a str]) -> Option<RowFields<'a>> {
    let mut fields = RowFields::default();
    for &col in cols.iter().skip(1) {
        if fields.id.is_empty() && looks_like_id(col) && !looks_like_version(col) {
            fields.id = col;
        } else if fields.installed.is_empty() && looks_like_version(col) {
            fields.installed = col;
        } else if fields.available.is_empty() && looks_like_version(col) {
            fields.available = col;
        } else if fields.source.is_empty()
            && SOURCE_VOCABULARY.contains(&col.to_lowercase().as_str())
        {
            fields.source = col;
        }
    }
    Some(fields)
}

fn is_banner(line: &str) -> bool {
    let lower = line.to_lowercase();
    BANNER_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Map a source column to a tag; unknown or empty columns mean the primary manager.
fn source_from_column(column: &str) -> Source {
    match Source::from_tag(column) {
        Some(Source::Store) => Source::Store,
        _ => Source::PrimaryPm,
    }
}

/// Parse one table line into a record, if it carries an identifier.
pub fn parse_table_line(line: &str) -> Option<PackageRecord> {
    // Spinner frames are redrawn with `\r`; only the last frame is real output.
    let line = line.rsplit('\r').next().unwrap_or(line).trim();
    if line.is_empty() || is_banner(line) {
        return None;
    }

    let cols: Vec<&str> = COLUMN_SPLIT.split(line).collect();
    if cols.len() < 2 {
        return None;
    }

    let fields = COLUMN_RULES
        .iter()
        .find_map(|(_, rule)| rule(&cols))
        .filter(|f| !f.id.is_empty())?;

    Some(PackageRecord {
        id: fields.id.to_string(),
        name: cols[0].to_string(),
        installed_version: fields.installed.to_string(),
        available_version: fields.available.to_string(),
        source: source_from_column(fields.source),
        interactive_required: false,
        origin: None,
    })
}

/// Parse a space-padded package table.
///
/// Rows are deduplicated by identifier, keeping the first occurrence.
pub fn parse_table(text: &str) -> Vec<PackageRecord> {
    let mut seen = HashSet::new();
    text.lines()
        .filter_map(parse_table_line)
        .filter(|rec| seen.insert(rec.id.clone()))
        .collect()
}

/// Whether `text` looks like a JSON document.
pub fn is_json_shaped(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

/// First non-empty string among `keys`.
fn string_field(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Entries of a listing: a bare array, or an object carrying `InstalledPackages`.
pub fn listing_entries(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => match value.get("InstalledPackages") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Map one JSON package entry onto a record.
fn record_from_json(entry: &Value) -> Option<PackageRecord> {
    let id = string_field(entry, &["PackageIdentifier", "Id"]);
    if !looks_like_id(&id) {
        return None;
    }
    let mut name = string_field(entry, &["PackageName", "Name"]);
    if name.is_empty() {
        name = id.clone();
    }
    let source = string_field(entry, &["Source"]);

    Some(PackageRecord {
        installed_version: string_field(entry, &["InstalledVersion", "Version"]),
        available_version: string_field(entry, &["AvailableVersion", "Available"]),
        source: source_from_column(&source),
        interactive_required: entry
            .get("IsInteractive")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        id,
        name,
        origin: None,
    })
}

/// Parse a JSON package listing.
///
/// Returns `None` when the text is not JSON-shaped or fails to decode, so
/// callers can fall back to table parsing.
pub fn parse_json_listing(text: &str) -> Option<Vec<PackageRecord>> {
    if !is_json_shaped(text) {
        return None;
    }
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    Some(
        listing_entries(&value)
            .into_iter()
            .filter_map(record_from_json)
            .collect(),
    )
}
