//! Which sources claim which identifiers.

use std::collections::HashMap;

use crate::package::{PackageRecord, Source};

/// Identifier to claiming sources, in the order they were seen.
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    claims: HashMap<String, Vec<Source>>,
}

impl SourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a PackageRecord>) -> Self {
        let mut index = Self::new();
        index.extend(records);
        index
    }

    /// Add every record's claim.
    pub fn extend<'a>(&mut self, records: impl IntoIterator<Item = &'a PackageRecord>) {
        for record in records {
            self.insert(&record.id, record.source);
        }
    }

    /// Note that `source` claims `id`.
    pub fn insert(&mut self, id: &str, source: Source) {
        let claims = self.claims.entry(id.to_string()).or_default();
        if !claims.contains(&source) {
            claims.push(source);
        }
    }

    /// Sources claiming `id`.
    pub fn sources(&self, id: &str) -> &[Source] {
        self.claims.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the store claims `id`.
    pub fn is_store(&self, id: &str) -> bool {
        self.sources(id).contains(&Source::Store)
    }

    /// First secondary package manager claiming `id`.
    pub fn secondary(&self, id: &str) -> Option<Source> {
        self.sources(id)
            .iter()
            .copied()
            .find(|s| matches!(s, Source::SecondaryA | Source::SecondaryB))
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_multiple_claims() {
        let rows = vec![
            PackageRecord::new("git.install", "git", Source::PrimaryPm),
            PackageRecord::new("git.install", "git", Source::SecondaryA),
            PackageRecord::new("git.install", "git", Source::SecondaryA),
            PackageRecord::new("Store.App", "Store App", Source::Store),
        ];
        let index = SourceIndex::from_records(&rows);

        assert_eq!(index.len(), 2);
        assert_eq!(index.sources("git.install"), [Source::PrimaryPm, Source::SecondaryA]);
        assert_eq!(index.secondary("git.install"), Some(Source::SecondaryA));
        assert!(index.is_store("Store.App"));
        assert!(!index.is_store("git.install"));
        assert!(index.sources("unknown").is_empty());
    }
}
