//! Cache entry type.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::package::PackageRecord;

/// The last merged scan result and when it was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Unix timestamp in seconds.
    pub ts: f64,
    /// Merged rows, in scan order.
    #[serde(default)]
    pub rows: Vec<PackageRecord>,
}

/// Current time as fractional unix seconds.
pub fn unix_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(rows: Vec<PackageRecord>) -> Self {
        Self {
            ts: unix_now(),
            rows,
        }
    }

    /// Create an entry with an explicit timestamp.
    pub fn at(ts: f64, rows: Vec<PackageRecord>) -> Self {
        Self { ts, rows }
    }

    /// Seconds since the entry was written (never negative).
    pub fn age_secs(&self) -> f64 {
        (unix_now() - self.ts).max(0.0)
    }

    /// Valid while `now - ts <= ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        unix_now() - self.ts <= ttl.as_secs_f64()
    }

    /// When the entry was written.
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt((self.ts * 1000.0) as i64).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Source;

    #[test]
    fn new_entry_is_fresh() {
        let entry = CacheEntry::new(vec![]);
        assert!(entry.is_fresh(Duration::from_secs(600)));
        assert!(entry.age_secs() < 5.0);
    }

    #[test]
    fn old_entry_is_stale() {
        let entry = CacheEntry::at(unix_now() - 3600.0, vec![]);
        assert!(!entry.is_fresh(Duration::from_secs(600)));
        assert!(entry.is_fresh(Duration::from_secs(7200)));
    }

    #[test]
    fn serializes_as_ts_and_rows() {
        let rec = PackageRecord::new("Vendor.App1", "App One", Source::PrimaryPm);
        let entry = CacheEntry::at(1_700_000_000.5, vec![rec]);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["ts"], 1_700_000_000.5);
        assert_eq!(json["rows"][0]["Id"], "Vendor.App1");
    }

    #[test]
    fn cached_at_converts_timestamp() {
        let entry = CacheEntry::at(1_700_000_000.0, vec![]);
        assert_eq!(entry.cached_at().unwrap().timestamp(), 1_700_000_000);
    }
}
