//! Applying updates.
//!
//! - [`executor`] - the per-package fallback chain
//! - [`index`] - which sources claim an identifier
//! - [`outcome`] - outcome buckets
//! - [`report`] - run reports in JSON or text

pub mod executor;
pub mod index;
pub mod outcome;
pub mod report;

pub use executor::{UpdateExecutor, REBOOT_REQUIRED_EXIT_CODE, SUCCESS_EXIT_CODES};
pub use index::SourceIndex;
pub use outcome::{Outcome, UpdateOutcomeSet};
pub use report::{ReportFormat, UpdateRun};
