//! Package records and source tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin of a package observation.
///
/// Serialized as the tag the underlying tool uses, so cache files stay
/// readable by other automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// Primary package manager (winget).
    #[serde(rename = "winget")]
    PrimaryPm,
    /// First secondary package manager (Chocolatey).
    #[serde(rename = "choco")]
    SecondaryA,
    /// Second secondary package manager (Scoop).
    #[serde(rename = "scoop")]
    SecondaryB,
    /// OS component registry (installed baselines only).
    #[serde(rename = "registry")]
    Registry,
    /// App store inventory.
    #[serde(rename = "msstore", alias = "store")]
    Store,
    /// Vendor web page rules. Informational only.
    #[serde(rename = "web")]
    Web,
}

impl Source {
    /// Tag written to the cache and printed in tables.
    pub fn tag(&self) -> &'static str {
        match self {
            Source::PrimaryPm => "winget",
            Source::SecondaryA => "choco",
            Source::SecondaryB => "scoop",
            Source::Registry => "registry",
            Source::Store => "msstore",
            Source::Web => "web",
        }
    }

    /// Parse a tag as it appears in tool output or the cache file.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "winget" => Some(Source::PrimaryPm),
            "choco" | "chocolatey" => Some(Source::SecondaryA),
            "scoop" => Some(Source::SecondaryB),
            "registry" => Some(Source::Registry),
            "msstore" | "store" => Some(Source::Store),
            "web" => Some(Source::Web),
            _ => None,
        }
    }

    /// Whether this source only establishes installed baselines.
    pub fn is_baseline(&self) -> bool {
        matches!(self, Source::Registry | Source::Store)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Publisher and install location of an installed program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOrigin {
    pub publisher: String,
    pub location: String,
}

/// One observed package/version pair from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Stable identity within the source.
    #[serde(rename = "Id")]
    pub id: String,

    /// Display name; may be empty or shared across sources.
    #[serde(rename = "Name", default)]
    pub name: String,

    /// Currently installed version.
    #[serde(rename = "Version", default)]
    pub installed_version: String,

    /// Version offered by the source.
    #[serde(rename = "Available", default)]
    pub available_version: String,

    /// Where this observation came from.
    #[serde(rename = "Source")]
    pub source: Source,

    /// Update cannot be applied silently.
    #[serde(rename = "Interactive", default)]
    pub interactive_required: bool,

    /// Registry details for baselines and the web candidates derived from
    /// them. Not written to the cache.
    #[serde(skip)]
    pub origin: Option<InstallOrigin>,
}

impl PackageRecord {
    /// Create a record with empty versions.
    pub fn new(id: impl Into<String>, name: impl Into<String>, source: Source) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            installed_version: String::new(),
            available_version: String::new(),
            source,
            interactive_required: false,
            origin: None,
        }
    }

    /// Set the installed version.
    pub fn with_installed(mut self, version: impl Into<String>) -> Self {
        self.installed_version = version.into();
        self
    }

    /// Set the available version.
    pub fn with_available(mut self, version: impl Into<String>) -> Self {
        self.available_version = version.into();
        self
    }

    /// Attach publisher and install location; both empty leaves none.
    pub fn with_origin(
        mut self,
        publisher: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        let origin = InstallOrigin {
            publisher: publisher.into(),
            location: location.into(),
        };
        let known = !origin.publisher.is_empty() || !origin.location.is_empty();
        self.origin = known.then_some(origin);
        self
    }

    /// Mark the record as needing an interactive installer.
    pub fn interactive(mut self) -> Self {
        self.interactive_required = true;
        self
    }

    /// An offered version exists and differs from what is installed.
    pub fn is_upgradable(&self) -> bool {
        !self.available_version.is_empty() && self.available_version != self.installed_version
    }

    /// Merge key: `(id, source)`.
    pub fn key(&self) -> (&str, Source) {
        (self.id.as_str(), self.source)
    }
}
