//! Vendor page version rules.
//!
//! A rule pairs a display-name substring with a page URL and a pattern that
//! extracts the latest version from that page. Rules are applied to
//! installed baselines to find updates no package manager knows about.
//!
//! ```json
//! [{"match": "Some Editor", "url": "https://example.com/download", "regex": "Version ([0-9.]+)"}]
//! ```

use anyhow::{bail, Context};
use regex::Regex;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, UpkeepError};
use crate::package::{hash_name, looks_like_version, PackageRecord, Source};

/// Fetches page bodies by URL.
pub trait PageFetcher: Send + Sync {
    fn fetch_page(&self, url: &str) -> anyhow::Result<String>;
}

/// Fetches pages over HTTP/HTTPS.
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a new HTTP fetcher with default 30-second timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a new HTTP fetcher with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(concat!("upkeep/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });
        Self { client, timeout }
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch_page(&self, url: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), url);
        }

        Ok(response.text()?)
    }
}

/// One rule as written in the rules file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebRule {
    #[serde(rename = "match", default)]
    pub pattern: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub regex: String,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    needle: String,
    url: String,
    regex: Regex,
}

/// Usable rules, in file order.
#[derive(Debug, Clone, Default)]
pub struct WebRules {
    rules: Vec<CompiledRule>,
}

impl WebRules {
    /// Keep rules with all three fields set and a valid pattern.
    pub fn from_rules(rules: Vec<WebRule>) -> Self {
        let rules = rules
            .into_iter()
            .filter_map(|rule| {
                let needle = rule.pattern.trim().to_lowercase();
                let url = rule.url.trim().to_string();
                let pattern = rule.regex.trim();
                if needle.is_empty() || url.is_empty() || pattern.is_empty() {
                    return None;
                }
                match Regex::new(pattern) {
                    Ok(regex) => Some(CompiledRule { needle, url, regex }),
                    Err(e) => {
                        tracing::warn!(url = %url, "Skipping rule with invalid pattern: {}", e);
                        None
                    }
                }
            })
            .collect();
        Self { rules }
    }

    /// Load rules from a JSON file. A missing file has no rules.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let rules: Vec<WebRule> =
            serde_json::from_str(&content).map_err(|e| UpkeepError::Rules {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self::from_rules(rules))
    }

    /// Load rules, treating any problem as an empty rule set.
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Self::default()
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Latest version for `name` according to the first rule that yields one.
    pub fn latest_for(&self, name: &str, fetcher: &dyn PageFetcher) -> Option<String> {
        self.latest_from(name, &mut FetchedPages::new(fetcher))
    }

    /// Like [`latest_for`](Self::latest_for), reusing pages already in `pages`.
    pub fn latest_from(&self, name: &str, pages: &mut FetchedPages<'_>) -> Option<String> {
        let lowered = name.to_lowercase();
        for rule in self.rules.iter().filter(|r| lowered.contains(&r.needle)) {
            let Some(page) = pages.get(&rule.url) else {
                continue;
            };
            if let Some(version) = extract_version(&rule.regex, page) {
                return Some(version);
            }
        }
        None
    }
}

/// Page bodies fetched so far, by URL.
///
/// Failed and empty fetches are remembered too, so each URL is requested
/// at most once.
pub struct FetchedPages<'a> {
    fetcher: &'a dyn PageFetcher,
    pages: HashMap<String, Option<String>>,
}

impl<'a> FetchedPages<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher) -> Self {
        Self {
            fetcher,
            pages: HashMap::new(),
        }
    }

    /// Body of `url`, fetching it on first use.
    pub fn get(&mut self, url: &str) -> Option<&str> {
        let fetcher = self.fetcher;
        self.pages
            .entry(url.to_string())
            .or_insert_with(|| match fetcher.fetch_page(url) {
                Ok(page) if !page.is_empty() => Some(page),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("Vendor page check failed: {:#}", e);
                    None
                }
            })
            .as_deref()
    }

    /// Number of distinct URLs requested.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Capture group 1 if the pattern has one, else the whole match; only
/// returned when it is shaped like a version.
pub fn extract_version(regex: &Regex, page: &str) -> Option<String> {
    let caps = regex.captures(page)?;
    let found = if regex.captures_len() > 1 {
        caps.get(1)?
    } else {
        caps.get(0)?
    };
    let version = found.as_str().trim();
    looks_like_version(version).then(|| version.to_string())
}

/// Synthetic identifier of a web candidate.
pub fn web_id(name: &str) -> String {
    format!("web:{}", hash_name(name))
}

/// Web candidates derived from installed baselines.
///
/// Baselines whose `(web id, Web)` key is already in `known`, and store
/// baselines when `skip_store` is set, are not checked. `on_item` is called
/// with `(index, total, name)` before each baseline.
pub fn web_candidates(
    baselines: &[PackageRecord],
    known: &HashSet<(String, Source)>,
    skip_store: bool,
    rules: &WebRules,
    fetcher: &dyn PageFetcher,
    mut on_item: impl FnMut(usize, usize, &str),
) -> Vec<PackageRecord> {
    let mut out = Vec::new();
    if rules.is_empty() {
        return out;
    }

    let total = baselines.len();
    let mut seen = known.clone();
    let mut pages = FetchedPages::new(fetcher);
    for (index, baseline) in baselines.iter().enumerate() {
        on_item(index, total, &baseline.name);

        if baseline.name.is_empty() || baseline.installed_version.is_empty() {
            continue;
        }
        if skip_store && baseline.source == Source::Store {
            continue;
        }
        let id = web_id(&baseline.name);
        if seen.contains(&(id.clone(), Source::Web)) {
            continue;
        }

        let Some(latest) = rules.latest_from(&baseline.name, &mut pages) else {
            continue;
        };
        if latest == baseline.installed_version {
            continue;
        }

        let publisher = baseline.origin.as_ref().map_or("", |o| o.publisher.as_str());
        tracing::debug!(
            name = %baseline.name,
            publisher,
            latest = %latest,
            "Vendor page reports newer version"
        );
        seen.insert((id.clone(), Source::Web));
        let mut candidate = PackageRecord::new(id, baseline.name.clone(), Source::Web)
            .with_installed(baseline.installed_version.clone())
            .with_available(latest)
            .interactive();
        candidate.origin = baseline.origin.clone();
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct StaticPages(HashMap<String, String>);

    impl PageFetcher for StaticPages {
        fn fetch_page(&self, url: &str) -> anyhow::Result<String> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("HTTP 404 fetching {}", url))
        }
    }

    fn pages(entries: &[(&str, &str)]) -> StaticPages {
        StaticPages(
            entries
                .iter()
                .map(|(u, b)| (u.to_string(), b.to_string()))
                .collect(),
        )
    }

    fn rule(pattern: &str, url: &str, regex: &str) -> WebRule {
        WebRule {
            pattern: pattern.into(),
            url: url.into(),
            regex: regex.into(),
        }
    }

    fn editor_baseline(version: &str) -> PackageRecord {
        PackageRecord::new("reg:aaaaaaaaaaaa", "Some Editor", Source::Registry)
            .with_installed(version)
            .with_origin("Editor Corp", r"C:\Editor")
    }

    #[test]
    fn blank_fields_and_bad_patterns_are_dropped() {
        let rules = WebRules::from_rules(vec![
            rule("Editor", "https://e.test", r"v([0-9.]+)"),
            rule("", "https://e.test", r"x"),
            rule("Tool", "  ", r"x"),
            rule("Tool", "https://t.test", r"("),
        ]);
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let rules = WebRules::load(&temp.path().join("none.json")).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn load_invalid_file_is_an_error_or_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rules.json");
        fs::write(&path, "{\"match\": 1").unwrap();

        assert!(matches!(WebRules::load(&path), Err(UpkeepError::Rules { .. })));
        assert!(WebRules::load_or_empty(&path).is_empty());
    }

    #[test]
    fn load_reads_rules() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rules.json");
        fs::write(
            &path,
            r#"[{"match": "Editor", "url": "https://e.test", "regex": "v([0-9.]+)"}, {"match": "x"}]"#,
        )
        .unwrap();
        assert_eq!(WebRules::load(&path).unwrap().len(), 1);
    }

    #[test]
    fn extract_prefers_group_one() {
        let re = Regex::new(r"Latest: v([0-9.]+)").unwrap();
        assert_eq!(extract_version(&re, "Latest: v4.3.1 (stable)").as_deref(), Some("4.3.1"));

        let whole = Regex::new(r"[0-9]+\.[0-9]+\.[0-9]+").unwrap();
        assert_eq!(extract_version(&whole, "get 4.3.1 now").as_deref(), Some("4.3.1"));
    }

    #[test]
    fn extract_rejects_non_versions() {
        let re = Regex::new(r"Latest: (\S+)").unwrap();
        assert_eq!(extract_version(&re, "Latest: soon"), None);
    }

    #[test]
    fn match_is_case_insensitive_and_first_version_wins() {
        let rules = WebRules::from_rules(vec![
            rule("EDITOR", "https://a.test", r"v([0-9.]+)"),
            rule("editor", "https://b.test", r"v([0-9.]+)"),
        ]);
        let fetcher = pages(&[("https://a.test", "no version here"), ("https://b.test", "v5.0.0")]);
        assert_eq!(rules.latest_for("Some Editor", &fetcher).as_deref(), Some("5.0.0"));
    }

    #[test]
    fn newer_version_synthesizes_interactive_candidate() {
        let rules = WebRules::from_rules(vec![rule("editor", "https://e.test", r"v([0-9.]+)")]);
        let fetcher = pages(&[("https://e.test", "Download v4.3.0")]);
        let mut calls = 0;

        let out = web_candidates(
            &[editor_baseline("4.2.0")],
            &HashSet::new(),
            true,
            &rules,
            &fetcher,
            |_, _, _| calls += 1,
        );

        assert_eq!(calls, 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, web_id("Some Editor"));
        assert_eq!(out[0].source, Source::Web);
        assert_eq!(out[0].installed_version, "4.2.0");
        assert_eq!(out[0].available_version, "4.3.0");
        assert!(out[0].interactive_required);
        assert_eq!(out[0].origin.as_ref().unwrap().publisher, "Editor Corp");
    }

    #[test]
    fn same_version_yields_nothing() {
        let rules = WebRules::from_rules(vec![rule("editor", "https://e.test", r"v([0-9.]+)")]);
        let fetcher = pages(&[("https://e.test", "Download v4.2.0")]);
        let out = web_candidates(
            &[editor_baseline("4.2.0")],
            &HashSet::new(),
            true,
            &rules,
            &fetcher,
            |_, _, _| {},
        );
        assert!(out.is_empty());
    }

    #[test]
    fn known_keys_and_store_baselines_are_skipped() {
        let rules = WebRules::from_rules(vec![rule("app", "https://e.test", r"v([0-9.]+)")]);
        let fetcher = pages(&[("https://e.test", "v9.0.0")]);

        let known: HashSet<(String, Source)> =
            [(web_id("Some App"), Source::Web)].into_iter().collect();
        let registry = PackageRecord::new("reg:1", "Some App", Source::Registry).with_installed("1.0");
        let store = PackageRecord::new("store:Other.App", "Other.App", Source::Store).with_installed("1.0.0.0");

        let out = web_candidates(&[registry.clone(), store.clone()], &known, true, &rules, &fetcher, |_, _, _| {});
        assert!(out.is_empty());

        let out = web_candidates(&[store], &HashSet::new(), false, &rules, &fetcher, |_, _, _| {});
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn duplicate_baselines_yield_one_candidate() {
        let rules = WebRules::from_rules(vec![rule("editor", "https://e.test", r"v([0-9.]+)")]);
        let fetcher = pages(&[("https://e.test", "v4.3.0")]);
        let out = web_candidates(
            &[editor_baseline("4.2.0"), editor_baseline("4.2.0")],
            &HashSet::new(),
            true,
            &rules,
            &fetcher,
            |_, _, _| {},
        );
        assert_eq!(out.len(), 1);
    }

    struct CountingFetcher {
        body: Option<&'static str>,
        requests: std::sync::Mutex<Vec<String>>,
    }

    impl CountingFetcher {
        fn serving(body: Option<&'static str>) -> Self {
            Self {
                body,
                requests: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl PageFetcher for CountingFetcher {
        fn fetch_page(&self, url: &str) -> anyhow::Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            self.body
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("HTTP 503 fetching {}", url))
        }
    }

    fn many_baselines(count: usize) -> Vec<PackageRecord> {
        (0..count)
            .map(|i| {
                let name = format!("Microsoft Thing {}", i);
                PackageRecord::new(format!("reg:{}", i), name, Source::Registry)
                    .with_installed("1.0.0")
            })
            .collect()
    }

    #[test]
    fn shared_page_is_fetched_once_per_scan() {
        let rules = WebRules::from_rules(vec![rule(
            "microsoft",
            "https://vendor.test/releases",
            r"v([0-9.]+)",
        )]);
        let fetcher = CountingFetcher::serving(Some("Latest v2.0.0"));

        let out = web_candidates(
            &many_baselines(20),
            &HashSet::new(),
            true,
            &rules,
            &fetcher,
            |_, _, _| {},
        );

        assert_eq!(out.len(), 20);
        assert_eq!(fetcher.requests(), 1);
    }

    #[test]
    fn failed_page_is_not_retried_within_a_scan() {
        let rules = WebRules::from_rules(vec![rule(
            "microsoft",
            "https://vendor.test/releases",
            r"v([0-9.]+)",
        )]);
        let fetcher = CountingFetcher::serving(None);

        let out = web_candidates(
            &many_baselines(5),
            &HashSet::new(),
            true,
            &rules,
            &fetcher,
            |_, _, _| {},
        );

        assert!(out.is_empty());
        assert_eq!(fetcher.requests(), 1);
    }

    #[test]
    fn fetched_pages_track_distinct_urls() {
        let fetcher = pages(&[("https://a.test", "v1.0.0")]);
        let mut fetched = FetchedPages::new(&fetcher);
        assert!(fetched.is_empty());

        assert_eq!(fetched.get("https://a.test"), Some("v1.0.0"));
        assert_eq!(fetched.get("https://a.test"), Some("v1.0.0"));
        assert_eq!(fetched.get("https://missing.test"), None);
        assert_eq!(fetched.len(), 2);
    }

    #[test]
    fn http_fetcher_returns_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/download");
            then.status(200).body("<p>Current release: v4.3.0</p>");
        });

        let fetcher = HttpFetcher::with_timeout(Duration::from_secs(5));
        let body = fetcher.fetch_page(&server.url("/download")).unwrap();
        assert!(body.contains("v4.3.0"));
    }

    #[test]
    fn http_fetcher_reports_status_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("Not Found");
        });

        let fetcher = HttpFetcher::new();
        let err = fetcher.fetch_page(&server.url("/missing")).unwrap_err();
        assert!(err.to_string().contains("404"), "Error should mention 404: {}", err);
    }

    #[test]
    fn rules_work_against_live_pages() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/editor");
            then.status(200).body("Latest version: 4.3.0");
        });

        let rules = WebRules::from_rules(vec![rule(
            "Editor",
            &server.url("/editor"),
            r"Latest version: ([0-9.]+)",
        )]);
        let latest = rules.latest_for("Some Editor", &HttpFetcher::new());
        assert_eq!(latest.as_deref(), Some("4.3.0"));
    }

    #[test]
    fn default_timeout_is_30_seconds() {
        assert_eq!(HttpFetcher::default().timeout(), Duration::from_secs(30));
    }
}
