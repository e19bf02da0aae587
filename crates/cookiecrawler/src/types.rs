// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data types for page observations and aggregated findings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CrawlError;
use crate::key::ResultKey;

/// What kind of browser storage a finding was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FindingKind {
    Cookie,
    #[serde(rename = "localStorage")]
    LocalStorageItem,
}

impl FindingKind {
    /// Stable tag used in keys and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cookie => "cookie",
            Self::LocalStorageItem => "localStorage",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remaining lifetime of a cookie relative to when it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "ms", rename_all = "snake_case")]
pub enum Lifetime {
    /// Lives only as long as the browser session.
    Session,
    /// Milliseconds left at observation time. Negative when already expired.
    Remaining(i64),
}

impl Lifetime {
    /// Milliseconds remaining, `None` for session cookies.
    pub fn as_millis(&self) -> Option<i64> {
        match self {
            Self::Session => None,
            Self::Remaining(ms) => Some(*ms),
        }
    }

    /// Merge priority: finite non-negative > session > finite negative.
    fn rank(&self) -> u8 {
        match self {
            Self::Remaining(ms) if *ms >= 0 => 2,
            Self::Session => 1,
            Self::Remaining(_) => 0,
        }
    }
}

impl Ord for Lifetime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank()).then_with(|| {
            match (self, other) {
                (Self::Remaining(a), Self::Remaining(b)) => a.cmp(b),
                _ => Ordering::Equal,
            }
        })
    }
}

impl PartialOrd for Lifetime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Languages the readable lifetime can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    De,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::De => "de",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "de" => Ok(Self::De),
            "en" => Ok(Self::En),
            other => Err(CrawlError::Config(format!("unsupported language: {other}"))),
        }
    }
}

/// Rendered lifetime per language.
pub type ReadableLifetime = BTreeMap<Language, String>;

/// Descriptive metadata about a well-known cookie or storage key name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieDetail {
    pub platform: String,
    pub category: String,
    pub description: String,
}

/// A single cookie or storage entry seen on one page visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageObservation {
    pub kind: FindingKind,
    /// Cookie domain or storage origin.
    pub scope: String,
    pub name: String,
    pub path: Option<String>,
    pub same_site: Option<String>,
    /// Seconds since epoch; non-positive for session cookies, `None` for storage items.
    pub raw_expiry: Option<f64>,
    pub visited_url: String,
    /// Milliseconds since epoch.
    pub observed_at_ms: i64,
}

impl PageObservation {
    /// A cookie observation.
    pub fn cookie(
        domain: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        expires: f64,
        visited_url: impl Into<String>,
        observed_at_ms: i64,
    ) -> Self {
        Self {
            kind: FindingKind::Cookie,
            scope: domain.into(),
            name: name.into(),
            path: Some(path.into()),
            same_site: None,
            raw_expiry: Some(expires),
            visited_url: visited_url.into(),
            observed_at_ms,
        }
    }

    /// A localStorage observation.
    pub fn local_storage(
        origin: impl Into<String>,
        name: impl Into<String>,
        visited_url: impl Into<String>,
        observed_at_ms: i64,
    ) -> Self {
        Self {
            kind: FindingKind::LocalStorageItem,
            scope: origin.into(),
            name: name.into(),
            path: None,
            same_site: None,
            raw_expiry: None,
            visited_url: visited_url.into(),
            observed_at_ms,
        }
    }

    pub fn with_same_site(mut self, same_site: impl Into<String>) -> Self {
        self.same_site = Some(same_site.into());
        self
    }
}

/// Everything one successful page visit produced.
#[derive(Debug, Clone, Default)]
pub struct PageVisit {
    pub observations: Vec<PageObservation>,
    /// Load samples in [0, 1] taken at the visit's checkpoints.
    pub load_samples: Vec<f64>,
}

/// One deduplicated record of a cookie or storage item across the crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub key: ResultKey,
    pub kind: FindingKind,
    pub name: String,
    pub scope: String,
    pub path: Option<String>,
    pub same_site: Option<String>,
    pub occurrence_count: u64,
    pub observed_urls: Vec<String>,
    /// `None` for storage items, which carry no expiry.
    pub remaining_lifetime: Option<Lifetime>,
    pub readable_lifetime: ReadableLifetime,
    pub metadata: Option<CookieDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetime_ordering() {
        let negative = Lifetime::Remaining(-5);
        let zero = Lifetime::Remaining(0);
        let long = Lifetime::Remaining(7_200_000);
        assert!(Lifetime::Session > negative);
        assert!(zero > Lifetime::Session);
        assert!(long > zero);
        assert!(Lifetime::Remaining(-1) > Lifetime::Remaining(-100));
        assert_eq!(
            [negative, long, Lifetime::Session].into_iter().max(),
            Some(long)
        );
    }

    #[test]
    fn test_language_parse() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!(" de ".parse::<Language>().unwrap(), Language::De);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&FindingKind::LocalStorageItem).unwrap(),
            "\"localStorage\""
        );
        assert_eq!(serde_json::to_string(&FindingKind::Cookie).unwrap(), "\"cookie\"");
    }
}
