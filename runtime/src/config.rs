// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Layered configuration for the `crawl` command.
//!
//! Precedence, highest first: command-line flags, `COOKIECRAWLER_*`
//! environment variables, the JSON config file, built-in defaults.

use anyhow::{bail, Context, Result};
use cookiecrawler::{CrawlConfig, Language};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::metadata::default_metadata_path;

pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CrawlOverrides {
    pub config_file: Option<PathBuf>,
    pub consent_selector: Option<String>,
    pub initial_chunk: Option<usize>,
    pub languages: Option<Vec<Language>>,
    pub navigation_timeout_ms: Option<u64>,
    pub results_dir: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
    pub retry_failed: bool,
}

/// The JSON config file: a `CrawlConfig` plus the runtime-only paths.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    #[serde(flatten)]
    crawl: CrawlConfig,
    results_dir: Option<PathBuf>,
    metadata: Option<PathBuf>,
}

/// Fully resolved settings for one crawl.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub crawl: CrawlConfig,
    pub results_dir: PathBuf,
    pub metadata_path: Option<PathBuf>,
}

/// Resolve settings from the process environment.
pub fn resolve(overrides: &CrawlOverrides) -> Result<ResolvedSettings> {
    resolve_with(overrides, |name| std::env::var(name).ok())
}

/// Resolve settings with an explicit environment lookup.
pub fn resolve_with<F>(overrides: &CrawlOverrides, env: F) -> Result<ResolvedSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let read_env = |name: &str| {
        env(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let config_file = overrides
        .config_file
        .clone()
        .or_else(|| read_env("COOKIECRAWLER_CONFIG").map(PathBuf::from));
    let file = match config_file {
        Some(path) => load_file(&path)?,
        None => FileConfig::default(),
    };

    let mut crawl = file.crawl;
    let mut results_dir = file.results_dir;
    let mut metadata_path = file.metadata;

    // Environment layer.
    if let Some(v) = read_env("COOKIECRAWLER_CONSENT_SELECTOR") {
        crawl.consent_selector = Some(v);
    }
    if let Some(v) = read_env("COOKIECRAWLER_INITIAL_CHUNK") {
        crawl.scheduler.initial_chunk_size = parse_env("COOKIECRAWLER_INITIAL_CHUNK", &v)?;
    }
    if let Some(v) = read_env("COOKIECRAWLER_LANGUAGES") {
        crawl.languages = parse_languages(&v)?;
    }
    if let Some(v) = read_env("COOKIECRAWLER_NAVIGATION_TIMEOUT_MS") {
        crawl.navigation_timeout_ms = parse_env("COOKIECRAWLER_NAVIGATION_TIMEOUT_MS", &v)?;
    }
    if let Some(v) = read_env("COOKIECRAWLER_IDLE_TIMEOUT_MS") {
        crawl.idle_timeout_ms = parse_env("COOKIECRAWLER_IDLE_TIMEOUT_MS", &v)?;
    }
    if let Some(v) = read_env("COOKIECRAWLER_SESSION_TIMEOUT_MS") {
        crawl.session_timeout_ms = parse_env("COOKIECRAWLER_SESSION_TIMEOUT_MS", &v)?;
    }
    if let Some(v) = read_env("COOKIECRAWLER_RETRY_FAILED") {
        crawl.retry_failed = parse_env("COOKIECRAWLER_RETRY_FAILED", &v)?;
    }
    if let Some(v) = read_env("COOKIECRAWLER_RESULTS_DIR") {
        results_dir = Some(PathBuf::from(v));
    }
    if let Some(v) = read_env("COOKIECRAWLER_METADATA") {
        metadata_path = Some(PathBuf::from(v));
    }

    // Command-line layer.
    if let Some(v) = &overrides.consent_selector {
        crawl.consent_selector = Some(v.clone());
    }
    if let Some(v) = overrides.initial_chunk {
        crawl.scheduler.initial_chunk_size = v;
    }
    if let Some(v) = &overrides.languages {
        crawl.languages = v.clone();
    }
    if let Some(v) = overrides.navigation_timeout_ms {
        crawl.navigation_timeout_ms = v;
    }
    if overrides.retry_failed {
        crawl.retry_failed = true;
    }
    if let Some(v) = &overrides.results_dir {
        results_dir = Some(v.clone());
    }
    if let Some(v) = &overrides.metadata {
        metadata_path = Some(v.clone());
    }

    validate(&crawl)?;

    Ok(ResolvedSettings {
        crawl,
        results_dir: results_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR)),
        metadata_path: metadata_path.or_else(default_metadata_path),
    })
}

fn load_file(path: &Path) -> Result<FileConfig> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("invalid config file {}", path.display()))
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("{name} has an invalid value: '{value}'"))
}

/// Parse a comma-separated language list such as `en,de`.
pub fn parse_languages(raw: &str) -> Result<Vec<Language>> {
    let mut languages = Vec::new();
    for code in raw.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let language: Language = code.parse()?;
        if !languages.contains(&language) {
            languages.push(language);
        }
    }
    if languages.is_empty() {
        bail!("no output language given");
    }
    Ok(languages)
}

fn validate(config: &CrawlConfig) -> Result<()> {
    if config.languages.is_empty() {
        bail!("at least one output language is required");
    }
    if config.navigation_timeout_ms == 0 || config.session_timeout_ms == 0 {
        bail!("timeouts must be greater than zero");
    }
    if config.sampler_capacity == 0 {
        bail!("sampler_capacity must be greater than zero");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_any_layer() {
        let resolved = resolve_with(&CrawlOverrides::default(), env_from(&[])).unwrap();
        assert_eq!(resolved.crawl, CrawlConfig::default());
        assert_eq!(resolved.results_dir, PathBuf::from("results"));
    }

    #[test]
    fn test_cli_beats_env_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("crawl.json");
        std::fs::write(
            &file,
            r#"{
                "scheduler": {"initial_chunk_size": 3},
                "navigation_timeout_ms": 1000,
                "idle_timeout_ms": 500,
                "results_dir": "from-file"
            }"#,
        )
        .unwrap();

        let env = env_from(&[
            ("COOKIECRAWLER_CONFIG", file.to_str().unwrap()),
            ("COOKIECRAWLER_INITIAL_CHUNK", "7"),
            ("COOKIECRAWLER_NAVIGATION_TIMEOUT_MS", "2000"),
            ("COOKIECRAWLER_LANGUAGES", "en"),
        ]);
        let overrides = CrawlOverrides {
            initial_chunk: Some(12),
            ..CrawlOverrides::default()
        };

        let resolved = resolve_with(&overrides, env).unwrap();
        assert_eq!(resolved.crawl.scheduler.initial_chunk_size, 12);
        assert_eq!(resolved.crawl.navigation_timeout_ms, 2000);
        assert_eq!(resolved.crawl.idle_timeout_ms, 500);
        assert_eq!(resolved.crawl.languages, vec![Language::En]);
        // Untouched file values keep their defaults.
        assert_eq!(resolved.crawl.scheduler.grow_fast_step, 15);
        assert_eq!(resolved.results_dir, PathBuf::from("from-file"));
    }

    #[test]
    fn test_invalid_env_value_is_rejected() {
        let env = env_from(&[("COOKIECRAWLER_INITIAL_CHUNK", "many")]);
        let err = resolve_with(&CrawlOverrides::default(), env).unwrap_err();
        assert!(err.to_string().contains("COOKIECRAWLER_INITIAL_CHUNK"));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let overrides = CrawlOverrides {
            config_file: Some(PathBuf::from("/nonexistent/crawl.json")),
            ..CrawlOverrides::default()
        };
        assert!(resolve_with(&overrides, env_from(&[])).is_err());
    }

    #[test]
    fn test_parse_languages() {
        assert_eq!(
            parse_languages("en, de,en").unwrap(),
            vec![Language::En, Language::De]
        );
        assert!(parse_languages("fr").is_err());
        assert!(parse_languages(" , ").is_err());
    }
}
