// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Crawl configuration with defaults for every tunable.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::sampler::DEFAULT_CAPACITY;
use crate::types::Language;

/// Admission-control tunables for [`crate::scheduler::ChunkScheduler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// URLs in the first wave.
    pub initial_chunk_size: usize,
    /// Average load at or below which the chunk grows by `grow_fast_step`.
    pub grow_fast_threshold: f64,
    pub grow_fast_step: usize,
    /// Average load at or below which the chunk grows by `grow_slow_step`.
    pub max_load_threshold: f64,
    pub grow_slow_step: usize,
    /// Applied when the load exceeds `max_load_threshold`.
    pub shrink_step: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_chunk_size: 10,
            grow_fast_threshold: 0.9,
            grow_fast_step: 15,
            max_load_threshold: 0.9,
            grow_slow_step: 5,
            shrink_step: 1,
        }
    }
}

/// Everything the orchestrator needs to know about a crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub scheduler: SchedulerConfig,
    /// Time-box for the navigation step of each visit.
    pub navigation_timeout_ms: u64,
    /// Upper bound for waiting on network idle after navigation.
    pub idle_timeout_ms: u64,
    /// Hard limit for a whole visit, enforced by the orchestrator.
    pub session_timeout_ms: u64,
    pub languages: Vec<Language>,
    /// CSS selector of the "accept all" button of the consent dialog.
    pub consent_selector: Option<String>,
    /// Give failed URLs one more pass after the queue drains.
    pub retry_failed: bool,
    pub sampler_capacity: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            navigation_timeout_ms: 60_000,
            idle_timeout_ms: 30_000,
            session_timeout_ms: 120_000,
            languages: vec![Language::De, Language::En],
            consent_selector: None,
            retry_failed: false,
            sampler_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CrawlConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CrawlConfig = serde_json::from_str(
            r#"{"consent_selector": ".cm-btn-accept-all", "scheduler": {"initial_chunk_size": 4}}"#,
        )
        .unwrap();
        assert_eq!(config.consent_selector.as_deref(), Some(".cm-btn-accept-all"));
        assert_eq!(config.scheduler.initial_chunk_size, 4);
        assert_eq!(config.scheduler.grow_fast_step, 15);
        assert_eq!(config.navigation_timeout_ms, 60_000);
        assert_eq!(config.languages, vec![Language::De, Language::En]);
    }
}
