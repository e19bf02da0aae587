// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Writes crawl reports as pretty-printed JSON files.

use cookiecrawler::{CrawlError, CrawlReport, ReportSink};
use std::path::{Path, PathBuf};

/// One `<dir>/<stem>.json` file per crawled sitemap.
#[derive(Debug, Clone)]
pub struct JsonReportSink {
    dir: PathBuf,
}

impl JsonReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Report path for a sitemap URL.
    pub fn path_for(&self, target: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(target)))
    }
}

/// Letters and digits of the target, so the URL maps to a flat file name.
fn file_stem(target: &str) -> String {
    let stem: String = target.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if stem.is_empty() {
        "report".to_string()
    } else {
        stem
    }
}

impl ReportSink for JsonReportSink {
    fn write(&self, report: &CrawlReport) -> Result<(), CrawlError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&report.target);
        let data = serde_json::to_string_pretty(report)?;
        std::fs::write(&path, data)
            .map_err(|e| CrawlError::Report(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), findings = report.findings.len(), "report written");
        Ok(())
    }
}
