// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Terminal output helpers: progress bar and styles.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bar for page visits. Its length is set once the sitemap is read.
pub fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.green} [{bar:40.green/dim}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("█▓░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Render milliseconds as `1m 05s` / `12.3s`.
pub fn format_elapsed(ms: u64) -> String {
    if ms >= 60_000 {
        format!("{}m {:02}s", ms / 60_000, (ms % 60_000) / 1000)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}
