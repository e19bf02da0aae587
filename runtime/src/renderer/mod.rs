// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Headless Chromium: locating the binary and launching it.
//!
//! The actual page visit lives in [`chromium::ChromiumSession`].

pub mod chromium;

use std::future::Future;
use std::path::PathBuf;

/// Time kept back from the session timeout so a visit can tear down its
/// browser context before the orchestrator gives up on it.
const TEARDOWN_MARGIN_MS: u64 = 2_000;

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. COOKIECRAWLER_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("COOKIECRAWLER_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.cookiecrawler/chromium/
    if let Some(home) = dirs::home_dir() {
        let base = home.join(".cookiecrawler/chromium");
        let candidates = if cfg!(target_os = "macos") {
            vec![
                base.join("chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                base.join("chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                base.join("chrome"),
            ]
        } else {
            vec![base.join("chrome-linux64/chrome"), base.join("chrome")]
        };
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launch settings for the shared browser.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Explicit binary; falls back to [`find_chromium`].
    pub executable: Option<PathBuf>,
    pub navigation_timeout_ms: u64,
    pub idle_timeout_ms: u64,
    /// Budget for one whole visit, from context creation to extraction.
    pub visit_timeout_ms: u64,
    pub headless: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            navigation_timeout_ms: 60_000,
            idle_timeout_ms: 30_000,
            visit_timeout_ms: 120_000 - TEARDOWN_MARGIN_MS,
            headless: true,
        }
    }
}

impl BrowserSettings {
    pub fn from_config(config: &cookiecrawler::CrawlConfig) -> Self {
        Self {
            navigation_timeout_ms: config.navigation_timeout_ms,
            idle_timeout_ms: config.idle_timeout_ms,
            visit_timeout_ms: config
                .session_timeout_ms
                .saturating_sub(TEARDOWN_MARGIN_MS)
                .max(1),
            ..Self::default()
        }
    }

    /// Command-line switches passed to Chromium.
    pub fn launch_args(&self) -> Vec<&'static str> {
        let mut args = vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-extensions",
            "--disable-background-networking",
            // Keeps cross-site iframes in the page's own frame tree.
            "--disable-features=IsolateOrigins,site-per-process",
        ];
        if self.headless {
            args.insert(0, "--headless=new");
        }
        args
    }
}

/// An async cleanup step that runs exactly once.
///
/// [`run`](Self::run) awaits it in place. If the guard is dropped first,
/// for instance because the future holding it was cancelled by a timeout,
/// the cleanup is spawned onto the current tokio runtime instead.
pub struct DeferredCleanup<F>
where
    F: Future<Output = ()> + Send + 'static,
{
    cleanup: Option<F>,
}

impl<F> DeferredCleanup<F>
where
    F: Future<Output = ()> + Send + 'static,
{
    pub fn new(cleanup: F) -> Self {
        Self {
            cleanup: Some(cleanup),
        }
    }

    pub async fn run(mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup.await;
        }
    }
}

impl<F> Drop for DeferredCleanup<F>
where
    F: Future<Output = ()> + Send + 'static,
{
    fn drop(&mut self) {
        let Some(cleanup) = self.cleanup.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(cleanup);
            }
            Err(_) => tracing::warn!("no tokio runtime left, cleanup skipped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn counting_cleanup(
        count: &Arc<AtomicUsize>,
    ) -> DeferredCleanup<impl Future<Output = ()> + Send + 'static> {
        let count = Arc::clone(count);
        DeferredCleanup::new(async move {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_cleanup_runs_once_when_awaited() {
        let count = Arc::new(AtomicUsize::new(0));
        counting_cleanup(&count).run().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cleanup_runs_when_timeout_cancels_the_holder() {
        let count = Arc::new(AtomicUsize::new(0));
        let guard = counting_cleanup(&count);
        let slow_visit = async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            guard.run().await;
        };

        let outcome = tokio::time::timeout(Duration::from_millis(20), slow_visit).await;
        assert!(outcome.is_err());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_launch_args_headless_first() {
        let args = BrowserSettings::default().launch_args();
        assert_eq!(args[0], "--headless=new");
        assert!(args.contains(&"--no-sandbox"));

        let headed = BrowserSettings {
            headless: false,
            ..BrowserSettings::default()
        };
        assert!(!headed.launch_args().contains(&"--headless=new"));
    }

    #[test]
    fn test_settings_follow_crawl_config() {
        let config = cookiecrawler::CrawlConfig {
            navigation_timeout_ms: 5_000,
            ..Default::default()
        };
        let settings = BrowserSettings::from_config(&config);
        assert_eq!(settings.navigation_timeout_ms, 5_000);
        assert_eq!(settings.idle_timeout_ms, config.idle_timeout_ms);
        // A visit gives up before the orchestrator does.
        assert!(settings.visit_timeout_ms < config.session_timeout_ms);
        assert_eq!(
            settings.visit_timeout_ms,
            config.session_timeout_ms - TEARDOWN_MARGIN_MS
        );
    }
}
