// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Chromium-backed page session using chromiumoxide.
//!
//! Every visit runs in its own incognito browser context so that no cookie
//! or storage entry leaks from one page into the next.

use super::{find_chromium, BrowserSettings, DeferredCleanup};
use crate::load_monitor::LoadMonitor;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::dom_storage::{
    EnableParams as DomStorageEnableParams, GetDomStorageItemsParams, StorageId,
};
use chromiumoxide::cdp::browser_protocol::network::Cookie;
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, FrameTree, GetFrameTreeParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::cdp::browser_protocol::storage::GetCookiesParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::Page;
use cookiecrawler::{PageObservation, PageSession, PageVisit, SessionError};
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Identifies the `networkIdle` event of one loaded document.
///
/// The frame id survives navigation, so about:blank and the navigated page
/// share it. Only the loader id tells their lifecycle events apart.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IdleWatch {
    frame_id: String,
    loader_id: String,
}

impl IdleWatch {
    fn is_idle(&self, frame_id: &str, loader_id: &str, name: &str) -> bool {
        name == "networkIdle" && frame_id == self.frame_id && loader_id == self.loader_id
    }
}

/// Security origins of every frame in the tree, parents first.
fn frame_origins<'a>(tree: &'a FrameTree, out: &mut Vec<&'a str>) {
    out.push(tree.frame.security_origin.as_str());
    for child in tree.child_frames.iter().flatten() {
        frame_origins(child, out);
    }
}

/// Deduplicated http(s) origins in first-seen order. Opaque origins such as
/// `null` or `://` have no readable storage.
fn storage_origins<'a>(origins: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for origin in origins {
        let web = origin.starts_with("https://") || origin.starts_with("http://");
        if web && !unique.iter().any(|o| o == origin) {
            unique.push(origin.to_string());
        }
    }
    unique
}

/// Keys of a `DOMStorage.getDOMStorageItems` result, each item being a
/// `[key, value]` pair.
fn item_keys(entries: serde_json::Value) -> Vec<String> {
    serde_json::from_value::<Vec<Vec<String>>>(entries)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|pair| pair.into_iter().next())
        .collect()
}

async fn dispose_context(
    browser: Arc<Browser>,
    context_id: BrowserContextId,
    active: Arc<AtomicUsize>,
) {
    if let Err(e) = browser
        .execute(DisposeBrowserContextParams::new(context_id))
        .await
    {
        tracing::warn!(error = %e, "failed to dispose browser context");
    }
    active.fetch_sub(1, Ordering::Relaxed);
}

/// Visits pages in a shared headless Chromium.
pub struct ChromiumSession {
    browser: Arc<Browser>,
    monitor: Arc<LoadMonitor>,
    settings: BrowserSettings,
    active: Arc<AtomicUsize>,
}

impl ChromiumSession {
    /// Launch a headless Chromium instance.
    pub async fn launch(settings: BrowserSettings) -> Result<Self> {
        let chrome_path = match settings.executable.clone() {
            Some(path) => path,
            None => find_chromium()
                .context("Chromium not found. Set COOKIECRAWLER_CHROMIUM_PATH or install Chrome.")?,
        };

        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);
        for arg in settings.launch_args() {
            builder = builder.arg(arg);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!(error = %e, "browser handler event error");
                }
            }
        });

        tracing::info!("Chromium launched");
        Ok(Self {
            browser: Arc::new(browser),
            monitor: Arc::new(LoadMonitor::new()),
            settings,
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Number of visits currently holding a browser context.
    pub fn active_visits(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    async fn open_context(&self, url: &str) -> Result<BrowserContextId, SessionError> {
        let created = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| SessionError::Browser(format!("create context for {url}: {e}")))?;
        Ok(created.result.browser_context_id.clone())
    }

    async fn visit_in_context(
        &self,
        url: &str,
        context_id: &BrowserContextId,
        consent_selector: Option<&str>,
    ) -> Result<PageVisit, SessionError> {
        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(SessionError::Browser)?;
        let page = self
            .browser
            .new_page(target)
            .await
            .map_err(|e| SessionError::Browser(format!("open page for {url}: {e}")))?;

        let result = self.drive_page(&page, url, context_id, consent_selector).await;
        if let Err(e) = page.close().await {
            tracing::debug!(url, error = %e, "page close failed");
        }
        result
    }

    async fn drive_page(
        &self,
        page: &Page,
        url: &str,
        context_id: &BrowserContextId,
        consent_selector: Option<&str>,
    ) -> Result<PageVisit, SessionError> {
        let mut visit = PageVisit::default();
        let browser_err = |e: chromiumoxide::error::CdpError| SessionError::Browser(e.to_string());
        let extraction_err = |what: &str, e: String| SessionError::Extraction {
            url: url.to_string(),
            reason: format!("{what}: {e}"),
        };

        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(browser_err)?;
        let mut lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(browser_err)?;

        let nav_timeout = Duration::from_millis(self.settings.navigation_timeout_ms);
        match tokio::time::timeout(nav_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(SessionError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(SessionError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: self.settings.navigation_timeout_ms,
                })
            }
        }
        visit.load_samples.push(self.monitor.sample());

        // The document the navigation committed, not the about:blank before it.
        let committed = page
            .execute(GetFrameTreeParams::default())
            .await
            .map_err(|e| extraction_err("frame tree", e.to_string()))?;
        let watch = IdleWatch {
            frame_id: committed.result.frame_tree.frame.id.inner().clone(),
            loader_id: committed.result.frame_tree.frame.loader_id.inner().clone(),
        };

        if let Some(selector) = consent_selector {
            self.click_consent(page, url, selector).await?;
        }
        visit.load_samples.push(self.monitor.sample());

        self.wait_for_network_idle(url, &watch, &mut lifecycle).await;
        let observed_at = chrono::Utc::now().timestamp_millis();

        let cookies: Vec<Cookie> = self
            .browser
            .execute(
                GetCookiesParams::builder()
                    .browser_context_id(context_id.clone())
                    .build(),
            )
            .await
            .map_err(|e| extraction_err("cookies", e.to_string()))?
            .result
            .cookies
            .clone();

        for cookie in cookies {
            let mut observation = PageObservation::cookie(
                cookie.domain,
                cookie.name,
                cookie.path,
                cookie.expires,
                url,
                observed_at,
            );
            if let Some(same_site) = cookie.same_site {
                observation = observation.with_same_site(format!("{same_site:?}"));
            }
            visit.observations.push(observation);
        }

        // Iframes have loaded by now, so the tree is read again.
        let loaded = page
            .execute(GetFrameTreeParams::default())
            .await
            .map_err(|e| extraction_err("frame tree", e.to_string()))?;
        let mut origins = Vec::new();
        frame_origins(&loaded.result.frame_tree, &mut origins);

        page.execute(DomStorageEnableParams::default())
            .await
            .map_err(|e| extraction_err("localStorage", e.to_string()))?;
        for origin in storage_origins(origins) {
            match self.read_local_storage(page, &origin).await {
                Ok(keys) => {
                    for key in keys {
                        visit.observations.push(PageObservation::local_storage(
                            origin.clone(),
                            key,
                            url,
                            observed_at,
                        ));
                    }
                }
                Err(reason) => {
                    tracing::debug!(url, origin = %origin, %reason, "localStorage not readable");
                }
            }
        }
        visit.load_samples.push(self.monitor.sample());

        Ok(visit)
    }

    /// localStorage keys of one origin loaded in `page`.
    async fn read_local_storage(&self, page: &Page, origin: &str) -> Result<Vec<String>, String> {
        let storage_id = StorageId::builder()
            .security_origin(origin)
            .is_local_storage(true)
            .build()?;
        let items = page
            .execute(GetDomStorageItemsParams::new(storage_id))
            .await
            .map_err(|e| e.to_string())?;
        let entries = serde_json::to_value(&items.result.entries).map_err(|e| e.to_string())?;
        Ok(item_keys(entries))
    }

    /// Clicks the consent element when it is present and visible.
    async fn click_consent(
        &self,
        page: &Page,
        url: &str,
        selector: &str,
    ) -> Result<(), SessionError> {
        let consent_err = |reason: String| SessionError::Consent {
            url: url.to_string(),
            reason,
        };
        let quoted = serde_json::to_string(selector).map_err(|e| consent_err(e.to_string()))?;
        let visible_js = format!(
            "(() => {{ const el = document.querySelector({quoted}); \
             if (!el) return false; \
             const r = el.getBoundingClientRect(); \
             const s = window.getComputedStyle(el); \
             return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; }})()"
        );
        let visible: bool = page
            .evaluate(visible_js)
            .await
            .map_err(|e| consent_err(e.to_string()))?
            .into_value()
            .unwrap_or(false);
        if !visible {
            tracing::debug!(url, selector, "consent element not visible, skipping");
            return Ok(());
        }

        page.find_element(selector)
            .await
            .map_err(|e| consent_err(e.to_string()))?
            .click()
            .await
            .map_err(|e| consent_err(e.to_string()))?;
        tracing::debug!(url, selector, "consent accepted");
        Ok(())
    }

    /// Waits for `networkIdle` of the committed document.
    ///
    /// Timing out is not an error; extraction proceeds with what loaded.
    async fn wait_for_network_idle(
        &self,
        url: &str,
        watch: &IdleWatch,
        lifecycle: &mut (impl futures::Stream<Item = Arc<EventLifecycleEvent>> + Unpin),
    ) {
        let idle = async {
            while let Some(event) = lifecycle.next().await {
                if watch.is_idle(
                    event.frame_id.inner(),
                    event.loader_id.inner(),
                    &event.name,
                ) {
                    return;
                }
            }
        };
        let idle_timeout = Duration::from_millis(self.settings.idle_timeout_ms);
        if tokio::time::timeout(idle_timeout, idle).await.is_err() {
            tracing::debug!(url, timeout_ms = self.settings.idle_timeout_ms, "network never went idle");
        }
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn visit(
        &self,
        url: &str,
        consent_selector: Option<&str>,
    ) -> Result<PageVisit, SessionError> {
        let context_id = self.open_context(url).await?;
        self.active.fetch_add(1, Ordering::Relaxed);
        // Disposes the context even when the caller drops this future.
        let teardown = DeferredCleanup::new(dispose_context(
            Arc::clone(&self.browser),
            context_id.clone(),
            Arc::clone(&self.active),
        ));

        let budget = Duration::from_millis(self.settings.visit_timeout_ms);
        let result = match tokio::time::timeout(
            budget,
            self.visit_in_context(url, &context_id, consent_selector),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SessionError::Timeout {
                url: url.to_string(),
                timeout_ms: self.settings.visit_timeout_ms,
            }),
        };

        teardown.run().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookiecrawler::FindingKind;

    #[test]
    fn test_idle_watch_ignores_the_blank_document() {
        let watch = IdleWatch {
            frame_id: "F1".into(),
            loader_id: "L-site".into(),
        };
        // about:blank shares the frame but not the loader.
        assert!(!watch.is_idle("F1", "L-blank", "networkIdle"));
        assert!(!watch.is_idle("F1", "L-site", "load"));
        assert!(!watch.is_idle("F2", "L-site", "networkIdle"));
        assert!(watch.is_idle("F1", "L-site", "networkIdle"));
    }

    #[test]
    fn test_storage_origins_cover_frames_once() {
        let origins = storage_origins([
            "https://shop.example",
            "https://www.youtube-nocookie.com",
            "null",
            "://",
            "https://shop.example",
            "http://player.vimeo.com",
        ]);
        assert_eq!(
            origins,
            vec![
                "https://shop.example",
                "https://www.youtube-nocookie.com",
                "http://player.vimeo.com",
            ]
        );
    }

    #[test]
    fn test_item_keys_take_the_first_of_each_pair() {
        let entries = serde_json::json!([["theme", "dark"], ["cart", "[]"], []]);
        assert_eq!(item_keys(entries), vec!["theme", "cart"]);
        assert!(item_keys(serde_json::json!({"unexpected": true})).is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_visit_reads_cookies_and_storage() {
        let session = ChromiumSession::launch(BrowserSettings {
            navigation_timeout_ms: 10_000,
            idle_timeout_ms: 2_000,
            ..BrowserSettings::default()
        })
        .await
        .expect("failed to launch Chromium");

        let html = "data:text/html,<script>localStorage.setItem('theme','dark')</script><h1>Hi</h1>";
        let visit = session.visit(html, Some("#accept")).await.expect("visit failed");

        // Navigation, consent and extraction checkpoints.
        assert_eq!(visit.load_samples.len(), 3);
        assert!(visit
            .observations
            .iter()
            .all(|o| o.kind == FindingKind::LocalStorageItem || o.kind == FindingKind::Cookie));
        assert_eq!(session.active_visits(), 0);
    }
}
