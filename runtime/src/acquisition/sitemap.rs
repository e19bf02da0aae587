// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fetch and parse sitemap.xml and sitemap index files.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cookiecrawler::{CrawlError, SitemapSource};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashSet;

use super::http_client::HttpClient;

/// A page entry from a sitemap.
#[derive(Debug, Clone)]
pub struct SitemapEntry {
    pub url: String,
    pub lastmod: Option<DateTime<Utc>>,
}

/// A parsed sitemap document.
///
/// A `<urlset>` fills `pages`, a `<sitemapindex>` fills `children`.
#[derive(Debug, Clone, Default)]
pub struct SitemapDocument {
    pub pages: Vec<SitemapEntry>,
    pub children: Vec<String>,
}

/// Parse a sitemap XML string.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, CrawlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut doc = SitemapDocument::default();
    let mut buf = Vec::new();

    let mut in_url = false;
    let mut in_sitemap = false;
    let mut current_tag = String::new();
    let mut current_loc = String::new();
    let mut current_lastmod = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "url" => {
                        in_url = true;
                        current_loc.clear();
                        current_lastmod.clear();
                    }
                    "sitemap" => {
                        in_sitemap = true;
                        current_loc.clear();
                    }
                    _ => current_tag = name,
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "url" if in_url => {
                        if !current_loc.is_empty() {
                            doc.pages.push(SitemapEntry {
                                url: current_loc.clone(),
                                lastmod: parse_date(&current_lastmod),
                            });
                        }
                        in_url = false;
                    }
                    "sitemap" if in_sitemap => {
                        if !current_loc.is_empty() {
                            doc.children.push(current_loc.clone());
                        }
                        in_sitemap = false;
                    }
                    _ => current_tag.clear(),
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default();
                let text = text.trim();
                if (in_url || in_sitemap) && current_tag == "loc" {
                    current_loc = text.to_string();
                } else if in_url && current_tag == "lastmod" {
                    current_lastmod = text.to_string();
                }
            }
            Ok(Event::CData(e)) => {
                if (in_url || in_sitemap) && current_tag == "loc" {
                    current_loc = String::from_utf8_lossy(&e).trim().to_string();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CrawlError::SitemapParse(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(doc)
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = s.parse::<DateTime<Utc>>() {
        return Some(dt);
    }
    chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

/// Only absolute http(s) URLs are crawlable.
fn validate_url(raw: &str) -> Result<url::Url, CrawlError> {
    let parsed =
        url::Url::parse(raw).map_err(|e| CrawlError::InvalidSitemapUrl(format!("{raw}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(CrawlError::InvalidSitemapUrl(format!(
            "{raw}: unsupported scheme '{other}'"
        ))),
    }
}

/// Reads page URLs from a sitemap served over HTTP.
///
/// A sitemap index is followed one level deep. Children that fail to load
/// are skipped with a warning; the top-level document failing is fatal.
pub struct HttpSitemapSource {
    client: HttpClient,
}

impl HttpSitemapSource {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            client: HttpClient::new(timeout_ms),
        }
    }

    async fn fetch_document(&self, url: &str) -> Result<SitemapDocument, CrawlError> {
        let resp = self
            .client
            .get(url)
            .await
            .map_err(|e| CrawlError::SitemapFetch {
                url: url.to_string(),
                reason: format!("{e:#}"),
            })?;
        if !resp.is_success() {
            return Err(CrawlError::SitemapFetch {
                url: url.to_string(),
                reason: format!("HTTP {}", resp.status),
            });
        }
        parse_sitemap(&resp.body)
    }
}

#[async_trait]
impl SitemapSource for HttpSitemapSource {
    async fn fetch_urls(&self, sitemap_url: &str) -> Result<Vec<String>, CrawlError> {
        validate_url(sitemap_url)?;
        let root = self.fetch_document(sitemap_url).await?;

        let mut pages = root.pages;
        for child in &root.children {
            if validate_url(child).is_err() {
                tracing::warn!(child = %child, "skipping invalid nested sitemap URL");
                continue;
            }
            match self.fetch_document(child).await {
                Ok(doc) => {
                    if !doc.children.is_empty() {
                        tracing::debug!(
                            child = %child,
                            nested = doc.children.len(),
                            "ignoring sitemap index nested deeper than one level"
                        );
                    }
                    pages.extend(doc.pages);
                }
                Err(e) => tracing::warn!(child = %child, error = %e, "nested sitemap skipped"),
            }
        }

        let mut seen = HashSet::new();
        let urls: Vec<String> = pages
            .into_iter()
            .map(|entry| entry.url)
            .filter(|url| seen.insert(url.clone()))
            .collect();

        tracing::debug!(sitemap = sitemap_url, urls = urls.len(), "sitemap parsed");
        Ok(urls)
    }
}
