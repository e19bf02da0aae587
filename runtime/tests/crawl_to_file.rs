//! Sitemap over HTTP → scripted pages → report file on disk.

use assert_json_diff::assert_json_include;
use async_trait::async_trait;
use cookiecrawler::{
    CrawlConfig, CrawlOrchestrator, PageObservation, PageSession, PageVisit, SessionError,
};
use cookiecrawler_runtime::acquisition::sitemap::HttpSitemapSource;
use cookiecrawler_runtime::renderer::DeferredCleanup;
use cookiecrawler_runtime::report_file::JsonReportSink;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Every page sets the same analytics cookie and one storage key.
struct UniformSession;

#[async_trait]
impl PageSession for UniformSession {
    async fn visit(
        &self,
        url: &str,
        _consent_selector: Option<&str>,
    ) -> Result<PageVisit, SessionError> {
        let now = chrono::Utc::now().timestamp_millis();
        Ok(PageVisit {
            observations: vec![
                PageObservation::cookie(".x.com", "_ga", "/", -1.0, url, now),
                PageObservation::local_storage("https://x.com", "theme", url, now),
            ],
            load_samples: vec![0.3],
        })
    }
}

#[tokio::test]
async fn test_report_file_aggregates_all_pages() {
    let server = MockServer::start().await;
    let base = server.uri();
    let body = format!(
        "<urlset><url><loc>{base}/1</loc></url><url><loc>{base}/2</loc></url>\
         <url><loc>{base}/3</loc></url></urlset>"
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let sink = JsonReportSink::new(dir.path());
    let sitemap_url = format!("{base}/sitemap.xml");

    let report = CrawlOrchestrator::new(CrawlConfig::default(), Arc::new(UniformSession))
        .run(&HttpSitemapSource::new(5_000), &sitemap_url, &sink)
        .await
        .unwrap();
    assert_eq!(report.summary.pages_succeeded, 3);

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(sink.path_for(&sitemap_url)).unwrap())
            .unwrap();
    let findings = written["findings"].as_object().unwrap();
    assert_eq!(findings.len(), 2);

    let cookie = findings.values().find(|v| v["type"] == "cookie").unwrap();
    assert_json_include!(
        actual: cookie.clone(),
        expected: json!({
            "name": "_ga",
            "domain": ".x.com",
            "count": 3,
            "expiresTimestamp": null,
            "expiresReadable": {"de": "Session", "en": "Session"},
            "urls": [format!("{base}/1"), format!("{base}/2"), format!("{base}/3")]
        })
    );

    let storage = findings
        .values()
        .find(|v| v["type"] == "localStorage")
        .unwrap();
    assert_eq!(storage["origin"], "https://x.com");
    assert_eq!(storage["count"], 3);
}

/// Opens a "context" per visit and hangs far past the session timeout.
struct HangingSession {
    open: Arc<AtomicUsize>,
}

#[async_trait]
impl PageSession for HangingSession {
    async fn visit(
        &self,
        _url: &str,
        _consent_selector: Option<&str>,
    ) -> Result<PageVisit, SessionError> {
        self.open.fetch_add(1, Ordering::SeqCst);
        let open = Arc::clone(&self.open);
        let teardown = DeferredCleanup::new(async move {
            open.fetch_sub(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_secs(5)).await;
        teardown.run().await;
        Ok(PageVisit::default())
    }
}

#[tokio::test]
async fn test_timed_out_visits_release_their_contexts() {
    let open = Arc::new(AtomicUsize::new(0));
    let config = CrawlConfig {
        session_timeout_ms: 100,
        ..CrawlConfig::default()
    };
    let session = Arc::new(HangingSession {
        open: Arc::clone(&open),
    });

    let report = CrawlOrchestrator::new(config, session)
        .crawl(
            "https://x.com/sitemap.xml",
            vec!["https://x.com/1".into(), "https://x.com/2".into()],
        )
        .await
        .unwrap();
    assert_eq!(report.summary.failures.len(), 2);
    assert_eq!(report.summary.pages_attempted, 2);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(open.load(Ordering::SeqCst), 0);
}
