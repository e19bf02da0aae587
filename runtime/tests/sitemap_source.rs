//! HTTP sitemap fetching against a local mock server.

use cookiecrawler::{CrawlError, SitemapSource};
use cookiecrawler_runtime::acquisition::sitemap::HttpSitemapSource;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn urlset(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|u| format!("<url><loc>{u}</loc></url>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</urlset>"#
    )
}

async fn serve(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_urlset_urls_in_document_order_without_duplicates() {
    let server = MockServer::start().await;
    let base = server.uri();
    let pages = vec![
        format!("{base}/"),
        format!("{base}/about"),
        format!("{base}/"),
        format!("{base}/contact"),
    ];
    serve(&server, "/sitemap.xml", 200, urlset(&pages)).await;

    let urls = HttpSitemapSource::new(5_000)
        .fetch_urls(&format!("{base}/sitemap.xml"))
        .await
        .unwrap();

    assert_eq!(
        urls,
        vec![
            format!("{base}/"),
            format!("{base}/about"),
            format!("{base}/contact")
        ]
    );
}

#[tokio::test]
async fn test_sitemap_index_is_followed_and_broken_children_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();
    let index = format!(
        r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{base}/pages.xml</loc></sitemap>
  <sitemap><loc>{base}/missing.xml</loc></sitemap>
  <sitemap><loc>{base}/blog.xml</loc></sitemap>
</sitemapindex>"#
    );
    serve(&server, "/sitemap.xml", 200, index).await;
    serve(&server, "/pages.xml", 200, urlset(&[format!("{base}/a")])).await;
    serve(&server, "/missing.xml", 404, String::new()).await;
    serve(
        &server,
        "/blog.xml",
        200,
        urlset(&[format!("{base}/b"), format!("{base}/a")]),
    )
    .await;

    let urls = HttpSitemapSource::new(5_000)
        .fetch_urls(&format!("{base}/sitemap.xml"))
        .await
        .unwrap();

    assert_eq!(urls, vec![format!("{base}/a"), format!("{base}/b")]);
}

#[tokio::test]
async fn test_top_level_http_error_is_fatal() {
    let server = MockServer::start().await;
    serve(&server, "/sitemap.xml", 404, String::new()).await;

    let err = HttpSitemapSource::new(5_000)
        .fetch_urls(&format!("{}/sitemap.xml", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, CrawlError::SitemapFetch { .. }));
    assert!(err.is_setup());
}

#[tokio::test]
async fn test_malformed_xml_is_a_parse_error() {
    let server = MockServer::start().await;
    serve(&server, "/sitemap.xml", 200, "<urlset><url></urlset>".into()).await;

    let err = HttpSitemapSource::new(5_000)
        .fetch_urls(&format!("{}/sitemap.xml", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, CrawlError::SitemapParse(_)));
}

#[tokio::test]
async fn test_non_http_url_is_rejected_before_fetching() {
    let err = HttpSitemapSource::new(5_000)
        .fetch_urls("file:///etc/sitemap.xml")
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlError::InvalidSitemapUrl(_)));
}
