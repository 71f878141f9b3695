// End-to-end crawls against a mock HTTP server

use sitemapper_scanner::{HttpFetcher, SitemapCrawler};
use std::num::NonZeroUsize;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

async fn mount_xml(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml; charset=utf-8")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

/// Same as `mount_xml`, but the server fails the test if the route is hit
/// more than once
async fn mount_xml_once(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_nested_index_over_http() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_xml(
        &mock_server,
        "/sitemap_index.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>{base}/sitemap-posts.xml</loc></sitemap>
              <sitemap><loc>{base}/sitemap-pages.xml</loc></sitemap>
            </sitemapindex>"#
        ),
    )
    .await;

    mount_xml(
        &mock_server,
        "/sitemap-posts.xml",
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>https://blog.example/post/1</loc></url>
              <url><loc>https://blog.example/post/2</loc></url>
            </urlset>"#
            .to_string(),
    )
    .await;

    mount_xml(
        &mock_server,
        "/sitemap-pages.xml",
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>https://blog.example/about</loc></url>
              <url><loc>https://blog.example/post/1</loc></url>
            </urlset>"#
            .to_string(),
    )
    .await;

    let crawler = SitemapCrawler::new(HttpFetcher::new().unwrap());
    let result = crawler
        .crawl(&[format!("{}/sitemap_index.xml", base)])
        .await;

    assert_eq!(
        result.urls,
        vec![
            "https://blog.example/about",
            "https://blog.example/post/1",
            "https://blog.example/post/2",
        ]
    );
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_http_error_is_recorded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone.xml"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let seed = format!("{}/gone.xml", mock_server.uri());
    let crawler = SitemapCrawler::new(HttpFetcher::new().unwrap());
    let result = crawler.crawl(&[seed.clone()]).await;

    assert!(result.urls.is_empty());
    assert_eq!(result.errors, vec![format!("Failed {}: HTTP status 410 Gone", seed)]);
}

#[tokio::test]
async fn test_empty_body_is_recorded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/empty.xml"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let seed = format!("{}/empty.xml", mock_server.uri());
    let crawler = SitemapCrawler::new(HttpFetcher::new().unwrap());
    let result = crawler.crawl(&[seed.clone()]).await;

    assert!(result.urls.is_empty());
    assert_eq!(result.errors, vec![format!("Empty response from {}", seed)]);
}

#[tokio::test]
async fn test_cyclic_indexes_are_fetched_once() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_xml_once(
        &mock_server,
        "/a.xml",
        format!(
            "<sitemapindex><sitemap><loc>{base}/b.xml</loc></sitemap></sitemapindex>"
        ),
    )
    .await;
    mount_xml_once(
        &mock_server,
        "/b.xml",
        format!(
            "<sitemapindex><sitemap><loc>{base}/a.xml</loc></sitemap><sitemap><loc>{base}/leaf.xml</loc></sitemap></sitemapindex>"
        ),
    )
    .await;
    mount_xml_once(
        &mock_server,
        "/leaf.xml",
        "<urlset><url><loc>https://cycle.example/only</loc></url></urlset>".to_string(),
    )
    .await;

    let crawler = SitemapCrawler::new(HttpFetcher::new().unwrap()).with_max_depth(20);
    let result = crawler.crawl(&[format!("{}/a.xml", base)]).await;

    assert_eq!(result.urls, vec!["https://cycle.example/only"]);
    assert!(result.errors.is_empty());
    // Expectations on the mocks are verified when the server drops
}

#[tokio::test]
async fn test_limit_leaves_remaining_sitemaps_unfetched() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_xml(
        &mock_server,
        "/index.xml",
        format!(
            "<sitemapindex><sitemap><loc>{base}/never.xml</loc></sitemap><sitemap><loc>{base}/big.xml</loc></sitemap></sitemapindex>"
        ),
    )
    .await;
    mount_xml(
        &mock_server,
        "/big.xml",
        (1..=50)
            .map(|i| format!("<url><loc>https://big.example/{}</loc></url>", i))
            .fold(String::from("<urlset>"), |acc, u| acc + &u)
            + "</urlset>",
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/never.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<urlset></urlset>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let crawler = SitemapCrawler::new(HttpFetcher::new().unwrap())
        .with_url_limit(NonZeroUsize::new(10));
    let result = crawler.crawl(&[format!("{}/index.xml", base)]).await;

    assert_eq!(result.urls.len(), 10);
    assert_eq!(result.urls[0], "https://big.example/1");
    assert_eq!(result.urls[9], "https://big.example/10");
}
