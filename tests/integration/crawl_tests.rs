//! Integration tests for the text crawl
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use crate::{create_test_config, create_test_png, html_page};
use hotel_scout::crawler::Coordinator;
use hotel_scout::images::site_id_from_url;
use hotel_scout::CrawlPhase;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

fn base_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/", server.uri())).expect("Failed to parse base URL")
}

#[tokio::test]
async fn test_page_cap_limits_text_entries() {
    let server = MockServer::start().await;

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/page-{}">Page {}</a>"#, i, i))
        .collect();
    mount_html(&server, "/", html_page("Home", &links)).await;
    for i in 0..10 {
        mount_html(&server, &format!("/page-{}", i), html_page(&format!("Page {}", i), "")).await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawler.page_cap = 3;

    let coordinator = Coordinator::new(&config, base_url(&server)).expect("Failed to create coordinator");
    let outcome = coordinator.run().await.expect("Crawl failed");

    assert_eq!(outcome.pages.len(), 3);
    assert_eq!(outcome.visited, 3);
    assert_eq!(outcome.phase, CrawlPhase::Completed);

    let root = server.uri();
    assert!(outcome.pages.contains_key(&root));
    assert!(outcome.pages.contains_key(&format!("{}/page-0", root)));
    assert!(outcome.pages.contains_key(&format!("{}/page-1", root)));
}

#[tokio::test]
async fn test_failing_pages_are_skipped() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        html_page(
            "Home",
            r#"<a href="/ok">Fine</a><a href="/broken">Broken</a><a href="/missing">Missing</a>"#,
        ),
    )
    .await;
    mount_html(&server, "/ok", html_page("Fine", "<p>All good</p>")).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let outcome = Coordinator::new(&config, base_url(&server))
        .unwrap()
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.pages.len(), 2);
    assert_eq!(outcome.failed, 2);
    assert_eq!(outcome.visited, 4);
    assert!(outcome.pages[&format!("{}/ok", server.uri())].contains("All good"));
}

#[tokio::test]
async fn test_booking_pages_are_throttled() {
    let server = MockServer::start().await;

    let links: String = (1..=4)
        .map(|i| format!(r#"<a href="/booking/room-{}">Room {}</a>"#, i, i))
        .collect();
    mount_html(&server, "/", html_page("Home", &links)).await;

    for i in 1..=4 {
        let expected = if i <= 2 { 1 } else { 0 };
        Mock::given(method("GET"))
            .and(path(format!("/booking/room-{}", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(html_page("Room", ""), "text/html"),
            )
            .expect(expected)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawler.max_booking_visits = 2;

    let outcome = Coordinator::new(&config, base_url(&server))
        .unwrap()
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.booking_fetched, 2);
    assert_eq!(outcome.pages.len(), 3);
}

#[tokio::test]
async fn test_trailing_slash_and_fragment_variants_fetched_once() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        html_page(
            "Home",
            r##"<a href="/suites">Suites</a><a href="/suites/">Suites</a><a href="/suites#view">View</a>"##,
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/suites"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Suites", r#"<a href="/">Home</a>"#), "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let outcome = Coordinator::new(&config, base_url(&server))
        .unwrap()
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.pages.len(), 2);
    assert_eq!(outcome.visited, 2);
}

#[tokio::test]
async fn test_images_harvested_during_crawl() {
    let server = MockServer::start().await;

    mount_html(&server, "/", html_page("Home", r#"<img src="/photos/lobby.png">"#)).await;
    Mock::given(method("GET"))
        .and(path("/photos/lobby.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(create_test_png(1200, 800, 60 * 1024), "image/png"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.images.during_crawl = true;

    let base = base_url(&server);
    let outcome = Coordinator::new(&config, base.clone())
        .unwrap()
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.images_saved, 1);
    let image_dir = config.output.images_dir().join(site_id_from_url(&base));
    assert!(image_dir.join("lobby.png").exists());
}
