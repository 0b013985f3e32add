//! Integration tests for the standalone image crawl

use crate::{create_test_config, create_test_png, html_page};
use hotel_scout::config::Config;
use hotel_scout::images::{content_hash, ImageHarvester, ImagePipeline};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MIN_BYTES: usize = 50 * 1024;

async fn mount_image(server: &MockServer, route: &str, bytes: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(bytes, "image/png"),
        )
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/html"),
        )
        .mount(server)
        .await;
}

/// Pipeline whose client gives up after 200ms, so slow responses count as timeouts
fn create_test_pipeline(config: &Config, dir: &std::path::Path) -> ImagePipeline {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    ImagePipeline::new(client, &config.images, dir)
}

fn single_image_page(server: &MockServer, route: &str) -> (Url, String) {
    let page = Url::parse(&format!("{}/", server.uri())).unwrap();
    (page, html_page("Home", &format!(r#"<img src="{}">"#, route)))
}

fn saved_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_identical_images_saved_once() {
    let server = MockServer::start().await;
    let photo = create_test_png(1600, 1200, 80 * 1024);

    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            r#"<img src="/photos/suite-a.png"><div style="background-image: url('/cdn/suite-copy.png')"></div>"#,
        ),
    )
    .await;
    mount_image(&server, "/photos/suite-a.png", photo.clone()).await;
    mount_image(&server, "/cdn/suite-copy.png", photo.clone()).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let base = Url::parse(&server.uri()).unwrap();

    let harvester = ImageHarvester::new(&config, base, Some("dedup")).unwrap();
    let report = harvester.run().await.expect("Image crawl failed");

    assert_eq!(report.candidates, 2);
    assert_eq!(report.saved, 1);
    assert_eq!(report.duplicates, 1);

    let files = saved_files(harvester.directory());
    assert_eq!(files.len(), 1);
    let stored = std::fs::read(harvester.directory().join(&files[0])).unwrap();
    assert_eq!(content_hash(&stored), content_hash(&photo));
}

#[tokio::test]
async fn test_qualification_boundaries() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            r#"
            <img src="/photos/exact.png">
            <img src="/photos/narrow.png">
            <img src="/photos/short.png">
            <img src="/photos/light.png">
            "#,
        ),
    )
    .await;
    mount_image(&server, "/photos/exact.png", create_test_png(800, 600, MIN_BYTES)).await;
    mount_image(&server, "/photos/narrow.png", create_test_png(799, 600, MIN_BYTES + 10)).await;
    mount_image(&server, "/photos/short.png", create_test_png(800, 599, MIN_BYTES + 20)).await;
    mount_image(&server, "/photos/light.png", create_test_png(800, 600, MIN_BYTES - 1)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let base = Url::parse(&server.uri()).unwrap();

    let harvester = ImageHarvester::new(&config, base, Some("boundaries")).unwrap();
    let report = harvester.run().await.expect("Image crawl failed");

    assert_eq!(report.saved, 1);
    assert_eq!(report.rejected, 3);
    assert_eq!(saved_files(harvester.directory()), vec!["exact.png"]);
}

#[tokio::test]
async fn test_priority_pages_visited() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            r#"<a href="/our-rooms">Our rooms</a><a href="/news">News</a><a href="/spa">Wellness</a>"#,
        ),
    )
    .await;
    mount_page(&server, "/our-rooms", html_page("Rooms", r#"<img src="/photos/room.png">"#)).await;
    mount_page(&server, "/spa", html_page("Spa", r#"<img src="/photos/pool.png">"#)).await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_image(&server, "/photos/room.png", create_test_png(1024, 768, 70 * 1024)).await;
    mount_image(&server, "/photos/pool.png", create_test_png(2048, 1536, 90 * 1024)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let base = Url::parse(&server.uri()).unwrap();

    let harvester = ImageHarvester::new(&config, base, None).unwrap();
    let report = harvester.run().await.expect("Image crawl failed");

    assert_eq!(report.pages_visited, 3);
    assert_eq!(report.saved, 2);
    assert_eq!(saved_files(harvester.directory()), vec!["pool.png", "room.png"]);
}

#[tokio::test]
async fn test_failing_images_do_not_stop_the_page() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html_page("Home", r#"<img src="/photos/gone.png"><img src="/photos/terrace.png">"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/photos/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_image(&server, "/photos/terrace.png", create_test_png(900, 700, 55 * 1024)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let base = Url::parse(&server.uri()).unwrap();

    let harvester = ImageHarvester::new(&config, base, Some("partial")).unwrap();
    let report = harvester.run().await.expect("Image crawl failed");

    assert_eq!(report.saved, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(saved_files(harvester.directory()), vec!["terrace.png"]);
}

#[tokio::test]
async fn test_priority_pages_found_beyond_landing() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", r#"<a href="/rooms">Rooms</a>"#)).await;
    mount_page(&server, "/rooms", html_page("Rooms", r#"<a href="/gallery">Gallery</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/gallery"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Gallery", r#"<img src="/photos/lobby.png">"#), "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_image(&server, "/photos/lobby.png", create_test_png(1200, 900, 60 * 1024)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let base = Url::parse(&server.uri()).unwrap();

    let harvester = ImageHarvester::new(&config, base, Some("gallery")).unwrap();
    let report = harvester.run().await.expect("Image crawl failed");

    assert_eq!(report.pages_visited, 3);
    assert_eq!(saved_files(harvester.directory()), vec!["lobby.png"]);
}

#[tokio::test]
async fn test_relative_images_resolved_after_redirect() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", r#"<a href="/old-rooms">Rooms</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/old-rooms"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/suites/"))
        .mount(&server)
        .await;
    mount_page(&server, "/suites/", html_page("Suites", r#"<img src="view.png">"#)).await;
    mount_image(&server, "/suites/view.png", create_test_png(1400, 1000, 64 * 1024)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let base = Url::parse(&server.uri()).unwrap();

    let harvester = ImageHarvester::new(&config, base, Some("redirect")).unwrap();
    let report = harvester.run().await.expect("Image crawl failed");

    assert_eq!(report.saved, 1);
    assert_eq!(saved_files(harvester.directory()), vec!["view.png"]);
}

#[tokio::test]
async fn test_head_length_below_minimum_skips_body() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/photos/icon.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![0u8; 1024], "image/png")
                .insert_header("content-length", "1024"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/photos/icon.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let pipeline = create_test_pipeline(&config, dir.path());
    pipeline.prepare().await.unwrap();

    let (page, html) = single_image_page(&server, "/photos/icon.png");
    let stats = pipeline.process_page(&page, &html).await;

    assert_eq!(stats.candidates, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.saved, 0);
}

#[tokio::test]
async fn test_head_non_image_type_skips_body() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/photos/tracker.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Not found", ""), "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/photos/tracker.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let pipeline = create_test_pipeline(&config, dir.path());
    pipeline.prepare().await.unwrap();

    let (page, html) = single_image_page(&server, "/photos/tracker.png");
    let stats = pipeline.process_page(&page, &html).await;

    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.saved, 0);
}

#[tokio::test]
async fn test_timeouts_retried_up_to_max_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/photos/slow.png"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/photos/slow.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.images.max_attempts = 3;
    let pipeline = create_test_pipeline(&config, dir.path());
    pipeline.prepare().await.unwrap();

    let (page, html) = single_image_page(&server, "/photos/slow.png");
    let stats = pipeline.process_page(&page, &html).await;

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.saved, 0);
}

#[tokio::test]
async fn test_timeout_then_success_saves_image() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/photos/terrace.png"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/photos/terrace.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(create_test_png(1000, 800, 60 * 1024), "image/png"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let pipeline = create_test_pipeline(&config, dir.path());
    pipeline.prepare().await.unwrap();

    let (page, html) = single_image_page(&server, "/photos/terrace.png");
    let stats = pipeline.process_page(&page, &html).await;

    assert_eq!(stats.saved, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_http_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/photos/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/photos/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let pipeline = create_test_pipeline(&config, dir.path());
    pipeline.prepare().await.unwrap();

    let (page, html) = single_image_page(&server, "/photos/gone.png");
    let stats = pipeline.process_page(&page, &html).await;

    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.failed, 0);
}
