//! Integration tests for the multi-stage site pipeline

use crate::{create_test_config, create_test_png, html_page};
use async_trait::async_trait;
use hotel_scout::output::load_scraped;
use hotel_scout::pipeline::{Mode, Pipeline};
use hotel_scout::structure::{StructureError, StructuringService};
use hotel_scout::HarvestError;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Structuring service returning a fixed document and recording its inputs
struct FixedStructurer {
    website: String,
    calls: Mutex<Vec<(String, Value)>>,
}

impl FixedStructurer {
    fn new(website: &str) -> Self {
        Self {
            website: website.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StructuringService for FixedStructurer {
    async fn structure(&self, id: &str, content: &Value) -> Result<Value, StructureError> {
        self.calls.lock().unwrap().push((id.to_string(), content.clone()));
        Ok(json!({
            "id": "grand-hotel",
            "property": { "name": "Grand Hotel", "contact": { "website": self.website } }
        }))
    }
}

/// Structuring service that always fails
struct FailingStructurer;

#[async_trait]
impl StructuringService for FailingStructurer {
    async fn structure(&self, _id: &str, _content: &Value) -> Result<Value, StructureError> {
        Err(StructureError::EmptyResponse)
    }
}

async fn create_hotel_site() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page(
                    "Grand Hotel",
                    r#"<nav><a href="/rooms">Rooms</a></nav><img src="/photos/facade.png">"#,
                ), "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rooms"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Rooms", "<p>Twelve rooms with a view</p>"), "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/photos/facade.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(create_test_png(1920, 1080, 100 * 1024), "image/png"),
        )
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_text_mode_saves_scraped_document() {
    let server = create_hotel_site().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let pipeline = Pipeline::new(config, Mode::Text);
    let result = pipeline.process_site(&server.uri(), None).await.expect("Pipeline failed");

    assert_eq!(result.pages, 2);
    assert!(result.images.is_none());
    assert!(result.structured_path.is_none());

    let scraped_path = result.scraped_path.expect("No scraped file");
    assert!(scraped_path.starts_with(dir.path().join("scraped")));

    let document = load_scraped(&scraped_path).await.unwrap();
    assert_eq!(document.content.len(), 2);
    assert!(document.content[&format!("{}/rooms", server.uri())].contains("Twelve rooms"));
}

#[tokio::test]
async fn test_full_mode_structures_then_harvests_images() {
    let server = create_hotel_site().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let structurer = Arc::new(FixedStructurer::new(&server.uri()));

    let pipeline = Pipeline::new(config, Mode::Full).with_structurer(structurer.clone());
    let result = pipeline.process_site(&server.uri(), None).await.expect("Pipeline failed");

    let calls = structurer.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (id, content) = &calls[0];
    assert!(result.scraped_path.as_ref().unwrap().ends_with(format!("{}.json", id)));
    assert_eq!(content["content"].as_object().unwrap().len(), 2);

    let structured_path = result.structured_path.as_ref().expect("No structured file");
    assert!(structured_path.ends_with(format!("structured/{}.json", id)));

    let report = result.images.as_ref().expect("No image report");
    assert_eq!(report.site_id, "grand-hotel");
    assert_eq!(report.saved, 1);
    assert!(dir.path().join("images/grand-hotel/facade.png").exists());
}

#[tokio::test]
async fn test_structuring_failure_keeps_raw_file() {
    let server = create_hotel_site().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let pipeline = Pipeline::new(config, Mode::Full).with_structurer(Arc::new(FailingStructurer));
    let result = pipeline.process_site(&server.uri(), None).await;

    assert!(matches!(result, Err(HarvestError::Structuring(_))));
    let scraped: Vec<_> = std::fs::read_dir(dir.path().join("scraped")).unwrap().collect();
    assert_eq!(scraped.len(), 1);
}

#[tokio::test]
async fn test_images_mode_uses_given_id() {
    let server = create_hotel_site().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let pipeline = Pipeline::new(config, Mode::Images);
    let result = pipeline
        .process_site(&server.uri(), Some("chosen-id"))
        .await
        .expect("Pipeline failed");

    assert!(result.scraped_path.is_none());
    assert_eq!(result.images.as_ref().unwrap().site_id, "chosen-id");
    assert!(dir.path().join("images/chosen-id/facade.png").exists());
}

#[tokio::test]
async fn test_unreachable_landing_fails_site() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(create_test_config(dir.path()), Mode::Text);
    let result = pipeline.process_site(&server.uri(), None).await;

    assert!(matches!(result, Err(HarvestError::Unreachable { .. })));
}

#[tokio::test]
async fn test_site_list_continues_after_failure() {
    let good = create_hotel_site().await;
    let bad = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&bad)
        .await;

    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(create_test_config(dir.path()), Mode::Text);
    let summary = pipeline
        .process_site_list(&[bad.uri(), good.uri()])
        .await
        .expect("Run aborted");

    assert_eq!(summary.total(), 2);
    assert_eq!(summary.successful(), 1);
    assert!(!summary.results[0].is_success());
    assert_eq!(summary.results[1].pages, 2);
}
