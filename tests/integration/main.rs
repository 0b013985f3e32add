//! Integration tests for Hotel-Scout
//!
//! Every test runs against wiremock servers and temporary directories.

mod crawl_tests;
mod image_tests;
mod pipeline_tests;

use hotel_scout::config::Config;
use std::path::Path;

/// Creates a test configuration writing below `data_root` with no request delay
pub fn create_test_config(data_root: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.request_delay_ms = 0;
    config.crawler.user_agent = "HotelScoutTest/1.0".to_string();
    config.images.backoff_base_ms = 0;
    config.images.render_fallback = false;
    config.output.data_root = data_root.to_path_buf();
    config.structuring.enabled = false;
    config
}

/// Builds a minimal PNG: signature and IHDR chunk, padded with zeros to `total_len`
pub fn create_test_png(width: u32, height: u32, total_len: usize) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 2, 0, 0, 0]);
    data.resize(total_len.max(data.len()), 0);
    data
}

/// Wraps a body fragment in an HTML page
pub fn html_page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><h1>{}</h1>{}</body></html>",
        title, title, body
    )
}
