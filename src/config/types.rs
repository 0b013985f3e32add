use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Hotel-Scout
///
/// Every section is optional in the TOML file; missing values fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub images: ImageConfig,
    pub output: OutputConfig,
    pub structuring: StructuringConfig,
}

/// Text crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Fixed delay applied before every page request (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Crawling halts once this many pages have been visited
    #[serde(rename = "page-cap")]
    pub page_cap: u32,

    /// Maximum number of booking-engine pages fetched per session
    #[serde(rename = "max-booking-visits")]
    pub max_booking_visits: u32,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// TCP connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 1000,
            page_cap: 200,
            max_booking_visits: 5,
            request_timeout_secs: 15,
            connect_timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Image acquisition configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Minimum decoded width in pixels (inclusive)
    #[serde(rename = "min-width")]
    pub min_width: u32,

    /// Minimum decoded height in pixels (inclusive)
    #[serde(rename = "min-height")]
    pub min_height: u32,

    /// Minimum file size in KiB (inclusive)
    #[serde(rename = "min-size-kb")]
    pub min_size_kb: u64,

    /// Page cap for the standalone image crawl
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Number of images processed concurrently per page
    pub concurrency: usize,

    /// Attempts per image on transient network failures
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// First retry delay; doubles on every further attempt (milliseconds)
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Run the image pipeline on every page of the text crawl too
    #[serde(rename = "during-crawl")]
    pub during_crawl: bool,

    /// Try a headless browser when a page yields no images statically
    #[serde(rename = "render-fallback")]
    pub render_fallback: bool,

    /// Browser binary used for the rendered-DOM fallback
    #[serde(rename = "browser-path")]
    pub browser_path: String,
}

impl ImageConfig {
    pub fn min_size_bytes(&self) -> u64 {
        self.min_size_kb * 1024
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            min_width: 800,
            min_height: 600,
            min_size_kb: 50,
            max_pages: 20,
            concurrency: 5,
            max_attempts: 3,
            backoff_base_ms: 1000,
            during_crawl: false,
            render_fallback: false,
            browser_path: "chromium".to_string(),
        }
    }
}

/// Output layout configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory; stage folders (scraped, structured, images) live below it
    #[serde(rename = "data-root")]
    pub data_root: PathBuf,
}

impl OutputConfig {
    pub fn scraped_dir(&self) -> PathBuf {
        self.data_root.join("scraped")
    }

    pub fn structured_dir(&self) -> PathBuf {
        self.data_root.join("structured")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_root.join("images")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
        }
    }
}

/// Content structuring service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StructuringConfig {
    /// Skip the structuring stage entirely when false
    pub enabled: bool,

    /// OpenAI-compatible chat completions endpoint
    pub endpoint: String,

    /// Model name sent with each request
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for StructuringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}
