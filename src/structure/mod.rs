//! Structuring service boundary
//!
//! Turns the scraped text of a site into a structured JSON document through
//! an OpenAI-compatible chat completions endpoint. The crawl never depends on
//! this stage; callers decide whether to run it.

use crate::config::StructuringConfig;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Input beyond this many characters is cut before it is sent
const MAX_CONTENT_CHARS: usize = 30_000;

static CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*").expect("code fence pattern"));

static FIRST_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://(?:[-\w.]|(?:%[\da-fA-F]{2}))+").expect("url pattern"));

/// Terms that make a URL look like the hotel's own site
const SITE_URL_TERMS: &[&str] = &["hotel", "resort", "inn", "accommodation", "booking", "stay", "room"];

const SYSTEM_PROMPT: &str = r#"You extract accommodation data from scraped website text.
Translate everything into English. Reply with one raw JSON object and nothing else.
Use this shape, leaving out what the text does not mention:
{
  "property": {
    "name": "", "type": "", "description": "", "starRating": null,
    "contact": { "address": "", "phone": "", "email": "", "website": "" }
  },
  "rooms": [ { "name": "", "description": "", "size": "", "maxOccupancy": null, "bedTypes": [], "amenities": [] } ],
  "amenities": { "general": [], "wellness": [], "dining": [], "business": [] },
  "policies": { "checkIn": "", "checkOut": "", "cancellation": "", "pets": "", "children": "" },
  "location": { "nearbyAttractions": [], "transportation": [], "neighborhood": "" }
}"#;

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("API key variable {0} is not set")]
    MissingApiKey(String),

    #[error("Structuring request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Structuring service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Structuring service returned no completion")]
    EmptyResponse,

    #[error("Completion is not a JSON object: {0}")]
    InvalidJson(String),
}

/// Anything that can turn scraped content into a structured document
#[async_trait]
pub trait StructuringService: Send + Sync {
    /// Structures `content` and returns a JSON object carrying `id`
    async fn structure(&self, id: &str, content: &Value) -> Result<Value, StructureError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Client for OpenAI-compatible chat completions endpoints
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: String,
}

impl ChatCompletionsClient {
    pub fn new(client: Client, config: &StructuringConfig, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key: api_key.into(),
        }
    }

    /// Builds a client, reading the API key from the configured environment variable
    pub fn from_config(config: &StructuringConfig) -> Result<Self, StructureError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| StructureError::MissingApiKey(config.api_key_env.clone()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::new(client, config, api_key))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl StructuringService for ChatCompletionsClient {
    async fn structure(&self, id: &str, content: &Value) -> Result<Value, StructureError> {
        let text = truncate_content(&serde_json::to_string_pretty(content).unwrap_or_default());
        tracing::info!("Structuring {} with model {} ({} chars)", id, self.model, text.len());

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &text,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StructureError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        let completion = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(StructureError::EmptyResponse)?;

        let document = parse_completion(&completion, id)?;
        tracing::info!("Structured content for {}", id);
        Ok(document)
    }
}

/// Parses a completion into a JSON object, stripping code fences and injecting `id`
pub fn parse_completion(completion: &str, id: &str) -> Result<Value, StructureError> {
    let mut value: Value = match serde_json::from_str(completion.trim()) {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!("Completion is not plain JSON, stripping code fences");
            let cleaned = CODE_FENCE_RE.replace_all(completion, "");
            serde_json::from_str(cleaned.trim()).map_err(|e| StructureError::InvalidJson(e.to_string()))?
        }
    };

    let Some(object) = value.as_object_mut() else {
        return Err(StructureError::InvalidJson("top level is not an object".to_string()));
    };
    object
        .entry("id")
        .or_insert_with(|| Value::String(id.to_string()));

    Ok(value)
}

fn truncate_content(text: &str) -> String {
    if text.chars().count() <= MAX_CONTENT_CHARS {
        return text.to_string();
    }
    tracing::warn!("Content too large, truncating to {} characters", MAX_CONTENT_CHARS);
    let mut truncated: String = text.chars().take(MAX_CONTENT_CHARS).collect();
    truncated.push_str("...[truncated]");
    truncated
}

/// Identity and website of a structured site document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReference {
    pub id: String,
    pub website: Option<Url>,
}

impl SiteReference {
    /// Reads `id` and `property.contact.website`
    ///
    /// Without a usable website the first URL found anywhere in the document is
    /// used, preferring URLs that look like a hotel's own site.
    pub fn from_structured(value: &Value, fallback_id: &str) -> Self {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(fallback_id)
            .to_string();

        let website = value
            .pointer("/property/contact/website")
            .and_then(Value::as_str)
            .and_then(parse_website)
            .or_else(|| first_url_in(&value.to_string()));

        Self { id, website }
    }
}

fn parse_website(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    crate::url::ensure_scheme(raw).ok()
}

fn first_url_in(text: &str) -> Option<Url> {
    let urls: Vec<&str> = FIRST_URL_RE.find_iter(text).map(|m| m.as_str()).collect();
    urls.iter()
        .find(|url| {
            let lower = url.to_lowercase();
            SITE_URL_TERMS.iter().any(|term| lower.contains(term))
        })
        .or_else(|| urls.first())
        .and_then(|url| Url::parse(url).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(server: &MockServer) -> ChatCompletionsClient {
        let config = StructuringConfig {
            endpoint: format!("{}/v1/chat/completions", server.uri()),
            ..StructuringConfig::default()
        };
        ChatCompletionsClient::new(Client::new(), &config, "test-key")
    }

    fn completion(content: &str) -> Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
    }

    #[test]
    fn test_parse_plain_completion_injects_id() {
        let value = parse_completion(r#"{"property": {"name": "Chouchou"}}"#, "hotel_1").unwrap();
        assert_eq!(value["id"], "hotel_1");
        assert_eq!(value["property"]["name"], "Chouchou");
    }

    #[test]
    fn test_parse_fenced_completion_keeps_existing_id() {
        let value = parse_completion("```json\n{\"id\": \"given\"}\n```", "fallback").unwrap();
        assert_eq!(value["id"], "given");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_completion("I cannot help with that", "x"),
            Err(StructureError::InvalidJson(_))
        ));
        assert!(matches!(parse_completion("[1, 2]", "x"), Err(StructureError::InvalidJson(_))));
    }

    #[test]
    fn test_truncate_content() {
        let long = "é".repeat(MAX_CONTENT_CHARS + 10);
        let truncated = truncate_content(&long);
        assert!(truncated.ends_with("...[truncated]"));
        assert_eq!(truncated.chars().count(), MAX_CONTENT_CHARS + "...[truncated]".len());
        assert_eq!(truncate_content("short"), "short");
    }

    #[test]
    fn test_site_reference_from_contact() {
        let value = json!({
            "id": "chouchou",
            "property": { "contact": { "website": "www.chouchouhotel.com" } }
        });
        let site = SiteReference::from_structured(&value, "fallback");
        assert_eq!(site.id, "chouchou");
        assert_eq!(site.website.unwrap().as_str(), "https://www.chouchouhotel.com/");
    }

    #[test]
    fn test_site_reference_falls_back_to_document_urls() {
        let value = json!({
            "property": {
                "description": "See https://maps.example.com and https://www.grandhotel.fr for more",
                "contact": { "website": "" }
            }
        });
        let site = SiteReference::from_structured(&value, "fallback");
        assert_eq!(site.id, "fallback");
        assert_eq!(site.website.unwrap().host_str(), Some("www.grandhotel.fr"));

        let bare = SiteReference::from_structured(&json!({"id": ""}), "fb");
        assert_eq!(bare.id, "fb");
        assert!(bare.website.is_none());
    }

    #[test]
    fn test_missing_api_key() {
        let config = StructuringConfig {
            api_key_env: "HOTEL_SCOUT_TEST_UNSET_KEY".to_string(),
            ..StructuringConfig::default()
        };
        assert!(matches!(
            ChatCompletionsClient::from_config(&config),
            Err(StructureError::MissingApiKey(name)) if name == "HOTEL_SCOUT_TEST_UNSET_KEY"
        ));
    }

    #[tokio::test]
    async fn test_structure_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                "```json\n{\"property\": {\"contact\": {\"website\": \"https://hotel.com\"}}}\n```",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let value = client
            .structure("hotel_com_1700000000", &json!({"url": "https://hotel.com"}))
            .await
            .unwrap();

        assert_eq!(value["id"], "hotel_com_1700000000");
        let site = SiteReference::from_structured(&value, "unused");
        assert_eq!(site.website.unwrap().as_str(), "https://hotel.com/");
    }

    #[tokio::test]
    async fn test_structure_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let result = client.structure("x", &json!({})).await;
        assert!(matches!(result, Err(StructureError::Status { status: 429, .. })));
    }

    #[tokio::test]
    async fn test_structure_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = create_test_client(&server);
        let result = client.structure("x", &json!({})).await;
        assert!(matches!(result, Err(StructureError::EmptyResponse)));
    }
}
