use crate::config::ImageConfig;
use crate::images::ImageError;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Client;
use std::fmt;
use url::Url;

/// Why a candidate image was not kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Content-Type is missing or not `image/*`
    NotAnImage { content_type: String },
    /// Fewer bytes than the configured minimum
    TooSmallBytes { size: u64, min: u64 },
    /// Decoded width or height below the minimum
    TooSmallDimensions { width: u32, height: u32 },
    /// Body is not a decodable image
    Undecodable,
    /// Body request answered with a non-2xx status
    HttpStatus(u16),
    /// Same content already accepted in this session
    Duplicate,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnImage { content_type } => write!(f, "not an image ({})", content_type),
            Self::TooSmallBytes { size, min } => write!(f, "too small ({} < {} bytes)", size, min),
            Self::TooSmallDimensions { width, height } => {
                write!(f, "dimensions too small ({}x{})", width, height)
            }
            Self::Undecodable => write!(f, "undecodable image data"),
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::Duplicate => write!(f, "duplicate content"),
        }
    }
}

/// An image that passed every check, with its body
#[derive(Debug, Clone)]
pub struct QualifiedImage {
    pub url: Url,
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub enum Qualification {
    Accept(QualifiedImage),
    Reject(RejectReason),
}

/// Checks candidates against the configured minimums
///
/// A successful HEAD response can reject early on content type or declared
/// length. The body is always checked; minimum values themselves pass.
#[derive(Debug, Clone)]
pub struct Qualifier {
    client: Client,
    min_width: u32,
    min_height: u32,
    min_size_bytes: u64,
}

impl Qualifier {
    pub fn new(client: Client, config: &ImageConfig) -> Self {
        Self {
            client,
            min_width: config.min_width,
            min_height: config.min_height,
            min_size_bytes: config.min_size_bytes(),
        }
    }

    pub async fn qualify(&self, url: &Url) -> Result<Qualification, ImageError> {
        let head = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|e| ImageError::from_reqwest(url, e))?;

        if head.status().is_success() {
            let content_type = header_value(head.headers(), CONTENT_TYPE);
            if !is_image_type(&content_type) {
                return Ok(Qualification::Reject(RejectReason::NotAnImage { content_type }));
            }

            let declared = head
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            if let Some(size) = declared {
                if size < self.min_size_bytes {
                    return Ok(Qualification::Reject(RejectReason::TooSmallBytes {
                        size,
                        min: self.min_size_bytes,
                    }));
                }
            }
        } else {
            tracing::debug!("HEAD {} returned {}, checking body", url, head.status().as_u16());
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ImageError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(Qualification::Reject(RejectReason::HttpStatus(status.as_u16())));
        }

        let content_type = header_value(response.headers(), CONTENT_TYPE);
        if !is_image_type(&content_type) {
            return Ok(Qualification::Reject(RejectReason::NotAnImage { content_type }));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::from_reqwest(url, e))?;

        let size = bytes.len() as u64;
        if size < self.min_size_bytes {
            return Ok(Qualification::Reject(RejectReason::TooSmallBytes {
                size,
                min: self.min_size_bytes,
            }));
        }

        let (width, height) = match check_dimensions(&bytes, self.min_width, self.min_height) {
            Ok(dims) => dims,
            Err(reason) => return Ok(Qualification::Reject(reason)),
        };

        Ok(Qualification::Accept(QualifiedImage {
            url: url.clone(),
            bytes: bytes.to_vec(),
            content_type,
            width,
            height,
        }))
    }
}

/// Decodes the image header and checks it against the minimum dimensions
pub fn check_dimensions(bytes: &[u8], min_width: u32, min_height: u32) -> Result<(u32, u32), RejectReason> {
    let size = imagesize::blob_size(bytes).map_err(|_| RejectReason::Undecodable)?;
    let width = u32::try_from(size.width).unwrap_or(u32::MAX);
    let height = u32::try_from(size.height).unwrap_or(u32::MAX);

    if width < min_width || height < min_height {
        return Err(RejectReason::TooSmallDimensions { width, height });
    }

    Ok((width, height))
}

fn header_value(headers: &reqwest::header::HeaderMap, name: reqwest::header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

fn is_image_type(content_type: &str) -> bool {
    content_type.starts_with("image/")
}
