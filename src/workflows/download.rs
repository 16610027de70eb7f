//! Download workflow
//!
//! The object store behind this deployment is not self-consistent: the same
//! file may come back as raw bytes or as Base64 text inside a JSON envelope,
//! and some envelopes only carry a link to the real file. This module turns
//! any of those answers into one typed [`DownloadedFile`].
//!
//! Decision order for a response:
//!
//! 1. `content-type: application/json`
//!    - body starts with the Base64 form of `%PDF` (`JVBER`): decode, force
//!      `application/pdf`
//!    - body is an object with `downloadUrl`, `url` or `signedUrl`: follow it
//!      once, without credentials
//!    - anything else: `UnexpectedFormat`
//! 2. any other content type: the body is the file; empty means `EmptyPayload`

use crate::clients::{ObjectResponse, ObjectStore};
use crate::core::{HubError, NetworkError};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use reqwest::Url;
use std::sync::{Arc, LazyLock};

/// Prefix of `%PDF` once Base64-encoded
pub const BASE64_PDF_SIGNATURE: &str = "JVBER";

/// Envelope fields that may hold a link to the actual file, in lookup order
pub const REDIRECT_FIELDS: [&str; 3] = ["downloadUrl", "url", "signedUrl"];

const PDF_CONTENT_TYPE: &str = "application/pdf";
const OCTET_STREAM: &str = "application/octet-stream";
const FALLBACK_FILENAME: &str = "download";

static DISPOSITION_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\s*=\s*(?:"([^"]*)"|([^;\s]+))"#).expect("filename pattern")
});

/// A file ready to be saved by the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DownloadedFile {
    /// `Content-Disposition` value that makes the browser save the file
    ///
    /// Characters that cannot appear in a quoted header parameter are
    /// replaced with `_`.
    pub fn attachment_disposition(&self) -> String {
        let safe: String = self
            .filename
            .chars()
            .map(|c| {
                if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("attachment; filename=\"{}\"", safe)
    }
}

/// What a single object response turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// The response held the file itself
    File(DownloadedFile),

    /// The response pointed at another URL
    Redirect(String),
}

/// Fetches stored objects and disambiguates their encoding
#[derive(Clone)]
pub struct DownloadWorkflow {
    store: Arc<dyn ObjectStore>,
    storage_key: String,
    fallback_key: Option<String>,
}

impl DownloadWorkflow {
    /// Create a workflow that reads with the object store's API key
    pub fn new(store: Arc<dyn ObjectStore>, storage_key: impl Into<String>) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
            fallback_key: None,
        }
    }

    /// Second credential tried once when the store refuses the first
    ///
    /// Ignored when it equals the storage key.
    pub fn with_fallback_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if key != self.storage_key {
            self.fallback_key = Some(key);
        }
        self
    }

    /// Download the object behind `reference`
    ///
    /// At most one redirect is followed; a second one is an
    /// `UnexpectedFormat` failure. API keys are only sent when `reference`
    /// is a key or a URL under the store's base; anything else is read
    /// anonymously.
    pub async fn download(&self, reference: &str) -> Result<DownloadedFile, HubError> {
        let response = self.fetch_authenticated(reference).await?;

        let file = match interpret(reference, &response)? {
            Payload::File(file) => file,
            Payload::Redirect(target) => {
                tracing::debug!(from = %reference, to = %target, "Following download redirect");
                let response = self.store.get_object(&target, None).await?;
                match interpret(&target, &response)? {
                    Payload::File(file) => file,
                    Payload::Redirect(again) => {
                        return Err(HubError::UnexpectedFormat {
                            reason: format!("second redirect to {} refused", again),
                        });
                    }
                }
            }
        };

        tracing::info!(
            reference = %reference,
            filename = %file.filename,
            content_type = %file.content_type,
            size = file.bytes.len(),
            "Download resolved"
        );
        Ok(file)
    }

    /// Read `reference`, with credentials only when it is the store's own
    async fn fetch_authenticated(&self, reference: &str) -> Result<ObjectResponse, HubError> {
        if !self.store.is_own_reference(reference) {
            tracing::warn!(
                reference = %reference,
                "Reference outside the object store, fetching without credentials"
            );
            return self.store.get_object(reference, None).await;
        }

        let first = self
            .store
            .get_object(reference, Some(self.storage_key.as_str()))
            .await;

        let denied = matches!(
            &first,
            Err(HubError::Network(NetworkError {
                status: Some(401 | 403),
                ..
            }))
        );
        match (&self.fallback_key, denied) {
            (Some(fallback), true) => {
                tracing::warn!(reference = %reference, "Storage key refused, trying record API key");
                self.store.get_object(reference, Some(fallback.as_str())).await
            }
            _ => first,
        }
    }
}

/// Classify one object response
pub fn interpret(reference: &str, response: &ObjectResponse) -> Result<Payload, HubError> {
    if is_json(response.content_type.as_deref()) {
        return interpret_envelope(reference, response);
    }

    if response.body.is_empty() {
        return Err(HubError::EmptyPayload {
            reference: reference.to_string(),
        });
    }

    let filename = disposition_filename(response.content_disposition.as_deref())
        .or_else(|| last_segment(reference))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
    let content_type = response
        .content_type
        .clone()
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or_else(|| OCTET_STREAM.to_string());

    Ok(Payload::File(DownloadedFile {
        filename,
        content_type,
        bytes: response.body.clone(),
    }))
}

fn interpret_envelope(reference: &str, response: &ObjectResponse) -> Result<Payload, HubError> {
    let text = std::str::from_utf8(&response.body).map_err(|_| HubError::UnexpectedFormat {
        reason: "JSON response is not valid UTF-8".to_string(),
    })?;
    let text = text.trim();

    // A bare JSON string may wrap the Base64 text
    let unquoted = if text.starts_with('"') {
        serde_json::from_str::<String>(text).ok()
    } else {
        None
    };
    let candidate = unquoted.as_deref().unwrap_or(text);

    if candidate.starts_with(BASE64_PDF_SIGNATURE) {
        let compact: String = candidate
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| HubError::UnexpectedFormat {
                reason: format!("invalid Base64 PDF payload: {}", e),
            })?;

        let mut filename = disposition_filename(response.content_disposition.as_deref())
            .or_else(|| last_segment(reference))
            .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
        if !filename.contains('.') {
            filename.push_str(".pdf");
        }

        return Ok(Payload::File(DownloadedFile {
            filename,
            content_type: PDF_CONTENT_TYPE.to_string(),
            bytes,
        }));
    }

    let redirect = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| {
            REDIRECT_FIELDS
                .iter()
                .find_map(|field| value.get(field)?.as_str().map(str::to_string))
        })
        .filter(|url| !url.trim().is_empty());

    match redirect {
        Some(url) => Ok(Payload::Redirect(url)),
        None => Err(HubError::UnexpectedFormat {
            reason: "JSON response holds neither a Base64 PDF nor a download link".to_string(),
        }),
    }
}

/// `application/json`, parameters such as `charset` ignored
fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

/// Filename from `filename="..."` or `filename=...`, path components removed
pub fn disposition_filename(header: Option<&str>) -> Option<String> {
    let captures = DISPOSITION_FILENAME.captures(header?)?;
    let raw = captures.get(1).or_else(|| captures.get(2))?.as_str();
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Last non-empty path segment of a URL or bare key, percent-decoded
pub fn last_segment(reference: &str) -> Option<String> {
    let path = match Url::parse(reference) {
        Ok(url) => url.path().to_string(),
        Err(_) => reference
            .split(['?', '#'])
            .next()
            .unwrap_or(reference)
            .to_string(),
    };
    let segment = path.rsplit('/').find(|segment| !segment.is_empty())?;
    let decoded = urlencoding::decode(segment)
        .map(|name| name.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    // An encoded separator must not smuggle a directory into the name
    let name = decoded.rsplit(['/', '\\']).next().unwrap_or(&decoded).trim();
    (!name.is_empty()).then(|| name.to_string())
}
