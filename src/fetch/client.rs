//! Retrieval of remote and local locations.
//!
//! [`SourceFetcher`] is the only component that performs I/O on sources. It
//! takes a location (URL or path), retrieves the bytes, classifies them and
//! parses them into a [`Document`](super::Document). It never returns an
//! error: every failure ends up on the returned [`Resource`].

use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{MAX_REDIRECTS, REQUEST_TIMEOUT_SECS};
use super::error::FetchError;
use super::file_type::FileType;
use super::parse::{extract_embedded_json_ld, parse_document};
use super::resource::Resource;
use crate::user_agent;

/// HTTP Basic-Auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fetches and classifies sources.
///
/// Created once per run and reused for every request so connections are
/// pooled.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    client: Client,
    credentials: Option<Credentials>,
}

impl SourceFetcher {
    /// Creates a fetcher with the default timeout and User-Agent.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    pub fn new(credentials: Option<Credentials>) -> Result<Self, reqwest::Error> {
        let client = build_client(REQUEST_TIMEOUT_SECS)?;
        Ok(Self {
            client,
            credentials,
        })
    }

    /// The underlying HTTP client, shared with the robots.txt lookup.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Retrieves and parses one location.
    ///
    /// `wanted_content_type` is sent as `Accept` on remote requests and used
    /// as a last resort when neither the response nor the path reveal the
    /// format.
    #[instrument(skip(self), fields(location = %location))]
    pub async fn fetch(&self, location: &str, wanted_content_type: Option<&str>) -> Resource {
        let resource = if is_remote(location) {
            self.fetch_remote(location, wanted_content_type).await
        } else {
            fetch_local(location, wanted_content_type).await
        };

        if resource.success {
            debug!(file_type = %resource.file_type, bytes = resource.raw.len(), "fetched");
        } else {
            warn!(reason = %resource.failure_reason(), "fetch failed");
        }
        resource
    }

    async fn fetch_remote(&self, url: &str, wanted_content_type: Option<&str>) -> Resource {
        let mut request = self.client.get(url);
        if let Some(content_type) = wanted_content_type {
            request = request.header(ACCEPT, content_type);
        }
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => return Resource::failed(url, None, FetchError::network(url, error)),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return Resource::failed(
                url,
                Some(status.as_u16()),
                FetchError::http_status(url, status.as_u16()),
            );
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let raw = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(error) => {
                return Resource::failed(url, Some(status.as_u16()), FetchError::network(url, error));
            }
        };

        let path = Url::parse(url).map(|u| u.path().to_string()).unwrap_or_default();
        let file_type = classify(content_type.as_deref(), &path, wanted_content_type);
        info!(url, status = status.as_u16(), %file_type, "retrieved");
        finish(url, raw, content_type, file_type, Some(status.as_u16()))
    }
}

async fn fetch_local(location: &str, wanted_content_type: Option<&str>) -> Resource {
    let Some(path) = local_path(location) else {
        return Resource::failed(
            location,
            None,
            FetchError::InvalidLocation {
                location: location.to_string(),
            },
        );
    };
    let raw = match tokio::fs::read(&path).await {
        Ok(raw) => raw,
        Err(error) => return Resource::failed(location, None, FetchError::io(path, error)),
    };
    let file_type = classify(None, &path.to_string_lossy(), wanted_content_type);
    debug!(path = %path.display(), %file_type, "read local file");
    finish(
        location,
        raw,
        Some(file_type.media_type().to_string()),
        file_type,
        None,
    )
}

/// Decodes and parses retrieved bytes.
fn finish(
    location: &str,
    raw: Vec<u8>,
    content_type: Option<String>,
    file_type: FileType,
    status: Option<u16>,
) -> Resource {
    let encoding = declared_encoding(content_type.as_deref());
    let Some(decoded) = encoding
        .decode_without_bom_handling_and_without_replacement(&raw)
        .map(Cow::into_owned)
    else {
        let mut resource = Resource::failed(
            location,
            status,
            FetchError::Decode {
                location: location.to_string(),
                charset: encoding.name(),
            },
        );
        resource.raw = raw;
        return resource;
    };
    let mut text = decoded.trim_start_matches('\u{feff}').to_string();
    let mut raw = raw;
    let mut file_type = file_type;

    // Only the embedded block is kept for RDF-in-HTML pages.
    if file_type == FileType::RdfHtml {
        if let Some(block) = extract_embedded_json_ld(&text) {
            raw = block.as_bytes().to_vec();
            text = block;
            file_type = FileType::JsonLd;
        }
    }

    let (success, file_type, document, failure) = match parse_document(location, file_type, &text)
    {
        Ok((effective, document)) => (true, effective, document, None),
        Err(error) => (false, file_type, None, Some(error)),
    };

    Resource {
        location: location.to_string(),
        success,
        raw,
        text,
        content_type,
        file_type,
        status,
        document,
        failure,
    }
}

/// Encoding named by the `charset` parameter of a content type. UTF-8
/// when absent or unknown.
fn declared_encoding(content_type: Option<&str>) -> &'static Encoding {
    content_type
        .into_iter()
        .flat_map(|value| value.split(';').skip(1))
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, label)| Encoding::for_label(label.trim().trim_matches('"').as_bytes()))
        .unwrap_or(UTF_8)
}

/// Picks a format from the response type, the path, then the wanted type.
fn classify(content_type: Option<&str>, path: &str, wanted_content_type: Option<&str>) -> FileType {
    content_type
        .and_then(FileType::from_content_type)
        .or_else(|| FileType::from_path(path))
        .or_else(|| wanted_content_type.and_then(FileType::from_content_type))
        .unwrap_or_else(|| {
            warn!(?content_type, path, "unknown content type, treating as text");
            FileType::Text
        })
}

/// Whether a location is fetched over HTTP.
#[must_use]
pub fn is_remote(location: &str) -> bool {
    Url::parse(location).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Filesystem path of a local location; `file:` URLs are converted.
fn local_path(location: &str) -> Option<PathBuf> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Url::parse(trimmed) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok(),
        _ => Some(PathBuf::from(trimmed)),
    }
}

fn build_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .user_agent(user_agent::harvest_user_agent())
        .gzip(true)
        .build()
}
