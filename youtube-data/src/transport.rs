//! The single-round-trip layer beneath the resolver and the paginator.
//!
//! Everything above this module deals in [`FetchRequest`]s and [`RawPage`]s. The
//! [`Transport`] trait is the seam where tests substitute a scripted implementation
//! (`mock::MockTransport`, behind the `mock` feature); [`HttpTransport`] talks to the real API with `reqwest`.

use crate::config::{Config, Credentials};
use crate::error::{Error, Result};
use crate::resource::Endpoint;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tracing::instrument;

/// Boxed future returned by [`Transport::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<RawPage>> + Send + 'a>>;

/// One `*.list` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub endpoint: Endpoint,
    /// Comma-separated `part` parameter.
    pub part: String,
    /// Filter parameters (`id`, `q`, `type`, `maxResults`, ...).
    pub params: Vec<(String, String)>,
    pub page_token: Option<String>,
}

impl FetchRequest {
    pub fn new(endpoint: Endpoint, part: impl Into<String>) -> Self {
        Self {
            endpoint,
            part: part.into(),
            params: Vec::new(),
            page_token: None,
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Returns the value of the first parameter named `key`.
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The same request, continuing from `page_token`.
    pub fn at_page(&self, page_token: Option<String>) -> Self {
        Self {
            page_token,
            ..self.clone()
        }
    }
}

/// Paging details for lists of resources.
///
/// See: <https://developers.google.com/youtube/v3/docs/pageInfo>
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// The total number of results in the result set.
    #[serde(rename = "totalResults", default)]
    pub total_results: u32,
    /// The number of results included in the API response.
    #[serde(rename = "resultsPerPage", default)]
    pub results_per_page: u32,
}

/// The raw outcome of one request: unparsed items plus the cursor for the next page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    pub items: Vec<serde_json::Value>,
    /// `None` when this is the last page.
    pub next_page_token: Option<String>,
    pub page_info: Option<PageInfo>,
}

/// Performs a single request/response round trip against the API.
pub trait Transport: fmt::Debug + Send + Sync {
    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> FetchFuture<'a>;
}

/// Response envelope shared by every `*.list` endpoint.
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
    #[serde(rename = "pageInfo")]
    page_info: Option<PageInfo>,
}

impl From<ListResponse> for RawPage {
    fn from(response: ListResponse) -> Self {
        RawPage {
            items: response.items,
            // the API never issues an empty cursor, but treat one as "no more pages"
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
            page_info: response.page_info,
        }
    }
}

/// Google's error envelope.
///
/// See: <https://developers.google.com/youtube/v3/docs/errors>
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

const AUTH_REASONS: &[&str] = &["keyInvalid", "keyExpired", "authError"];

/// Maps a non-success response to an [`Error`].
fn classify_failure(status: StatusCode, body: &str) -> Error {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let is_auth = status == StatusCode::UNAUTHORIZED
        || envelope.as_ref().is_some_and(|e| {
            e.error
                .errors
                .iter()
                .any(|d| AUTH_REASONS.contains(&d.reason.as_str()))
        });
    let message = match envelope {
        Some(e) if !e.error.message.is_empty() => e.error.message,
        _ if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        _ => body.to_string(),
    };

    if is_auth {
        Error::Auth { message }
    } else {
        Error::Transport {
            status: Some(status.as_u16()),
            message,
        }
    }
}

/// [`Transport`] over HTTPS using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpTransport {
    /// Builds the HTTP client from `config` (timeout, user agent).
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("build HTTP client: {e}")))?;
        Ok(Self::with_client(config, client))
    }

    /// Uses an existing HTTP client, for sharing connection pools.
    pub fn with_client(config: &Config, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials.clone(),
        }
    }

    /// Makes an authenticated `GET` for `request` and checks the status code.
    #[instrument(skip(self), fields(endpoint = %request.endpoint), level = tracing::Level::TRACE)]
    async fn make_authenticated_request(&self, request: &FetchRequest) -> Result<RawPage> {
        let url = format!("{}/{}", self.base_url, request.endpoint.path());

        let mut query: Vec<(&str, &str)> = vec![("part", request.part.as_str())];
        query.extend(request.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(token) = &request.page_token {
            query.push(("pageToken", token.as_str()));
        }

        let mut builder = self.client.request(Method::GET, &url);
        match &self.credentials {
            Credentials::ApiKey(key) => query.push(("key", key.as_str())),
            Credentials::BearerToken(token) => {
                builder = builder.header("Authorization", format!("Bearer {token}"));
            }
        }

        let response = builder.query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_failure(status, &body);
            tracing::debug!(%status, error = %err, "request rejected");
            return Err(err);
        }

        let body = response.bytes().await?;
        let list: ListResponse = serde_json::from_slice(&body)?;

        tracing::debug!(
            total_results = list.page_info.map(|p| p.total_results),
            returned_items = list.items.len(),
            has_next_page = list.next_page_token.is_some(),
            "fetched page"
        );

        Ok(list.into())
    }
}

impl Transport for HttpTransport {
    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> FetchFuture<'a> {
        Box::pin(self.make_authenticated_request(request))
    }
}
