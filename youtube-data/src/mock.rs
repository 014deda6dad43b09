//! Scripted in-memory transport for testing code built on this crate.
//!
//! [`MockTransport`] answers id lookups (`videos.list?id=..`, `channels.list?id=..`, ...) from
//! a catalog of raw items, and answers everything else from a queue of scripted pages. Every
//! request is recorded so tests can assert on how many round trips happened and what they
//! asked for.
//!
//! Lookups are answered in *reverse* catalog order, since the API makes no promise that items
//! come back in the order they were requested.

use crate::error::{Error, Result};
use crate::resource::{Endpoint, ResourceKind};
use crate::transport::{FetchFuture, FetchRequest, PageInfo, RawPage, Transport};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The largest `id` list the real API accepts.
const MAX_IDS: usize = 50;

#[derive(Debug, Default)]
struct MockState {
    catalog: HashMap<Endpoint, Vec<Value>>,
    scripted: VecDeque<Result<RawPage>>,
    requests: Vec<FetchRequest>,
}

/// A [`Transport`] that never touches the network.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `item` available to id lookups of `kind`. The item must carry a string `id`.
    pub async fn insert(&self, kind: ResourceKind, item: Value) {
        self.state
            .lock()
            .await
            .catalog
            .entry(kind.endpoint())
            .or_default()
            .push(item);
    }

    /// Queues a page to answer the next non-lookup request (or any request, if queued first).
    pub async fn push_page(&self, page: RawPage) {
        self.state.lock().await.scripted.push_back(Ok(page));
    }

    /// Queues a failure for the next request.
    pub async fn push_error(&self, error: Error) {
        self.state.lock().await.scripted.push_back(Err(error));
    }

    /// Every request made so far, oldest first.
    pub async fn requests(&self) -> Vec<FetchRequest> {
        self.state.lock().await.requests.clone()
    }

    /// Number of round trips made so far.
    pub async fn calls(&self) -> usize {
        self.state.lock().await.requests.len()
    }

    async fn respond(&self, request: &FetchRequest) -> Result<RawPage> {
        let mut state = self.state.lock().await;
        state.requests.push(request.clone());
        tracing::trace!(endpoint = %request.endpoint, params = ?request.params, "mock request");

        if let Some(scripted) = state.scripted.pop_front() {
            return scripted;
        }

        let Some(ids) = request.get_param("id") else {
            return Err(Error::Transport {
                status: Some(500),
                message: format!("mock has no page scripted for {}", request.endpoint),
            });
        };
        let ids: Vec<&str> = ids.split(',').collect();
        if ids.len() > MAX_IDS {
            return Err(Error::Transport {
                status: Some(400),
                message: format!("too many ids in one request: {}", ids.len()),
            });
        }

        let items: Vec<Value> = state
            .catalog
            .get(&request.endpoint)
            .into_iter()
            .flatten()
            .filter(|item| {
                item.get("id")
                    .and_then(Value::as_str)
                    .is_some_and(|id| ids.contains(&id))
            })
            .rev()
            .cloned()
            .collect();

        let page_info = PageInfo {
            total_results: u32::try_from(items.len()).unwrap_or(u32::MAX),
            results_per_page: u32::try_from(items.len()).unwrap_or(u32::MAX),
        };
        Ok(RawPage {
            items,
            next_page_token: None,
            page_info: Some(page_info),
        })
    }
}

impl Transport for MockTransport {
    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> FetchFuture<'a> {
        Box::pin(self.respond(request))
    }
}

/// A minimal `videos.list` item with a snippet and statistics.
pub fn video_item(id: &str, title: &str) -> Value {
    json!({
        "kind": "youtube#video",
        "id": id,
        "snippet": {
            "title": title,
            "description": format!("{title} (description)"),
            "publishedAt": "2020-01-01T00:00:00Z",
            "channelId": "UCmockchannel",
            "channelTitle": "Mock Channel"
        },
        "contentDetails": { "duration": "PT3M20S" },
        "status": { "license": "youtube", "privacyStatus": "public" },
        "statistics": { "viewCount": "1000", "likeCount": "10", "commentCount": "1" }
    })
}

/// A minimal `channels.list` item.
pub fn channel_item(id: &str, title: &str) -> Value {
    json!({
        "kind": "youtube#channel",
        "id": id,
        "snippet": {
            "title": title,
            "publishedAt": "2010-06-01T12:00:00Z"
        },
        "contentDetails": { "relatedPlaylists": { "uploads": format!("UU{id}") } },
        "statistics": { "viewCount": "5000", "subscriberCount": "100", "videoCount": "3" }
    })
}

/// A `search.list` item pointing at a video.
pub fn search_video_item(video_id: &str, title: &str) -> Value {
    json!({
        "kind": "youtube#searchResult",
        "id": { "kind": "youtube#video", "videoId": video_id },
        "snippet": {
            "title": title,
            "publishedAt": "2020-01-01T00:00:00Z",
            "channelId": "UCmockchannel",
            "channelTitle": "Mock Channel"
        }
    })
}

/// A page of `n` search results with ids `{prefix}-{i}`.
pub fn search_page(prefix: &str, n: usize, next_page_token: Option<&str>) -> RawPage {
    RawPage {
        items: (0..n)
            .map(|i| search_video_item(&format!("{prefix}-{i}"), &format!("result {i}")))
            .collect(),
        next_page_token: next_page_token.map(str::to_string),
        page_info: Some(PageInfo {
            total_results: 1_000_000,
            results_per_page: u32::try_from(n).unwrap_or(u32::MAX),
        }),
    }
}
