//! Turns identifiers into [`Resource`]s with as few round trips as the API allows.

use crate::cache::FieldCache;
use crate::config::API_MAX_BATCH;
use crate::error::{Error, Result};
use crate::resource::fields::extract_all;
use crate::resource::{Resource, ResourceId, ResourceKind};
use crate::transport::{FetchRequest, PageInfo, Transport};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Batches identifier lookups into `*.list?id=a,b,c` requests.
///
/// A resolver is cheap to clone; clones share the transport. It keeps no state between calls:
/// resolving the same identifier twice performs two requests. Wrap it in a
/// [`crate::CachedResolver`] to reuse earlier results.
#[derive(Clone)]
pub struct Resolver {
    transport: Arc<dyn Transport>,
    max_batch_size: usize,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("max_batch_size", &self.max_batch_size)
            .finish_non_exhaustive()
    }
}

/// One page of a list operation, converted to resources.
///
/// Items that could not be interpreted keep their position as an `Err`.
#[derive(Debug)]
pub(crate) struct ResourcePage {
    pub(crate) items: Vec<Result<Resource>>,
    pub(crate) next_page_token: Option<String>,
    pub(crate) page_info: Option<PageInfo>,
}

impl Resolver {
    /// `max_batch_size` is clamped to `1..=50`.
    pub fn new(transport: Arc<dyn Transport>, max_batch_size: usize) -> Self {
        Self {
            transport,
            max_batch_size: max_batch_size.clamp(1, API_MAX_BATCH),
        }
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// A proxy for `id` with nothing cached. No request is made until a field is read.
    pub fn lazy(&self, id: ResourceId) -> Resource {
        Resource::new(id, self.clone(), FieldCache::new())
    }

    /// Resolves `ids` of one kind, returning one resource per input id, in input order.
    ///
    /// Issues `ceil(n / max_batch_size)` requests, one after another, each asking for every
    /// part of `kind`, so the returned resources are fully populated. An id the API does not
    /// return yields a resource whose every [`Resource::get`] fails with
    /// [`Error::ResourceNotFound`]; the other resources are unaffected.
    ///
    /// All ids are validated before any request is made.
    #[instrument(skip(self, ids), fields(n = ids.len()))]
    pub async fn resolve<S: AsRef<str>>(
        &self,
        kind: ResourceKind,
        ids: &[S],
    ) -> Result<Vec<Resource>> {
        let ids = ids
            .iter()
            .map(|id| ResourceId::new(kind, id.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        // each distinct id is requested once, even if the caller repeats it
        let mut seen = HashSet::new();
        let distinct: Vec<&str> = ids
            .iter()
            .map(ResourceId::id)
            .filter(|id| seen.insert(*id))
            .collect();

        let mut found = HashMap::with_capacity(distinct.len());
        for batch in distinct.chunks(self.max_batch_size) {
            found.extend(self.fetch_batch(kind, batch).await?);
        }

        tracing::debug!(requested = distinct.len(), found = found.len(), "resolved batch");

        Ok(ids
            .into_iter()
            .map(|id| match found.get(id.id()) {
                Some(cache) => Resource::new(id, self.clone(), cache.clone()),
                None => Resource::missing(id, self.clone()),
            })
            .collect())
    }

    /// Fetches every part of a single resource. `Ok(None)` means it does not exist.
    pub(crate) async fn fetch_one(&self, id: &ResourceId) -> Result<Option<FieldCache>> {
        let mut found = self.fetch_batch(id.kind(), &[id.id()]).await?;
        Ok(found.remove(id.id()))
    }

    /// One `*.list?id=..` round trip, re-indexed by identifier.
    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    async fn fetch_batch(
        &self,
        kind: ResourceKind,
        ids: &[&str],
    ) -> Result<HashMap<String, FieldCache>> {
        let request =
            FetchRequest::new(kind.endpoint(), kind.full_part()).param("id", ids.join(","));
        let page = self.transport.fetch(&request).await?;

        let mut found = HashMap::with_capacity(page.items.len());
        for item in &page.items {
            let Some(id) = item.get("id").and_then(Value::as_str) else {
                return Err(Error::decode(format!("{kind} item without an id")));
            };
            if !ids.contains(&id) {
                tracing::warn!(id, "API returned an item we did not ask for");
                continue;
            }
            let mut cache = extract_all(kind, item);
            cache.mark_complete();
            found.insert(id.to_string(), cache);
        }
        Ok(found)
    }

    /// Fetches one page of a list operation and wraps each item in a resource, pre-populated
    /// with whatever fields the list response carried.
    ///
    /// Only a failed request fails the page. An item that cannot be interpreted becomes an
    /// `Err` in its own slot.
    #[instrument(skip(self), level = tracing::Level::DEBUG)]
    pub(crate) async fn fetch_page(&self, request: &FetchRequest) -> Result<ResourcePage> {
        let page = self.transport.fetch(request).await?;
        let items = page
            .items
            .iter()
            .map(|item| {
                let (id, prefill) = identify(item).inspect_err(|e| {
                    tracing::warn!(
                        endpoint = %request.endpoint,
                        error = %e,
                        "undecodable list item"
                    );
                })?;
                let cache = if prefill {
                    extract_all(id.kind(), item)
                } else {
                    FieldCache::new()
                };
                Ok(Resource::new(id, self.clone(), cache))
            })
            .collect();

        Ok(ResourcePage {
            items,
            next_page_token: page.next_page_token,
            page_info: page.page_info,
        })
    }
}

/// Works out which resource a list item refers to, and whether its fields describe that
/// resource (`true`) or something else, like a playlist entry.
fn identify(item: &Value) -> Result<(ResourceId, bool)> {
    let kind = item
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::decode("list item without a kind"))?;

    match kind {
        "youtube#searchResult" => {
            let id = item
                .get("id")
                .ok_or_else(|| Error::decode("search result without an id"))?;
            let target = id
                .get("kind")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::decode("search result id without a kind"))?;
            let target: ResourceKind = target
                .parse()
                .map_err(|_| Error::decode(format!("unsupported search result kind '{target}'")))?;
            let key = format!("{}Id", target.as_str());
            let raw = id
                .get(&key)
                .and_then(Value::as_str)
                .ok_or_else(|| Error::decode(format!("search result id without {key}")))?;
            Ok((ResourceId::new(target, raw)?, true))
        }
        "youtube#playlistItem" => {
            let raw = item
                .pointer("/contentDetails/videoId")
                .or_else(|| item.pointer("/snippet/resourceId/videoId"))
                .and_then(Value::as_str)
                .ok_or_else(|| Error::decode("playlist item without a video id"))?;
            Ok((ResourceId::new(ResourceKind::Video, raw)?, false))
        }
        other => {
            let kind: ResourceKind = other
                .parse()
                .map_err(|_| Error::decode(format!("unsupported item kind '{other}'")))?;
            let raw = item
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::decode(format!("{kind} item without an id")))?;
            Ok((ResourceId::new(kind, raw)?, true))
        }
    }
}
