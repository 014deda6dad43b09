//! The entry point most callers want.

use crate::cached::CachedResolver;
use crate::config::{API_MAX_BATCH, Config};
use crate::error::{Error, Result};
use crate::paginator::Paginator;
use crate::resolver::Resolver;
use crate::resource::{Endpoint, Resource, ResourceId, ResourceKind};
use crate::transport::{FetchRequest, HttpTransport, Transport};
use crate::utils::video_id_from_url;
use jiff::Timestamp;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Parameters owned by the paginator; callers may not override them through `extra`.
const RESERVED_PARAMS: &[&str] = &["part", "pageToken", "key", "maxResults"];

/// Result ordering for [`YouTube::search`].
///
/// See: <https://developers.google.com/youtube/v3/docs/search/list#order>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    Date,
    Rating,
    /// The API's default.
    Relevance,
    Title,
    VideoCount,
    ViewCount,
}

impl SearchOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Rating => "rating",
            Self::Relevance => "relevance",
            Self::Title => "title",
            Self::VideoCount => "videoCount",
            Self::ViewCount => "viewCount",
        }
    }
}

impl fmt::Display for SearchOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to search for.
///
/// ```rust
/// use youtube_data::{ResourceKind, SearchParams};
///
/// let params = SearchParams::new("rust async")
///     .kind(ResourceKind::Video)
///     .per_page(25);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub query: Option<String>,
    /// Restrict results to one kind (`type=`).
    pub kind: Option<ResourceKind>,
    /// Results per page. Defaults to [`Config::page_size`].
    pub per_page: Option<u32>,
    pub published_after: Option<Timestamp>,
    pub channel_id: Option<String>,
    pub order: Option<SearchOrder>,
    /// Raw `search.list` parameters passed through as-is (`regionCode`, `videoDuration`, ...).
    pub extra: Vec<(String, String)>,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    pub fn kind(mut self, kind: ResourceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn published_after(mut self, published_after: Timestamp) -> Self {
        self.published_after = Some(published_after);
        self
    }

    pub fn channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn order(mut self, order: SearchOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    fn into_request(self, default_page_size: u32) -> Result<FetchRequest> {
        let per_page = checked_page_size(self.per_page.unwrap_or(default_page_size))?;
        let mut request = FetchRequest::new(Endpoint::Search, "snippet")
            .param("maxResults", per_page.to_string());

        if let Some(query) = self.query {
            if query.trim().is_empty() {
                return Err(Error::invalid("search query must not be empty"));
            }
            request = request.param("q", query);
        }
        if let Some(kind) = self.kind {
            request = request.param("type", kind.as_str());
        }
        if let Some(published_after) = self.published_after {
            request = request.param("publishedAfter", published_after.to_string());
        }
        if let Some(channel_id) = self.channel_id {
            let channel = ResourceId::new(ResourceKind::Channel, channel_id)?;
            request = request.param("channelId", channel.id());
        }
        if let Some(order) = self.order {
            request = request.param("order", order.as_str());
        }
        for (key, value) in self.extra {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                return Err(Error::invalid(format!(
                    "'{key}' is managed by the paginator and cannot be set directly"
                )));
            }
            request = request.param(key, value);
        }
        Ok(request)
    }
}

/// Validates a page size: zero is rejected, anything over the API maximum is clamped.
fn checked_page_size(per_page: u32) -> Result<u32> {
    let max = API_MAX_BATCH as u32;
    match per_page {
        0 => Err(Error::invalid("page size must be at least 1")),
        n if n > max => {
            tracing::warn!(requested = n, max, "page size too large, clamping");
            Ok(max)
        }
        n => Ok(n),
    }
}

/// A YouTube Data API client handing out lazily resolved [`Resource`]s and [`Paginator`]s.
///
/// Every argument is validated before any request is made, failing with
/// [`Error::InvalidArgument`].
///
/// ```rust,no_run
/// use tokio_stream::StreamExt;
/// use youtube_data::{Config, SearchParams, YouTube};
///
/// # async fn example() -> youtube_data::Result<()> {
/// let yt = YouTube::new(Config::from_env()?)?;
///
/// let video = yt.video("jNQXAC9IVRw")?;
/// println!("{} has {} views", video.get_str("title").await?, video.get_u64("n_views").await?);
///
/// let mut results = yt.search(SearchParams::new("rust"))?.take(10);
/// while let Some(result) = results.next().await {
///     println!("{}", result?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct YouTube {
    config: Arc<Config>,
    resolver: Resolver,
}

impl YouTube {
    /// Talks to the API over HTTPS.
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Uses `transport` for every request; handy for tests (see the `mock` feature).
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let resolver = Resolver::new(transport, config.max_batch_size());
        Self {
            config: Arc::new(config),
            resolver,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// A lazily resolved resource. Makes no request.
    pub fn lazy(&self, kind: ResourceKind, id: impl Into<String>) -> Result<Resource> {
        Ok(self.resolver.lazy(ResourceId::new(kind, id)?))
    }

    pub fn video(&self, id: impl Into<String>) -> Result<Resource> {
        self.lazy(ResourceKind::Video, id)
    }

    pub fn channel(&self, id: impl Into<String>) -> Result<Resource> {
        self.lazy(ResourceKind::Channel, id)
    }

    pub fn playlist(&self, id: impl Into<String>) -> Result<Resource> {
        self.lazy(ResourceKind::Playlist, id)
    }

    /// The video a watch, share, embed or shorts URL points at. Makes no request.
    pub fn video_from_url(&self, url: &str) -> Result<Resource> {
        let id = video_id_from_url(url)
            .ok_or_else(|| Error::invalid(format!("no video id in '{url}'")))?;
        self.video(id)
    }

    /// Fully resolves `ids` in as few requests as possible. See [`Resolver::resolve`].
    pub async fn resolve<S: AsRef<str>>(
        &self,
        kind: ResourceKind,
        ids: &[S],
    ) -> Result<Vec<Resource>> {
        self.resolver.resolve(kind, ids).await
    }

    pub async fn videos<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Resource>> {
        self.resolve(ResourceKind::Video, ids).await
    }

    pub async fn channels<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Resource>> {
        self.resolve(ResourceKind::Channel, ids).await
    }

    pub async fn playlists<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Resource>> {
        self.resolve(ResourceKind::Playlist, ids).await
    }

    /// Searches for videos, channels and playlists.
    ///
    /// Each result arrives pre-populated with the fields the search snippet carries (title,
    /// description, channel, publication time); reading anything else fetches the resource.
    ///
    /// The API stops paging search results after a few hundred items; bound long scans with
    /// [`tokio_stream::StreamExt::take`].
    #[instrument(skip(self))]
    pub fn search(&self, params: SearchParams) -> Result<Paginator> {
        let request = params.into_request(self.config.page_size)?;
        Ok(Paginator::new(self.resolver.clone(), request))
    }

    /// The videos of a playlist, in playlist order.
    ///
    /// Playlist entries describe the entry rather than the video, so the yielded video
    /// resources start out empty.
    #[instrument(skip(self))]
    pub fn playlist_items(&self, playlist_id: &str) -> Result<Paginator> {
        let playlist = ResourceId::new(ResourceKind::Playlist, playlist_id)?;
        let per_page = checked_page_size(self.config.page_size)?;
        let request = FetchRequest::new(Endpoint::PlaylistItems, "id,contentDetails")
            .param("playlistId", playlist.id())
            .param("maxResults", per_page.to_string());
        Ok(Paginator::new(self.resolver.clone(), request))
    }

    /// Every video a channel has uploaded, newest first.
    ///
    /// Resolves the channel first if its uploads playlist is not cached yet.
    pub async fn channel_uploads(&self, channel: &Resource) -> Result<Paginator> {
        if channel.kind() != ResourceKind::Channel {
            return Err(Error::invalid(format!("{} is not a channel", channel.id())));
        }
        let uploads = channel.related("uploads_playlist_id").await?;
        self.playlist_items(uploads.id().id())
    }

    /// A resolver that remembers resolved resources across calls, sharing this client's
    /// transport.
    pub fn cached(&self) -> CachedResolver {
        CachedResolver::new(self.resolver.clone())
    }
}
