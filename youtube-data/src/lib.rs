//! Lazily resolved YouTube Data API v3 resources.
//!
//! Ask for a video, channel or playlist by id and get back a [`Resource`] whose fields are
//! fetched the first time you read one of them, all at once, in a single request. Ask for many
//! ids at once and they are looked up in batches of up to 50. Searches and playlists come back
//! as a [`Paginator`], a [`Stream`](tokio_stream::Stream) that fetches the next page only when
//! you have consumed the current one.
//!
//! ```rust,no_run
//! use tokio_stream::StreamExt;
//! use youtube_data::{Config, ResourceKind, SearchParams, YouTube};
//!
//! # async fn example() -> youtube_data::Result<()> {
//! let yt = YouTube::new(Config::with_api_key("AIza..."))?;
//!
//! // one request for all three
//! for video in yt.videos(&["jNQXAC9IVRw", "dQw4w9WgXcQ", "9bZkp7q19f0"]).await? {
//!     println!("{video}: {} views", video.get_u64("n_views").await?);
//! }
//!
//! // one request per 50 results, only as far as we read
//! let mut channels = yt
//!     .search(SearchParams::new("rust programming").kind(ResourceKind::Channel))?
//!     .take(5);
//! while let Some(channel) = channels.next().await {
//!     let channel = channel?;
//!     println!("{channel} ({} subscribers)", channel.get_u64("n_subscribers").await?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Requests go through the [`Transport`] trait. [`HttpTransport`] is the real thing; with the
//! `mock` feature, `mock::MockTransport` serves canned responses and records every request.

mod cache;
mod cached;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod paginator;
mod resolver;
pub mod resource;
pub mod transport;
pub mod utils;
mod youtube;

pub use cache::FieldCache;
pub use cached::CachedResolver;
pub use config::{Config, Credentials};
pub use error::{Error, Result};
pub use paginator::Paginator;
pub use resolver::Resolver;
pub use resource::{FieldValue, Resource, ResourceId, ResourceKind};
pub use transport::{FetchRequest, HttpTransport, PageInfo, RawPage, Transport};
pub use youtube::{SearchOrder, SearchParams, YouTube};
