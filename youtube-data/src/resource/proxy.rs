use crate::cache::FieldCache;
use crate::error::{Error, Result};
use crate::resolver::Resolver;
use crate::resource::{FieldDef, FieldValue, ResourceId, ResourceKind};
use jiff::{SignedDuration, Timestamp};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

#[derive(Debug)]
enum State {
    Known(FieldCache),
    /// The API has told us this resource does not exist.
    Missing,
}

impl State {
    /// `None` means the field may exist but has not been fetched yet.
    fn lookup(&self, id: &ResourceId, def: &FieldDef) -> Option<Result<FieldValue>> {
        match self {
            Self::Missing => Some(Err(Error::ResourceNotFound(id.clone()))),
            Self::Known(cache) => match cache.get(def.name) {
                Some(value) => Some(Ok(value.clone())),
                None if cache.is_complete() => Some(Err(Error::FieldNotFound {
                    id: id.clone(),
                    field: def.name,
                })),
                None => None,
            },
        }
    }
}

/// A lazily populated YouTube resource.
///
/// Fields that are already cached are returned immediately. The first read of a field that is
/// not cached fetches *every* part of the resource in a single request and caches all of it,
/// so later reads of other fields make no further requests.
///
/// Cloning a `Resource` yields another handle to the same cache. Resources compare equal when
/// they have the same [`ResourceId`], whether or not they share a cache.
///
/// ```rust,no_run
/// # async fn example(yt: youtube_data::YouTube) -> youtube_data::Result<()> {
/// let video = yt.video("jNQXAC9IVRw")?;
/// let title = video.get_str("title").await?; // one request
/// let views = video.get_u64("n_views").await?; // cached
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Resource {
    id: ResourceId,
    resolver: Resolver,
    /// Held across the fill-on-miss request so concurrent readers trigger a single fetch.
    state: Arc<Mutex<State>>,
}

impl Resource {
    pub(crate) fn new(id: ResourceId, resolver: Resolver, cache: FieldCache) -> Self {
        Self {
            id,
            resolver,
            state: Arc::new(Mutex::new(State::Known(cache))),
        }
    }

    pub(crate) fn missing(id: ResourceId, resolver: Resolver) -> Self {
        Self {
            id,
            resolver,
            state: Arc::new(Mutex::new(State::Missing)),
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.id.kind()
    }

    fn field_def(&self, field: &str) -> Result<&'static FieldDef> {
        self.kind().field(field).ok_or_else(|| {
            Error::invalid(format!("'{field}' is not a field of {} resources", self.kind()))
        })
    }

    /// Returns `field`, fetching the whole resource first if it is not cached.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidArgument`] if `field` is not defined for this kind (no request made)
    /// * [`Error::ResourceNotFound`] if the resource does not exist
    /// * [`Error::FieldNotFound`] if the API does not return `field` for this resource
    /// * [`Error::Transport`] / [`Error::Auth`] if the fetch fails
    #[instrument(skip(self), fields(id = %self.id), level = tracing::Level::TRACE)]
    pub async fn get(&self, field: &str) -> Result<FieldValue> {
        let def = self.field_def(field)?;
        let mut state = self.state.lock().await;
        if let Some(result) = state.lookup(&self.id, def) {
            return result;
        }

        tracing::debug!(id = %self.id, field, "cache miss, fetching resource");
        self.fill(&mut state).await?;

        state.lookup(&self.id, def).unwrap_or_else(|| {
            Err(Error::FieldNotFound {
                id: self.id.clone(),
                field: def.name,
            })
        })
    }

    /// Fetches every part of this resource again, replacing cached values.
    pub async fn reload(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.fill(&mut state).await
    }

    async fn fill(&self, state: &mut State) -> Result<()> {
        match self.resolver.fetch_one(&self.id).await? {
            Some(fresh) => match state {
                State::Known(cache) => cache.merge(fresh),
                State::Missing => *state = State::Known(fresh),
            },
            None => {
                tracing::debug!(id = %self.id, "resource does not exist");
                *state = State::Missing;
            }
        }
        Ok(())
    }

    /// Returns `field` only if it is already cached. Never makes a request.
    pub async fn cached(&self, field: &str) -> Option<FieldValue> {
        match &*self.state.lock().await {
            State::Known(cache) => cache.get(field).cloned(),
            State::Missing => None,
        }
    }

    /// Whether every part of this resource has been fetched.
    pub async fn is_complete(&self) -> bool {
        matches!(&*self.state.lock().await, State::Known(cache) if cache.is_complete())
    }

    /// Follows a reference field (like a video's `channel_id`) to a lazily resolved resource.
    pub async fn related(&self, field: &str) -> Result<Resource> {
        match self.get(field).await? {
            FieldValue::Ref(id) => Ok(self.resolver.lazy(id)),
            _ => Err(Error::invalid(format!(
                "'{field}' of {} resources is not a reference",
                self.kind()
            ))),
        }
    }

    pub async fn get_str(&self, field: &str) -> Result<String> {
        let value = self.get(field).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| type_mismatch(field, "a string"))
    }

    pub async fn get_u64(&self, field: &str) -> Result<u64> {
        self.get(field)
            .await?
            .as_u64()
            .ok_or_else(|| type_mismatch(field, "an integer"))
    }

    pub async fn get_timestamp(&self, field: &str) -> Result<Timestamp> {
        self.get(field)
            .await?
            .as_timestamp()
            .ok_or_else(|| type_mismatch(field, "a timestamp"))
    }

    pub async fn get_duration(&self, field: &str) -> Result<SignedDuration> {
        self.get(field)
            .await?
            .as_duration()
            .ok_or_else(|| type_mismatch(field, "a duration"))
    }

    /// Whether a video is published under a Creative Commons license.
    ///
    /// Fails with [`Error::InvalidArgument`] for channels and playlists.
    pub async fn is_creative_commons(&self) -> Result<bool> {
        if self.kind() != ResourceKind::Video {
            return Err(Error::invalid(format!("{} has no license", self.id)));
        }
        Ok(self.get_str("license").await? == "creativeCommon")
    }

    pub async fn get_list(&self, field: &str) -> Result<Vec<String>> {
        match self.get(field).await? {
            FieldValue::StrList(list) => Ok(list),
            _ => Err(type_mismatch(field, "a list")),
        }
    }
}

fn type_mismatch(field: &str, expected: &str) -> Error {
    Error::invalid(format!("field '{field}' is not {expected}"))
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Resource");
        d.field("id", &self.id);
        match self.state.try_lock() {
            Ok(state) => d.field("state", &*state),
            Err(_) => d.field("state", &"<being fetched>"),
        };
        d.finish()
    }
}

/// Longest video title shown by `Display`, in characters.
const DISPLAY_TITLE_LEN: usize = 32;

/// `<Video jNQXAC9IVRw: "Me at the zoo" by jawed>` or `<Channel UC4QobU6STFB0P71PMvOGN5A: jawed>`
/// when the title is cached, `<Video jNQXAC9IVRw>` otherwise. Video titles are cut to 32
/// characters.
impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = |state: &State, field| match state {
            State::Known(cache) => cache.get(field).and_then(|v| v.as_str().map(str::to_string)),
            State::Missing => None,
        };
        let (title, channel_title) = match self.state.try_lock() {
            Ok(state) => (cached(&*state, "title"), cached(&*state, "channel_title")),
            Err(_) => (None, None),
        };

        let id = self.id.id();
        match (self.kind(), title) {
            (ResourceKind::Video, Some(title)) => {
                let title: String = title.chars().take(DISPLAY_TITLE_LEN).collect();
                write!(f, "<Video {id}: \"{title}\"")?;
                if let Some(channel_title) = channel_title {
                    write!(f, " by {channel_title}")?;
                }
                f.write_str(">")
            }
            (ResourceKind::Video, None) => write!(f, "<Video {id}>"),
            (ResourceKind::Channel, Some(title)) => write!(f, "<Channel {id}: {title}>"),
            (ResourceKind::Channel, None) => write!(f, "<Channel {id}>"),
            (ResourceKind::Playlist, Some(title)) => write!(f, "<Playlist {id}: {title}>"),
            (ResourceKind::Playlist, None) => write!(f, "<Playlist {id}>"),
        }
    }
}
