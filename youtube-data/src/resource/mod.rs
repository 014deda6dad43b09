//! Resource identities and the lazily populated [`Resource`] proxy.
//!
//! The API groups the attributes of a resource into *parts* (`snippet`, `contentDetails`,
//! `statistics`, ...). Each [`ResourceKind`] has an explicit field table (see [`fields`])
//! mapping a field name to the part and key it is read from, and to the type it converts to.
//! Asking a [`Resource`] for a field that is not cached fetches every part of that kind in
//! one request, so a resource is never fetched field by field.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

pub mod fields;
mod proxy;

pub use fields::{FieldDef, FieldType, FieldValue};
pub use proxy::Resource;

/// The category of a remote entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Video,
    Channel,
    Playlist,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::Video, Self::Channel, Self::Playlist];

    /// The lowercase name the API uses for this kind (`type=` in searches).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Channel => "channel",
            Self::Playlist => "playlist",
        }
    }

    /// The `*.list` endpoint that looks up resources of this kind by id.
    pub fn endpoint(self) -> Endpoint {
        match self {
            Self::Video => Endpoint::Videos,
            Self::Channel => Endpoint::Channels,
            Self::Playlist => Endpoint::Playlists,
        }
    }

    /// Every field defined for this kind.
    pub fn fields(self) -> &'static [FieldDef] {
        match self {
            Self::Video => fields::VIDEO,
            Self::Channel => fields::CHANNEL,
            Self::Playlist => fields::PLAYLIST,
        }
    }

    /// Looks up a field definition by name.
    pub fn field(self, name: &str) -> Option<&'static FieldDef> {
        self.fields().iter().find(|def| def.name == name)
    }

    /// The `part` parameter that returns every field of this kind in one request.
    pub fn full_part(self) -> String {
        let mut parts = vec!["id"];
        for def in self.fields() {
            if !parts.contains(&def.part) {
                parts.push(def.part);
            }
        }
        parts.join(",")
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    /// Accepts both `video` and the API's `youtube#video` form.
    fn from_str(s: &str) -> Result<Self> {
        let bare = s.strip_prefix("youtube#").unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == bare)
            .ok_or_else(|| Error::invalid(format!("unrecognised resource kind '{s}'")))
    }
}

/// The API endpoints this crate reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Videos,
    Channels,
    Playlists,
    PlaylistItems,
    Search,
}

impl Endpoint {
    /// Path segment below the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Self::Videos => "videos",
            Self::Channels => "channels",
            Self::Playlists => "playlists",
            Self::PlaylistItems => "playlistItems",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Identifies one remote resource: its kind plus the opaque id YouTube assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    kind: ResourceKind,
    id: String,
}

impl ResourceId {
    /// Fails with [`Error::InvalidArgument`] if `id` is empty, only whitespace, or contains a
    /// comma (the separator of batched lookups).
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::invalid(format!("empty {kind} identifier")));
        }
        if id.contains(',') {
            return Err(Error::invalid(format!("{kind} identifier '{id}' contains a comma")));
        }
        Ok(Self { kind, id })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.id)
    }
}
