//! Field tables for each resource kind and conversion of raw API values.

use crate::cache::FieldCache;
use crate::resource::{ResourceId, ResourceKind};
use crate::utils::parse_duration;
use jiff::{SignedDuration, Timestamp};
use serde_json::Value;
use std::fmt;

/// What a raw JSON value converts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    /// Counts. The API sends these as decimal strings.
    Int,
    /// RFC 3339 timestamp.
    Timestamp,
    /// ISO 8601 duration.
    Duration,
    StrList,
    /// The identifier of another resource.
    Ref(ResourceKind),
}

/// Where a field lives in an API item, and what type it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub part: &'static str,
    /// Key path inside `part`.
    pub path: &'static [&'static str],
    pub ty: FieldType,
}

const fn def(
    name: &'static str,
    part: &'static str,
    path: &'static [&'static str],
    ty: FieldType,
) -> FieldDef {
    FieldDef {
        name,
        part,
        path,
        ty,
    }
}

/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
pub const VIDEO: &[FieldDef] = &[
    def("title", "snippet", &["title"], FieldType::Str),
    def("description", "snippet", &["description"], FieldType::Str),
    def("published_at", "snippet", &["publishedAt"], FieldType::Timestamp),
    def("tags", "snippet", &["tags"], FieldType::StrList),
    def(
        "channel_id",
        "snippet",
        &["channelId"],
        FieldType::Ref(ResourceKind::Channel),
    ),
    def("channel_title", "snippet", &["channelTitle"], FieldType::Str),
    def("duration", "contentDetails", &["duration"], FieldType::Duration),
    def("license", "status", &["license"], FieldType::Str),
    def("privacy_status", "status", &["privacyStatus"], FieldType::Str),
    def("n_views", "statistics", &["viewCount"], FieldType::Int),
    def("n_likes", "statistics", &["likeCount"], FieldType::Int),
    def("n_dislikes", "statistics", &["dislikeCount"], FieldType::Int),
    def("n_favorites", "statistics", &["favoriteCount"], FieldType::Int),
    def("n_comments", "statistics", &["commentCount"], FieldType::Int),
];

/// See: <https://developers.google.com/youtube/v3/docs/channels#resource>
pub const CHANNEL: &[FieldDef] = &[
    def("title", "snippet", &["title"], FieldType::Str),
    def("description", "snippet", &["description"], FieldType::Str),
    def("published_at", "snippet", &["publishedAt"], FieldType::Timestamp),
    def("country", "snippet", &["country"], FieldType::Str),
    def(
        "uploads_playlist_id",
        "contentDetails",
        &["relatedPlaylists", "uploads"],
        FieldType::Ref(ResourceKind::Playlist),
    ),
    def("n_views", "statistics", &["viewCount"], FieldType::Int),
    def("n_subscribers", "statistics", &["subscriberCount"], FieldType::Int),
    def("n_videos", "statistics", &["videoCount"], FieldType::Int),
];

/// See: <https://developers.google.com/youtube/v3/docs/playlists#resource>
pub const PLAYLIST: &[FieldDef] = &[
    def("title", "snippet", &["title"], FieldType::Str),
    def("description", "snippet", &["description"], FieldType::Str),
    def("published_at", "snippet", &["publishedAt"], FieldType::Timestamp),
    def(
        "channel_id",
        "snippet",
        &["channelId"],
        FieldType::Ref(ResourceKind::Channel),
    ),
    def("channel_title", "snippet", &["channelTitle"], FieldType::Str),
    def("n_items", "contentDetails", &["itemCount"], FieldType::Int),
    def("privacy_status", "status", &["privacyStatus"], FieldType::Str),
];

/// A converted field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(u64),
    Timestamp(Timestamp),
    Duration(SignedDuration),
    StrList(Vec<String>),
    Ref(ResourceId),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Ref(id) => Some(id.id()),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<SignedDuration> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::StrList(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_ref_id(&self) -> Option<&ResourceId> {
        match self {
            Self::Ref(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Timestamp(ts) => write!(f, "{ts}"),
            Self::Duration(d) => write!(f, "{d}"),
            Self::StrList(list) => f.write_str(&list.join(", ")),
            Self::Ref(id) => f.write_str(id.id()),
        }
    }
}

impl FieldDef {
    /// Reads this field out of a raw API item, if it is present and well-formed.
    pub(crate) fn extract(&self, item: &Value) -> Option<FieldValue> {
        let mut value = item.get(self.part)?;
        for key in self.path {
            value = value.get(key)?;
        }
        let converted = self.convert(value);
        if converted.is_none() && !value.is_null() {
            tracing::warn!(
                field = self.name,
                raw = %value,
                "ignoring field value of unexpected shape"
            );
        }
        converted
    }

    fn convert(&self, value: &Value) -> Option<FieldValue> {
        match self.ty {
            FieldType::Str => value.as_str().map(|s| FieldValue::Str(s.to_string())),
            FieldType::Int => match value {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            }
            .map(FieldValue::Int),
            FieldType::Timestamp => value
                .as_str()
                .and_then(|s| s.parse().ok())
                .map(FieldValue::Timestamp),
            FieldType::Duration => value
                .as_str()
                .and_then(|s| parse_duration(s).ok())
                .map(FieldValue::Duration),
            FieldType::StrList => value
                .as_array()?
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(FieldValue::StrList),
            FieldType::Ref(kind) => value
                .as_str()
                .and_then(|s| ResourceId::new(kind, s).ok())
                .map(FieldValue::Ref),
        }
    }
}

/// Builds a cache holding every field of `kind` that `item` carries.
pub(crate) fn extract_all(kind: ResourceKind, item: &Value) -> FieldCache {
    let mut cache = FieldCache::new();
    for def in kind.fields() {
        if let Some(value) = def.extract(item) {
            cache.insert(def.name, value);
        }
    }
    cache
}
