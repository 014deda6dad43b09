//! Conversions for the API's string formats.

use crate::error::{Error, Result};
use jiff::{SignedDuration, Span};
use url::Url;

const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Converts an ISO 8601 duration (`PT4M13S`, `P1DT2H`, `P0D`) to a [`SignedDuration`].
///
/// Video durations never carry calendar units in practice, but when they do a year counts as
/// 365 days and a month as 30 days. Sub-second precision is dropped.
pub fn parse_duration(value: &str) -> Result<SignedDuration> {
    let span: Span = value
        .parse()
        .map_err(|e| Error::decode(format!("invalid ISO 8601 duration '{value}': {e}")))?;

    let days = i64::from(span.get_years()) * 365
        + i64::from(span.get_months()) * 30
        + i64::from(span.get_weeks()) * 7
        + i64::from(span.get_days());
    let secs = days * SECS_PER_DAY
        + i64::from(span.get_hours()) * 60 * 60
        + span.get_minutes() * 60
        + span.get_seconds();

    Ok(SignedDuration::from_secs(secs))
}

/// Extracts the video id from a YouTube URL.
///
/// Understands `watch?v=`, `youtu.be/<id>`, and `/embed/`, `/v/`, `/shorts/` and `/live/`
/// paths. Returns `None` for anything else.
pub fn video_id_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url.trim()).ok()?;

    if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
        return is_video_id(&v).then(|| v.into_owned());
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let candidate = match (url.host_str(), segments.as_slice()) {
        (Some("youtu.be" | "www.youtu.be"), [id, ..]) => *id,
        (_, [prefix, id, ..]) if matches!(*prefix, "embed" | "v" | "shorts" | "live") => *id,
        _ => return None,
    };
    is_video_id(candidate).then(|| candidate.to_string())
}

fn is_video_id(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(parse_duration("PT19S").unwrap(), SignedDuration::from_secs(19));
        assert_eq!(
            parse_duration("PT1H2M3S").unwrap(),
            SignedDuration::from_secs(3723)
        );
        assert_eq!(
            parse_duration("P1DT1S").unwrap(),
            SignedDuration::from_secs(SECS_PER_DAY + 1)
        );
        assert_eq!(
            parse_duration("P2W").unwrap(),
            SignedDuration::from_secs(14 * SECS_PER_DAY)
        );
        assert_eq!(
            parse_duration("P1M").unwrap(),
            SignedDuration::from_secs(30 * SECS_PER_DAY)
        );
        // live broadcasts report a zero duration
        assert_eq!(parse_duration("P0D").unwrap(), SignedDuration::ZERO);
    }

    #[test]
    fn malformed_durations_are_decode_errors() {
        let err = parse_duration("three minutes").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "{err:?}");
    }

    #[test]
    fn video_ids_from_urls() {
        let cases = [
            "https://www.youtube.com/watch?v=jNQXAC9IVRw",
            "https://www.youtube.com/watch?feature=share&v=jNQXAC9IVRw",
            "https://youtu.be/jNQXAC9IVRw",
            "https://youtu.be/jNQXAC9IVRw?t=3",
            "https://www.youtube.com/embed/jNQXAC9IVRw",
            "https://www.youtube.com/v/jNQXAC9IVRw?version=3",
            "https://www.youtube.com/shorts/jNQXAC9IVRw",
            "https://m.youtube.com/watch?v=jNQXAC9IVRw&list=PL123",
        ];
        for url in cases {
            assert_eq!(
                video_id_from_url(url).as_deref(),
                Some("jNQXAC9IVRw"),
                "{url}"
            );
        }
    }

    #[test]
    fn non_video_urls() {
        assert_eq!(video_id_from_url("https://www.youtube.com/"), None);
        assert_eq!(
            video_id_from_url("https://www.youtube.com/channel/UCMDQxm7cUx3yXkfeHa5zJIQ"),
            None
        );
        assert_eq!(video_id_from_url("jNQXAC9IVRw"), None);
        assert_eq!(video_id_from_url("https://www.youtube.com/watch?v=<script>"), None);
    }
}
