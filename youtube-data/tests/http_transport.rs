// HTTP-level tests for `HttpTransport` and the client on top of it, using wiremock.

use serde_json::json;
use tokio_stream::StreamExt;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use youtube_data::{Config, Credentials, Error, ResourceKind, SearchParams, YouTube};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, YouTube) {
    let server = MockServer::start().await;
    let config = Config::with_api_key("test-key").with_base_url(server.uri());
    let yt = YouTube::new(config).unwrap();
    (server, yt)
}

fn search_item(video_id: &str) -> serde_json::Value {
    json!({
        "kind": "youtube#searchResult",
        "id": { "kind": "youtube#video", "videoId": video_id },
        "snippet": { "title": format!("title of {video_id}"), "channelId": "UC1" }
    })
}

fn error_body(code: u16, reason: &str, message: &str) -> serde_json::Value {
    json!({
        "error": {
            "code": code,
            "message": message,
            "errors": [{ "domain": "global", "reason": reason, "message": message }]
        }
    })
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_video_lookup_requests_every_part_once() {
    let (server, yt) = setup().await;

    let body = json!({
        "kind": "youtube#videoListResponse",
        "items": [{
            "kind": "youtube#video",
            "id": "jNQXAC9IVRw",
            "snippet": {
                "title": "Me at the zoo",
                "publishedAt": "2005-04-24T03:31:52Z",
                "channelId": "UC4QobU6STFB0P71PMvOGN5A",
                "tags": ["jawed", "zoo"]
            },
            "contentDetails": { "duration": "PT19S" },
            "status": { "privacyStatus": "public" },
            "statistics": { "viewCount": "371498391", "likeCount": "18002543" }
        }],
        "pageInfo": { "totalResults": 1, "resultsPerPage": 1 }
    });

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("key", "test-key"))
        .and(query_param("id", "jNQXAC9IVRw"))
        .and(query_param("part", "id,snippet,contentDetails,status,statistics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let video = yt.video("jNQXAC9IVRw").unwrap();
    assert_eq!(video.get_str("title").await.unwrap(), "Me at the zoo");
    assert_eq!(video.get_u64("n_views").await.unwrap(), 371_498_391);
    assert_eq!(video.get_duration("duration").await.unwrap().as_secs(), 19);
    assert_eq!(video.get_list("tags").await.unwrap(), ["jawed", "zoo"]);
    assert_eq!(
        video.related("channel_id").await.unwrap().kind(),
        ResourceKind::Channel
    );
}

#[tokio::test]
async fn test_batched_lookup_keeps_input_order() {
    let (server, yt) = setup().await;

    // deliberately out of order, and without "c"
    let body = json!({
        "items": [
            { "kind": "youtube#channel", "id": "b", "snippet": { "title": "B" } },
            { "kind": "youtube#channel", "id": "a", "snippet": { "title": "A" } }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("id", "a,b,c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let channels = yt.channels(&["a", "b", "c"]).await.unwrap();
    assert_eq!(channels[0].get_str("title").await.unwrap(), "A");
    assert_eq!(channels[1].get_str("title").await.unwrap(), "B");
    assert!(channels[2].get("title").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_search_follows_page_tokens() {
    let (server, yt) = setup().await;

    let first = json!({
        "kind": "youtube#searchListResponse",
        "nextPageToken": "CAIQAA",
        "pageInfo": { "totalResults": 4, "resultsPerPage": 2 },
        "items": [search_item("v1"), search_item("v2")]
    });
    let last = json!({
        "kind": "youtube#searchListResponse",
        "pageInfo": { "totalResults": 4, "resultsPerPage": 2 },
        "items": [search_item("v3"), search_item("v4")]
    });

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "zoo"))
        .and(query_param("maxResults", "2"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&first))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("pageToken", "CAIQAA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&last))
        .expect(1)
        .mount(&server)
        .await;

    let mut results = yt.search(SearchParams::new("zoo").per_page(2)).unwrap();
    let mut ids = Vec::new();
    while let Some(video) = results.next().await {
        ids.push(video.unwrap().id().id().to_string());
    }
    assert_eq!(ids, ["v1", "v2", "v3", "v4"]);
    assert_eq!(results.pages_fetched(), 2);
    assert_eq!(results.total_results(), Some(4));
}

#[tokio::test]
async fn test_bearer_tokens_go_in_the_header() {
    let server = MockServer::start().await;
    let config =
        Config::new(Credentials::BearerToken("ya29.token".into())).with_base_url(server.uri());
    let yt = YouTube::new(config).unwrap();

    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(header("Authorization", "Bearer ya29.token"))
        .and(query_param_is_missing("key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let playlist = yt.playlist("PL1").unwrap();
    assert!(playlist.get("title").await.unwrap_err().is_not_found());
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_invalid_key_is_an_auth_error() {
    let (server, yt) = setup().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body(
            400,
            "keyInvalid",
            "API key not valid. Please pass a valid API key.",
        )))
        .mount(&server)
        .await;

    let err = yt.videos(&["v1"]).await.unwrap_err();
    assert!(err.is_auth(), "{err:?}");
}

#[tokio::test]
async fn test_quota_exhaustion_is_a_transport_error() {
    let (server, yt) = setup().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_json(error_body(
            403,
            "quotaExceeded",
            "The request cannot be completed because you have exceeded your quota.",
        )))
        .mount(&server)
        .await;

    let mut results = yt.search(SearchParams::new("zoo")).unwrap();
    let err = results.next().await.unwrap().unwrap_err();
    match err {
        Error::Transport { status, message } => {
            assert_eq!(status, Some(403));
            assert!(message.contains("quota"), "{message}");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
    assert!(results.next().await.is_none());
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let (server, yt) = setup().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = yt.video("v1").unwrap().get("title").await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }), "{err:?}");
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error_without_status() {
    // nothing listens on the discard port
    let config = Config::with_api_key("test-key").with_base_url("http://127.0.0.1:9");
    let yt = YouTube::new(config).unwrap();

    let err = yt.videos(&["v1"]).await.unwrap_err();
    assert!(
        matches!(err, Error::Transport { status: None, .. }),
        "{err:?}"
    );
}
