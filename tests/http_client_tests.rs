mod common;

use axum::http::StatusCode;
use serde_json::json;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

use clipcoach::api::{HttpVideoApi, UploadSource, VideoApi};
use clipcoach::config::Settings;
use clipcoach::ClipcoachError;
use common::{analysed_video, MockServer};

fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.server.base_url = format!("{}/", server.url());
    settings
}

fn client_for(server: &MockServer) -> HttpVideoApi {
    HttpVideoApi::from_settings(&settings_for(server)).expect("client builds")
}

/// Client whose ordinary requests give up after one second and uploads
/// after `upload_secs`
fn slow_client_for(server: &MockServer, upload_secs: u64) -> HttpVideoApi {
    let mut settings = settings_for(server);
    settings.server.request_timeout_secs = 1;
    settings.server.upload_timeout_secs = upload_secs;
    HttpVideoApi::from_settings(&settings).expect("client builds")
}

#[tokio::test]
async fn list_videos_decodes_records() {
    let server = MockServer::start();
    server.set_videos(vec![
        analysed_video("a", Some("/static/a.png")),
        json!({"video_id": "bare"}),
    ]);
    let api = client_for(&server);

    let videos = assert_ok!(api.list_videos().await);

    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].chapters[0].chapter_title, "Opening");
    assert_eq!(videos[0].thumbnail_url.as_deref(), Some("/static/a.png"));
    assert!(videos[1].advice.is_empty());
    assert_eq!(videos[1].thumbnail_url, None);
}

#[tokio::test]
async fn list_error_status_carries_service_message() {
    let server = MockServer::start();
    server.fail_videos(StatusCode::SERVICE_UNAVAILABLE);
    let api = client_for(&server);

    match assert_err!(api.list_videos().await) {
        ClipcoachError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "listing unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    let mut settings = Settings::default();
    settings.server.base_url = common::UNREACHABLE_SERVER.to_string();
    let api = HttpVideoApi::from_settings(&settings).unwrap();

    let err = assert_err!(api.list_videos().await);
    assert!(matches!(err, ClipcoachError::Network(_)), "{err:?}");
}

#[tokio::test]
async fn thumbnail_error_body_is_a_soft_failure() {
    let server = MockServer::start();
    server.set_thumbnail_reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "image quota exceeded"}),
    );
    let api = client_for(&server);

    let response = assert_ok!(api.generate_thumbnail("b", "summary of b").await);

    assert_eq!(response.error_message(), Some("image quota exceeded"));
    assert_eq!(response.thumbnail_url, None);
    assert_eq!(
        server.requests()[0].body,
        json!({"video_id": "b", "summary": "summary of b"})
    );
}

#[tokio::test]
async fn thumbnail_failure_without_error_body_is_hard() {
    let server = MockServer::start();
    server.set_thumbnail_reply(StatusCode::BAD_GATEWAY, json!("upstream exploded"));
    let api = client_for(&server);

    let err = assert_err!(api.generate_thumbnail("b", "s").await);
    assert!(matches!(err, ClipcoachError::Api { status: 502, .. }), "{err:?}");
}

#[tokio::test]
async fn upload_url_returns_analysed_record() {
    let server = MockServer::start();
    let api = client_for(&server);

    let record = assert_ok!(
        api.upload_video(&UploadSource::Url("https://example.com/clip.mp4".into()))
            .await
    );

    assert_eq!(record.video_id, "uploaded-1");
    assert_eq!(record.advice.improve, vec!["Trade your teammate faster"]);
}

#[tokio::test]
async fn upload_of_missing_file_never_reaches_service() {
    let server = MockServer::start();
    let api = client_for(&server);
    let dir = tempfile::tempdir().unwrap();

    let err = assert_err!(
        api.upload_video(&UploadSource::File(dir.path().join("gone.mp4")))
            .await
    );

    assert!(matches!(err, ClipcoachError::Io(_)), "{err:?}");
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn chat_returns_full_history() {
    let server = MockServer::start();
    let api = client_for(&server);

    assert_ok!(api.send_chat_message("a", "first", "S").await);
    let history = assert_ok!(api.send_chat_message("a", "nice shot?", "S").await);

    assert_eq!(history.len(), 2);
    assert_eq!(history[1].user, "nice shot?");
    assert_eq!(history[1].ai, "Coach says: nice shot?");
    assert_eq!(
        server.requests()[1].body,
        json!({"video_id": "a", "message": "nice shot?", "summary": "S"})
    );
}

#[tokio::test]
async fn upload_streams_large_file_in_full() {
    let server = MockServer::start();
    let api = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("long match.mp4");
    std::fs::write(&clip, vec![7u8; 3 * 1024 * 1024 + 17]).unwrap();

    assert_ok!(api.upload_video(&UploadSource::File(clip)).await);

    assert_eq!(
        server.requests()[0].body,
        json!({"file": {"file_name": "long match.mp4", "len": 3 * 1024 * 1024 + 17}})
    );
}

#[tokio::test]
async fn slow_list_hits_request_timeout() {
    let server = MockServer::start();
    server.set_delay(Duration::from_secs(2));
    let api = slow_client_for(&server, 5);

    let err = assert_err!(api.list_videos().await);
    assert!(matches!(err, ClipcoachError::Timeout(_)), "{err:?}");

    let err = assert_err!(api.send_chat_message("a", "hello", "S").await);
    assert!(matches!(err, ClipcoachError::Timeout(_)), "{err:?}");
}

#[tokio::test]
async fn upload_waits_past_request_timeout() {
    let server = MockServer::start();
    server.set_delay(Duration::from_secs(2));
    let api = slow_client_for(&server, 5);

    let record = assert_ok!(
        api.upload_video(&UploadSource::Url("https://example.com/clip.mp4".into()))
            .await
    );
    assert_eq!(record.video_id, "uploaded-1");
}

#[tokio::test]
async fn slow_upload_hits_upload_timeout() {
    let server = MockServer::start();
    server.set_delay(Duration::from_secs(3));
    let api = slow_client_for(&server, 1);

    let err = assert_err!(
        api.upload_video(&UploadSource::Url("https://example.com/clip.mp4".into()))
            .await
    );
    assert!(matches!(err, ClipcoachError::Timeout(_)), "{err:?}");
}
