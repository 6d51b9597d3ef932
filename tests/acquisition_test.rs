mod common;

use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use common::{start_server, write_adts, write_caf, write_mp3, write_wav};
use listening_lab::acquisition::{
    mime_for_extension, AcquisitionManager, AudioStore, TemplateResolver,
};
use listening_lab::config::AcquisitionConfig;
use listening_lab::{PipelineError, ValidationError};

fn manager(root: &std::path::Path) -> AcquisitionManager {
    let store = AudioStore::open(root.join("audio")).unwrap();
    AcquisitionManager::new(store, reqwest::Client::new(), &AcquisitionConfig::default())
}

fn wav_bytes(seconds: f64) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    write_wav(&path, seconds);
    std::fs::read(path).unwrap()
}

#[tokio::test]
async fn native_containers_are_imported_with_their_duration() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager(dir.path());
    let writers: [(&str, fn(&std::path::Path, f64)); 4] = [
        ("wav", write_wav),
        ("caf", write_caf),
        ("mp3", write_mp3),
        ("aac", write_adts),
    ];

    for (ext, write) in writers {
        let source = dir.path().join(format!("recording.{}", ext));
        write(&source, 2.0);

        let draft = manager.import_local(&source).await.unwrap();
        assert!((draft.duration - 2.0).abs() < 0.1, "{ext}: {}", draft.duration);
        assert_eq!(draft.title, "recording");
        assert!(draft.audio_file_name.ends_with(&format!(".{}", ext)));
    }
    assert_eq!(manager.store().list().unwrap().len(), 4);
}

#[tokio::test]
async fn allowed_extensions_are_matched_case_insensitively() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager(dir.path());

    // Container detection goes by content, so an .m4a/.mp4 holding PCM still imports.
    for ext in ["m4a", "mp4", "WAV"] {
        let source = dir.path().join(format!("Lecture {}.{}", ext, ext));
        write_wav(&source, 1.0);

        let draft = manager.import_local(&source).await.unwrap();
        assert!(draft.duration > 0.9 && draft.duration < 1.1, "{ext}: {}", draft.duration);
        assert_eq!(draft.title, format!("Lecture {}", ext));
        assert!(draft
            .audio_file_name
            .ends_with(&format!(".{}", ext.to_ascii_lowercase())));
    }
}

#[tokio::test]
async fn unsupported_extension_is_rejected_before_copying() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager(dir.path());
    let source = dir.path().join("notes.txt");
    std::fs::write(&source, "not audio").unwrap();

    let err = manager.import_local(&source).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Validation(ValidationError::UnsupportedFormat(ref ext)) if ext == "txt"
    ));
    assert!(manager.store().list().unwrap().is_empty());
}

#[tokio::test]
async fn unreadable_audio_is_rejected_and_removed() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager(dir.path());
    let source = dir.path().join("broken.mp3");
    std::fs::write(&source, b"definitely not an mp3 stream").unwrap();

    let err = manager.import_local(&source).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Validation(ValidationError::UnreadableAudio(_))
    ));
    assert!(manager.store().list().unwrap().is_empty());
}

#[tokio::test]
async fn download_uses_the_suggested_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let body = wav_bytes(2.0);
    let app = Router::new().route(
        "/media/42",
        get(move || {
            let body = body.clone();
            async move {
                (
                    [
                        (header::CONTENT_TYPE, "audio/wav"),
                        (header::CONTENT_DISPOSITION, r#"attachment; filename="dialogue.wav""#),
                    ],
                    body,
                )
                    .into_response()
            }
        }),
    );
    let (addr, _) = start_server(app).await;
    let manager = manager(dir.path());

    let mut progress = Vec::new();
    let draft = manager
        .download_remote_with_progress(
            &format!("http://{}/media/42", addr),
            None,
            false,
            |done, total| progress.push((done, total)),
        )
        .await
        .unwrap();

    assert!(draft.audio_file_name.ends_with("_dialogue.wav"));
    assert_eq!(draft.title, "dialogue");
    assert!((draft.duration - 2.0).abs() < 0.1);
    let (done, total) = *progress.last().unwrap();
    assert_eq!(Some(done), total);
    assert_eq!(manager.store().list().unwrap(), vec![draft.audio_file_name]);
}

#[tokio::test]
async fn explicit_title_overrides_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let body = wav_bytes(0.5);
    let app = Router::new().route(
        "/files/track.wav",
        get(move || {
            let body = body.clone();
            async move { body }
        }),
    );
    let (addr, _) = start_server(app).await;
    let manager = manager(dir.path());

    let draft = manager
        .download_remote(
            &format!("http://{}/files/track.wav", addr),
            Some("Au marché"),
            false,
        )
        .await
        .unwrap();
    assert_eq!(draft.title, "Au marché");
    assert!(draft.audio_file_name.ends_with("_track.wav"));
}

#[tokio::test]
async fn failed_download_is_a_transport_error_and_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = Router::new().route("/gone.mp3", get(|| async { StatusCode::NOT_FOUND }));
    let (addr, _) = start_server(app).await;
    let manager = manager(dir.path());

    let err = manager
        .download_remote(&format!("http://{}/gone.mp3", addr), None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Transport(ref msg) if msg.contains("404")));
    assert!(manager.store().list().unwrap().is_empty());
}

#[tokio::test]
async fn non_http_url_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager(dir.path());
    for url in ["ftp://host/file.mp3", "not a url"] {
        let err = manager.download_remote(url, None, false).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::InvalidUrl(_))
        ));
    }
}

#[tokio::test]
async fn video_url_is_resolved_through_the_template() {
    let dir = tempfile::tempdir().unwrap();
    let body = wav_bytes(1.0);
    let app = Router::new().route(
        "/audio/{id}",
        get(move |axum::extract::Path(id): axum::extract::Path<String>| {
            let body = body.clone();
            async move {
                assert_eq!(id, "dQw4w9WgXcQ");
                ([(header::CONTENT_TYPE, "audio/wav")], body).into_response()
            }
        }),
    );
    let (addr, _) = start_server(app).await;
    let manager = manager(dir.path()).with_video_resolver(Arc::new(TemplateResolver::new(
        format!("http://{}/audio/{{id}}", addr),
    )));

    let draft = manager
        .download_remote("https://youtu.be/dQw4w9WgXcQ", None, true)
        .await
        .unwrap();
    assert_eq!(draft.title, "dQw4w9WgXcQ");
    assert!(draft.audio_file_name.ends_with(".wav"));
    assert!(draft.duration > 0.9);
}

#[tokio::test]
async fn video_url_without_id_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager(dir.path())
        .with_video_resolver(Arc::new(TemplateResolver::new("http://127.0.0.1:9/{id}")));

    let err = manager
        .download_remote("https://www.youtube.com/watch?list=abc", None, true)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Validation(ValidationError::InvalidUrl(_))
    ));
}

#[tokio::test]
async fn video_url_without_resolver_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = manager(dir.path())
        .download_remote("https://youtu.be/dQw4w9WgXcQ", None, true)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Validation(ValidationError::NoVideoResolver)
    ));
}

#[tokio::test]
async fn suggested_name_without_extension_takes_the_content_type() {
    let dir = tempfile::tempdir().unwrap();
    let body = wav_bytes(1.0);
    let app = Router::new().route(
        "/fetch",
        get(move || {
            let body = body.clone();
            async move {
                (
                    [
                        (header::CONTENT_TYPE, "audio/x-wav"),
                        (header::CONTENT_DISPOSITION, r#"attachment; filename="download""#),
                    ],
                    body,
                )
                    .into_response()
            }
        }),
    );
    let (addr, _) = start_server(app).await;
    let manager = manager(dir.path());

    let draft = manager
        .download_remote(&format!("http://{}/fetch", addr), None, false)
        .await
        .unwrap();
    assert!(draft.audio_file_name.ends_with("_download.wav"), "{}", draft.audio_file_name);
    assert_eq!(draft.title, "download");
    let ext = draft.audio_path.extension().unwrap().to_str().unwrap();
    assert_eq!(mime_for_extension(ext), "audio/wav");
}
