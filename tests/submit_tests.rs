use axum::{
    body::{Body, Bytes},
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use osdk_wizard::submit::{Generator, NoDialog, Progress, SaveChoice, SaveDialog, SaveTo, SubmitError};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

const ARCHIVE: &[u8] = b"PK\x03\x04not-really-a-zip";

/// Serve `router` on an ephemeral port and return its base URL
async fn spawn_backend(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service()).await.unwrap();
    });
    format!("http://{addr}")
}

struct CancelDialog;

#[async_trait::async_trait]
impl SaveDialog for CancelDialog {
    async fn choose(&self, _suggested_name: &str) -> SaveChoice {
        SaveChoice::Cancelled
    }
}

#[tokio::test]
async fn test_backend_error_surfaces_body_and_clears_busy() {
    let base = spawn_backend(Router::new().route(
        "/api/v1/generate",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    ))
    .await;
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(&base, dir.path());

    let err = generator.generate(r#"{"projectName": "p"}"#, &NoDialog).await.unwrap_err();
    assert!(matches!(err, SubmitError::Backend { status: 500, .. }));
    assert!(err.to_string().contains("boom"));
    assert!(!generator.is_busy());
    assert_eq!(generator.progress(), Progress::Idle);
    assert!(!dir.path().join("p.zip").exists());
}

#[tokio::test]
async fn test_archive_downloaded_with_progress() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::default();
    let router = Router::new()
        .route(
            "/api/v1/generate",
            post(|State(seen): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                *seen.lock().unwrap() = Some(body);
                ARCHIVE.to_vec()
            }),
        )
        .with_state(seen.clone());
    let base = spawn_backend(router).await;
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(&base, dir.path());

    // Sent verbatim, including fields the structured model does not know
    let text = r#"{"projectName": "widget-operator", "extra": 1, "crds": []}"#;
    let mut stages = Vec::new();
    let archive = generator
        .generate_with_progress(text, &NoDialog, |p| stages.push(p))
        .await
        .unwrap();

    assert_eq!(archive.filename, "widget-operator.zip");
    assert_eq!(archive.path, dir.path().join("widget-operator.zip"));
    assert_eq!(archive.bytes, ARCHIVE.len() as u64);
    assert_eq!(std::fs::read(&archive.path).unwrap(), ARCHIVE);

    assert_eq!(stages.first(), Some(&Progress::Generating));
    assert!(stages.contains(&Progress::Downloading(100)));
    assert_eq!(stages.last(), Some(&Progress::Idle));
    assert_eq!(generator.progress(), Progress::Idle);

    let sent = seen.lock().unwrap().clone().unwrap();
    assert_eq!(sent["extra"], 1);
}

#[tokio::test]
async fn test_unknown_length_is_indeterminate() {
    let router = Router::new().route(
        "/api/v1/generate",
        post(|| async {
            let chunks = vec![
                Ok::<_, std::io::Error>(Bytes::from_static(b"PK")),
                Ok(Bytes::from_static(b"\x03\x04")),
            ];
            Body::from_stream(futures::stream::iter(chunks))
        }),
    );
    let base = spawn_backend(router).await;
    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(&base, dir.path());

    let mut stages = Vec::new();
    let archive = generator
        .generate_with_progress("{}", &NoDialog, |p| stages.push(p))
        .await
        .unwrap();

    assert_eq!(archive.filename, "operator-sdk-project.zip");
    assert_eq!(std::fs::read(&archive.path).unwrap(), b"PK\x03\x04");
    assert!(stages.contains(&Progress::Indeterminate));
    assert!(!stages.iter().any(|p| matches!(p, Progress::Downloading(_))));
}

#[tokio::test]
async fn test_save_as_target_and_cancel() {
    let router = Router::new().route("/api/v1/generate", post(|| async { ARCHIVE.to_vec() }));
    let base = spawn_backend(router).await;
    let downloads = tempfile::tempdir().unwrap();
    let chosen = tempfile::tempdir().unwrap();
    let generator = Generator::new(&base, downloads.path());

    let target = chosen.path().join("custom-name.zip");
    let archive = generator
        .generate(r#"{"projectName": "op"}"#, &SaveTo(target.clone()))
        .await
        .unwrap();
    assert_eq!(archive.path, target);

    let err = generator.generate(r#"{"projectName": "op"}"#, &CancelDialog).await.unwrap_err();
    assert!(matches!(err, SubmitError::Cancelled));
    assert_eq!(err.to_string(), "Download cancelled by user");
    assert!(!downloads.path().join("op.zip").exists());
    assert!(!generator.is_busy());
}

#[tokio::test]
async fn test_only_one_generation_in_flight() {
    let router = Router::new().route(
        "/api/v1/generate",
        post(|| async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            ARCHIVE.to_vec()
        }),
    );
    let base = spawn_backend(router).await;
    let dir = tempfile::tempdir().unwrap();
    let generator = Arc::new(Generator::new(&base, dir.path()));

    let first = {
        let generator = Arc::clone(&generator);
        tokio::spawn(async move { generator.generate("{}", &NoDialog).await })
    };
    while !generator.is_busy() {
        tokio::task::yield_now().await;
    }

    let second = generator.generate("{}", &NoDialog).await;
    assert!(matches!(second, Err(SubmitError::Busy)));

    first.await.unwrap().unwrap();
    assert!(!generator.is_busy());
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let generator = Generator::new(&format!("http://{addr}"), ".");
    let err = generator.generate("{}", &NoDialog).await.unwrap_err();
    assert!(matches!(err, SubmitError::Transport(_)));
    assert!(err.to_string().starts_with("Error sending data to backend:"));
    assert!(!generator.is_busy());
}

#[tokio::test]
async fn test_oversized_content_length_is_transport_error() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Announces far more than it sends, then hangs up
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 9223372036854775000\r\n\r\nPK")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let dir = tempfile::tempdir().unwrap();
    let generator = Generator::new(&format!("http://{addr}"), dir.path());
    let err = generator.generate("{}", &NoDialog).await.unwrap_err();
    assert!(matches!(err, SubmitError::Transport(_)));
    assert!(!generator.is_busy());
    assert_eq!(generator.progress(), Progress::Idle);
    assert!(!dir.path().join("operator-sdk-project.zip").exists());
}
