use std::fs;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use image::{Rgb, RgbImage};
use picframe::{
    AppState, ControlServer, FrameError, ImageSet, Playlist, PowerControl, ScaleMode, ServerConfig,
    SharedPlaylist, THUMBNAIL_SIZE, ThumbnailStore, router,
};
use tower::ServiceExt;

#[derive(Default)]
struct FakePower {
    supported: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl PowerControl for FakePower {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn shutdown(&self) -> picframe::Result<()> {
        self.calls.lock().unwrap().push("shutdown");
        Ok(())
    }

    fn reboot(&self) -> picframe::Result<()> {
        self.calls.lock().unwrap().push("reboot");
        Ok(())
    }
}

struct Frame {
    _root: tempfile::TempDir,
    pictures: PathBuf,
    thumbnails: PathBuf,
    playlist: SharedPlaylist,
    power: Arc<FakePower>,
    state: AppState,
}

fn write_picture(dir: &Path, name: &str) {
    RgbImage::from_pixel(40, 30, Rgb([120, 60, 200]))
        .save(dir.join(name))
        .unwrap();
}

fn frame(names: &[&str], power_supported: bool) -> Frame {
    let root = tempfile::tempdir().unwrap();
    let pictures = root.path().join("pictures");
    let thumbnails = root.path().join("thumbnails");
    fs::create_dir(&pictures).unwrap();
    for name in names {
        write_picture(&pictures, name);
    }

    let playlist = SharedPlaylist::new(Playlist::new(ImageSet::scan(&pictures).unwrap()));
    let power = Arc::new(FakePower {
        supported: power_supported,
        ..Default::default()
    });
    let state = AppState::new(
        playlist.clone(),
        ThumbnailStore::new(&thumbnails),
        power.clone(),
    );
    Frame {
        _root: root,
        pictures,
        thumbnails,
        playlist,
        power,
        state,
    }
}

async fn request(frame: &Frame, method: Method, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let resp = router(frame.state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec();
    (status, headers, body)
}

async fn get(frame: &Frame, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
    request(frame, Method::GET, uri).await
}

#[tokio::test]
async fn list_returns_basenames_and_next_wraps() {
    let fx = frame(&["a.png", "b.jpg", "c.jpeg"], false);

    let (status, _, body) = get(&fx, "/list").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(names, vec!["a.png", "b.jpg", "c.jpeg"]);

    let start = fx.playlist.lock().target_index();
    for _ in 0..3 {
        let (status, _, body) = get(&fx, "/next").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }
    assert_eq!(fx.playlist.lock().target_index(), start);

    get(&fx, "/prev").await;
    assert_eq!(fx.playlist.lock().target_index(), 2);
}

#[tokio::test]
async fn show_targets_known_names_only() {
    let fx = frame(&["a.png", "b.jpg", "c.jpeg"], false);

    let (status, _, _) = get(&fx, "/show?image=c.jpeg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fx.playlist.lock().target_index(), 2);

    let (status, _, _) = get(&fx, "/show?image=nope.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fx.playlist.lock().target_index(), 2);

    let (status, _, _) = get(&fx, "/show?image=..%2Fa.png").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fx.playlist.lock().target_index(), 2);
}

#[tokio::test]
async fn fit_and_fill_switch_scale_mode_for_any_method() {
    let fx = frame(&["a.png"], false);

    let (status, _, _) = request(&fx, Method::POST, "/fit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fx.playlist.lock().scale_mode(), ScaleMode::Fit);

    get(&fx, "/fill").await;
    assert_eq!(fx.playlist.lock().scale_mode(), ScaleMode::Fill);
}

#[tokio::test]
async fn serves_full_images_with_content_type() {
    let fx = frame(&["a.png", "b.jpg"], false);

    let (status, headers, body) = get(&fx, "/images/b.jpg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(body, fs::read(fx.pictures.join("b.jpg")).unwrap());

    let (status, headers, _) = get(&fx, "/images/a.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");

    let (status, _, _) = get(&fx, "/images/missing.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn image_routes_reject_traversal() {
    let fx = frame(&["a.png"], false);
    fs::write(fx.pictures.parent().unwrap().join("secret.png"), b"secret").unwrap();

    let (status, _, _) = get(&fx, "/images/..%2Fsecret.png").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _, _) = get(&fx, "/thumbnails/..%2Fsecret.png").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn thumbnails_are_generated_then_reused() {
    let fx = frame(&["a.png"], false);

    let (status, headers, first) = get(&fx, "/thumbnails/a.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    let thumb = image::load_from_memory(&first).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));

    let written = fs::metadata(fx.thumbnails.join("a.png")).unwrap().modified().unwrap();
    let (_, _, second) = get(&fx, "/thumbnails/a.png").await;
    assert_eq!(first, second);
    let again = fs::metadata(fx.thumbnails.join("a.png")).unwrap().modified().unwrap();
    assert_eq!(written, again);
}

#[tokio::test]
async fn broken_picture_thumbnail_is_a_server_error() {
    let fx = frame(&["a.png"], false);
    fs::write(fx.pictures.join("broken.jpg"), b"definitely not a jpeg").unwrap();

    let (status, _, _) = get(&fx, "/thumbnails/broken.jpg").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!fx.thumbnails.join("broken.jpg").exists());
}

#[tokio::test]
async fn power_actions_are_gated_on_host_support() {
    let unsupported = frame(&["a.png"], false);
    let (status, _, _) = get(&unsupported, "/shutdown").await;
    assert_eq!(status, StatusCode::OK);
    assert!(unsupported.power.calls.lock().unwrap().is_empty());

    let supported = frame(&["a.png"], true);
    let (status, _, _) = get(&supported, "/reboot").await;
    assert_eq!(status, StatusCode::OK);
    get(&supported, "/shutdown").await;
    assert_eq!(*supported.power.calls.lock().unwrap(), vec!["reboot", "shutdown"]);
}

#[tokio::test]
async fn index_refreshes_the_picture_list() {
    let fx = frame(&["a.png", "b.jpg"], false);
    write_picture(&fx.pictures, "c.png");

    let (status, headers, body) = get(&fx, "/index").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    assert!(String::from_utf8(body).unwrap().contains("3 pictures"));

    let (_, _, body) = get(&fx, "/list").await;
    let names: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(names, vec!["a.png", "b.jpg", "c.png"]);
}

#[tokio::test]
async fn status_reports_target_and_mode() {
    let fx = frame(&["a.png", "b.jpg"], false);
    get(&fx, "/next").await;
    get(&fx, "/fit").await;

    let (_, _, body) = get(&fx, "/status").await;
    let status: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status["count"], 2);
    assert_eq!(status["target_index"], 1);
    assert_eq!(status["target"], "b.jpg");
    assert_eq!(status["scale_mode"], "fit");
}

#[tokio::test]
async fn empty_directory_navigation_is_harmless() {
    let fx = frame(&[], false);
    for uri in ["/next", "/prev", "/show?image=a.png"] {
        let (status, _, _) = get(&fx, uri).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, _, body) = get(&fx, "/status").await;
    let status: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status["count"], 0);
    assert!(status["target"].is_null());
}

#[test]
fn server_binds_serves_and_stops() {
    let fx = frame(&["a.png", "b.jpg"], false);
    let config = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
    };
    let server = ControlServer::spawn(&config, fx.state.clone(), || {}).unwrap();
    let addr = server.local_addr();
    assert_ne!(addr.port(), 0);

    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .write_all(b"GET /next HTTP/1.1\r\nHost: frame\r\nConnection: close\r\n\r\n")
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    assert!(response.starts_with("HTTP/1.1 200"));
    assert_eq!(fx.playlist.lock().target_index(), 1);

    let taken = ServerConfig {
        host: "127.0.0.1".into(),
        port: addr.port(),
    };
    let err = ControlServer::spawn(&taken, fx.state.clone(), || {})
        .err()
        .unwrap();
    assert!(matches!(err, FrameError::Bind { .. }));

    server.stop().unwrap();
}
