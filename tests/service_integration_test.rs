// End-to-end tests for the transformation endpoint.
//
// Each test boots a throwaway origin server that serves fixture images
// and a service instance pointed at it, then drives the service over
// real HTTP with reqwest.

use std::io::Cursor;
use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::routing::get;
use axum::Router;
use image::{DynamicImage, Rgba, RgbaImage};
use kagami::config::Config;

fn encoded_image(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([200, 120, 40, 255]),
    ));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

/// Origin serving fixture images: a 600x400 JPEG photo, a 32x32 PNG
/// fallback, and a path that always 404s.
async fn spawn_origin() -> SocketAddr {
    let app = Router::new()
        .route(
            "/photo.jpg",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "image/jpeg")],
                    encoded_image(600, 400, image::ImageFormat::Jpeg),
                )
            }),
        )
        .route(
            "/fallback.png",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "image/png")],
                    encoded_image(32, 32, image::ImageFormat::Png),
                )
            }),
        )
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/not-an-image", get(|| async { "plain text body" }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_service() -> String {
    let config = Config {
        address: "127.0.0.1".to_string(),
        port: 0,
        fetch_timeout: Duration::from_secs(5),
        log_json: false,
    };
    let router = kagami::http::router(&config).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_help_page_without_url_or_text() {
    let service = spawn_service().await;

    let response = reqwest::get(&service).await.unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Query Parameters"));
}

#[tokio::test]
async fn test_empty_text_serves_help_page() {
    let service = spawn_service().await;

    let response = reqwest::get(format!("{service}/?text=")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Query Parameters"));
}

#[tokio::test]
async fn test_resize_to_png() {
    let origin = spawn_origin().await;
    let service = spawn_service().await;

    let url = format!(
        "{service}/?url=http://{origin}/photo.jpg&w=300&h=200&output=png"
    );
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE.as_str()],
        "image/png"
    );
    assert_eq!(
        response.headers()[header::CACHE_CONTROL.as_str()],
        "max-age=31536000"
    );

    let body = response.bytes().await.unwrap();
    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (300, 200));
}

#[tokio::test]
async fn test_unreachable_origin_is_uniform_error() {
    let service = spawn_service().await;

    let url = format!("{service}/?url=http://127.0.0.1:1/nothing.jpg");
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "An error occurred while processing the image."
    );
}

#[tokio::test]
async fn test_garbage_payload_is_uniform_error() {
    let service = spawn_service().await;
    let origin = spawn_origin().await;

    // A 200 response whose body is not an image fails at decode time.
    let url = format!("{service}/?url=http://{origin}/not-an-image");
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn test_fallback_url_on_404() {
    let origin = spawn_origin().await;
    let service = spawn_service().await;

    let fallback = urlencoding::encode(&format!("http://{origin}/fallback.png")).into_owned();
    let url = format!("{service}/?url=http://{origin}/missing&default={fallback}&output=png");
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = response.bytes().await.unwrap();
    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (32, 32));
}

#[tokio::test]
async fn test_metadata_mode() {
    let origin = spawn_origin().await;
    let service = spawn_service().await;

    let url = format!("{service}/?url=http://{origin}/photo.jpg&output=json");
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["format"], "jpg");
    assert_eq!(body["width"], 600);
    assert_eq!(body["height"], 400);
    assert_eq!(body["hasAlpha"], false);
}

#[tokio::test]
async fn test_base64_encoding_mode() {
    let origin = spawn_origin().await;
    let service = spawn_service().await;

    let url = format!("{service}/?url=http://{origin}/photo.jpg&w=10&encoding=base64");
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let data = body["data"].as_str().unwrap();
    assert!(data.starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_custom_cache_and_disposition_headers() {
    let origin = spawn_origin().await;
    let service = spawn_service().await;

    let url = format!(
        "{service}/?url=http://{origin}/photo.jpg&w=10&maxage=60&filename=picture"
    );
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[header::CACHE_CONTROL.as_str()],
        "max-age=60"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION.as_str()],
        "attachment; filename=\"picture\""
    );
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let service = spawn_service().await;

    let response = reqwest::get(format!("{service}/nope")).await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_standalone_text_canvas() {
    if !kagami::text::fonts::available() {
        return;
    }
    let service = spawn_service().await;

    let url = format!("{service}/?text=hello&w=400&h=200");
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE.as_str()],
        "image/jpeg"
    );

    let body = response.bytes().await.unwrap();
    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (400, 200));
}

#[tokio::test]
async fn test_rounded_corner_text_canvas() {
    if !kagami::text::fonts::available() {
        return;
    }
    let service = spawn_service().await;

    let url = format!(
        "{service}/?text=hello&w=200&h=100&roundedCorners=true&cornerRadius=40&output=png"
    );
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = response.bytes().await.unwrap();
    let decoded = image::load_from_memory(&body).unwrap().to_rgba8();
    // Corner is clipped away; the canvas center stays opaque white.
    assert_eq!(decoded.get_pixel(0, 0)[3], 0);
    assert_eq!(decoded.get_pixel(100, 50)[3], 255);
}

#[tokio::test]
async fn test_text_composited_over_image() {
    if !kagami::text::fonts::available() {
        return;
    }
    let origin = spawn_origin().await;
    let service = spawn_service().await;

    let url = format!(
        "{service}/?url=http://{origin}/photo.jpg&text=hi&txtColor=%23000000&output=png"
    );
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 200);

    let body = response.bytes().await.unwrap();
    let decoded = image::load_from_memory(&body).unwrap().to_rgba8();
    assert_eq!((decoded.width(), decoded.height()), (600, 400));
    // Black glyphs land somewhere near the center of the orange photo.
    let has_dark = decoded.pixels().any(|p| p[0] < 80 && p[1] < 80 && p[2] < 80);
    assert!(has_dark);
}

#[tokio::test]
async fn test_effects_chain_succeeds() {
    let origin = spawn_origin().await;
    let service = spawn_service().await;

    let url = format!(
        "{service}/?url=http://{origin}/photo.jpg&w=50&blur=2&gam=1.8&mod=1.1,1.2,45&sharp=2&bg=%23fff&output=webp"
    );
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE.as_str()],
        "image/webp"
    );
    let body = response.bytes().await.unwrap();
    assert_eq!(&body[..4], b"RIFF");
}
