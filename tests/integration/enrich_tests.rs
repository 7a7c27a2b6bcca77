//! Integration tests for the enrichment backends
//!
//! The detection, OCR and rasterizer services are stood in for by wiremock
//! servers.

use image_finder::config::EnrichmentConfig;
use image_finder::enrich::{
    build_backend_client, ObjectDetector, OcrSpaceClient, Rasterizer, RemoteDetector,
    RemoteRasterizer, TextRecognizer, UnsupportedRasterizer,
};
use image_finder::{AiBackends, AssetResult, EnrichError, Enricher, ImageResult, LogoResult, PageResult};
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A small PNG with dark text-coloured pixels, optionally on a clear background
fn logo_png(transparent: bool) -> Vec<u8> {
    let background = if transparent {
        Rgba([0, 0, 0, 0])
    } else {
        Rgba([255, 255, 255, 255])
    };
    let mut pixels = RgbaImage::from_pixel(4, 4, background);
    pixels.put_pixel(1, 1, Rgba([20, 20, 20, 255]));

    let mut png = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .expect("Failed to encode PNG");
    png
}

async fn mount_rasterizer(server: &MockServer, png: Vec<u8>) {
    Mock::given(method("POST"))
        .and(path("/rasterize"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png, "image/png"))
        .mount(server)
        .await;
}

fn create_test_config(server: &MockServer) -> EnrichmentConfig {
    EnrichmentConfig {
        timeout_secs: 2,
        max_concurrent: 4,
        ocr_endpoint: format!("{}/parse/image", server.uri()),
        ocr_api_key: "test-key".to_string(),
        detector_endpoint: Some(format!("{}/detect", server.uri())),
        rasterizer_endpoint: Some(format!("{}/rasterize", server.uri())),
        score_threshold: 0.3,
        nms_threshold: 0.5,
    }
}

fn ocr_client(server: &MockServer) -> OcrSpaceClient {
    let config = create_test_config(server);
    let client = build_backend_client(&config).expect("Failed to build client");
    OcrSpaceClient::from_config(client, &config).expect("Failed to build OCR client")
}

fn ocr_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "ParsedResults": [{ "ParsedText": text, "FileParseExitCode": 1 }],
        "OCRExitCode": 1,
        "IsErroredOnProcessing": false
    }))
}

async fn mount_detector(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "class_id": 15, "score": 0.9, "bbox": [0.0, 0.0, 10.0, 10.0] },
            { "class_id": 16, "score": 0.8, "bbox": [1.0, 0.0, 10.0, 10.0] },
            { "class_id": 0, "score": 0.1, "bbox": [50.0, 50.0, 5.0, 5.0] },
            { "class_id": 2, "score": 0.5, "bbox": [100.0, 100.0, 20.0, 20.0] }
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_detector_filters_and_labels() {
    let mock_server = MockServer::start().await;
    let image_url = format!("{}/cat.png", mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/detect"))
        .and(body_json(json!({ "url": image_url })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "class_id": 15, "score": 0.9, "bbox": [0.0, 0.0, 10.0, 10.0] },
            { "class_id": 16, "score": 0.8, "bbox": [1.0, 0.0, 10.0, 10.0] },
            { "class_id": 0, "score": 0.1, "bbox": [50.0, 50.0, 5.0, 5.0] },
            { "class_id": 2, "score": 0.5, "bbox": [100.0, 100.0, 20.0, 20.0] }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server);
    let client = build_backend_client(&config).expect("Failed to build client");
    let detector = RemoteDetector::from_config(client, &config).expect("Failed to build detector");

    let detections = detector
        .detect(&Url::parse(&image_url).unwrap())
        .await
        .expect("Detection failed");

    let labels: Vec<_> = detections.iter().map(|d| d.class_name.as_str()).collect();
    assert_eq!(labels, vec!["cat", "car"]);
}

#[tokio::test]
async fn test_detector_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server);
    let client = build_backend_client(&config).expect("Failed to build client");
    let detector = RemoteDetector::from_config(client, &config).expect("Failed to build detector");

    let result = detector
        .detect(&Url::parse("https://example.com/a.png").unwrap())
        .await;
    assert!(matches!(result, Err(EnrichError::Detection(_))));
}

#[tokio::test]
async fn test_ocr_raster_url_is_passed_through() {
    let mock_server = MockServer::start().await;
    let logo_url = format!("{}/logo.png", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(logo_png(false), "image/png"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .and(body_string_contains("apikey=test-key"))
        .and(body_string_contains("url=http"))
        .respond_with(ocr_response("ACME Corp\r\n"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let text = ocr_client(&mock_server)
        .recognize(&logo_url, false)
        .await
        .expect("OCR failed");
    assert_eq!(text, "ACME Corp\r\n");
}

#[tokio::test]
async fn test_ocr_skips_icons() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/favicon.ico"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0, 0, 1, 0], "image/x-icon"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .respond_with(ocr_response("never"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let text = ocr_client(&mock_server)
        .recognize(&format!("{}/favicon.ico", mock_server.uri()), false)
        .await
        .expect("OCR failed");
    assert_eq!(text, "");
}

#[tokio::test]
async fn test_ocr_svg_url_is_rasterized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logo.svg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<svg><text>ACME</text></svg>", "image/svg+xml"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rasterize"))
        .and(body_string_contains("<text>ACME</text>"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(logo_png(false), "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .and(body_string_contains("base64Image=data%3Aimage%2Fpng%3Bbase64%2CiVBORw"))
        .respond_with(ocr_response("ACME"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let text = ocr_client(&mock_server)
        .recognize(&format!("{}/logo.svg", mock_server.uri()), false)
        .await
        .expect("OCR failed");
    assert_eq!(text, "ACME");
}

#[tokio::test]
async fn test_ocr_inline_vector_is_rasterized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rasterize"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(logo_png(false), "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .and(body_string_contains("base64Image="))
        .respond_with(ocr_response("Inline"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let text = ocr_client(&mock_server)
        .recognize("<svg><text>Inline</text></svg>", true)
        .await
        .expect("OCR failed");
    assert_eq!(text, "Inline");
}

#[tokio::test]
async fn test_ocr_processing_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ParsedResults": null,
            "IsErroredOnProcessing": true,
            "ErrorMessage": ["Unable to recognize the file type"]
        })))
        .mount(&mock_server)
        .await;

    let result = ocr_client(&mock_server)
        .recognize(&format!("{}/logo.png", mock_server.uri()), false)
        .await;
    assert!(matches!(result, Err(EnrichError::Ocr(_))));
}

#[tokio::test]
async fn test_ocr_forbidden_logo_still_sends_url() {
    let mock_server = MockServer::start().await;
    let logo_url = format!("{}/logo.png", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .and(body_string_contains("url=http"))
        .respond_with(ocr_response("ACME"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let text = ocr_client(&mock_server)
        .recognize(&logo_url, false)
        .await
        .expect("OCR failed");
    assert_eq!(text, "ACME");
}

#[tokio::test]
async fn test_ocr_png_without_text_by_url_is_uploaded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(logo_png(false), "image/png"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .and(body_string_contains("url=http"))
        .respond_with(ocr_response(""))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .and(body_string_contains("base64Image=data%3Aimage%2Fpng"))
        .respond_with(ocr_response("ACME"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let text = ocr_client(&mock_server)
        .recognize(&format!("{}/logo.png", mock_server.uri()), false)
        .await
        .expect("OCR failed");
    assert_eq!(text, "ACME");
}

#[tokio::test]
async fn test_ocr_transparent_logo_retries_on_black() {
    let mock_server = MockServer::start().await;
    mount_rasterizer(&mock_server, logo_png(true)).await;

    // First upload (white background) reads nothing
    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .and(body_string_contains("base64Image="))
        .respond_with(ocr_response("  "))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .and(body_string_contains("base64Image="))
        .respond_with(ocr_response("ACME"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let text = ocr_client(&mock_server)
        .recognize("<svg><text>ACME</text></svg>", true)
        .await
        .expect("OCR failed");
    assert_eq!(text, "ACME");
}

#[tokio::test]
async fn test_ocr_opaque_logo_is_not_retried() {
    let mock_server = MockServer::start().await;
    mount_rasterizer(&mock_server, logo_png(false)).await;

    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .respond_with(ocr_response(""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let text = ocr_client(&mock_server)
        .recognize("<svg/>", true)
        .await
        .expect("OCR failed");
    assert_eq!(text, "");
}

#[tokio::test]
async fn test_rasterizer_backends() {
    let mock_server = MockServer::start().await;

    mount_rasterizer(&mock_server, logo_png(false)).await;

    let remote = RemoteRasterizer::new(
        reqwest::Client::new(),
        Url::parse(&format!("{}/rasterize", mock_server.uri())).unwrap(),
    );
    assert_eq!(remote.rasterize("<svg/>").await.unwrap(), logo_png(false));

    let unsupported = UnsupportedRasterizer;
    assert!(matches!(
        unsupported.rasterize("<svg/>").await,
        Err(EnrichError::Rasterize(_))
    ));
}

fn sample_page(server: &MockServer) -> PageResult {
    PageResult::from_assets(
        format!("{}/", server.uri()),
        vec![
            AssetResult::Logo(LogoResult::raster(format!("{}/logo.png", server.uri()))),
            AssetResult::Image(ImageResult::new(format!("{}/cat.png", server.uri()))),
            AssetResult::Logo(LogoResult::vector("<svg><text>ACME</text></svg>")),
        ],
    )
    .expect("page has assets")
}

#[tokio::test]
async fn test_enricher_end_to_end() {
    let mock_server = MockServer::start().await;
    mount_detector(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
        .mount(&mock_server)
        .await;

    mount_rasterizer(&mock_server, logo_png(false)).await;

    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .respond_with(ocr_response("  ACME \n"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server);
    let backends = AiBackends::from_config(&config).expect("Failed to build backends");
    let enricher = Enricher::new(backends, &config);

    let mut pages = vec![sample_page(&mock_server)];
    enricher.enrich_all(&mut pages).await;

    let page = &pages[0];
    assert!(page
        .logos()
        .all(|logo| logo.recognized_text.as_deref() == Some("ACME")));

    let image = page.images().next().expect("one image");
    let classes: Vec<_> = image.classes.as_ref().expect("classes set").iter().cloned().collect();
    assert_eq!(classes, vec!["car".to_string(), "cat".to_string()]);
    assert_eq!(image.detections.as_ref().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_enricher_tolerates_slow_ocr() {
    let mock_server = MockServer::start().await;
    mount_detector(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
        .mount(&mock_server)
        .await;

    mount_rasterizer(&mock_server, logo_png(false)).await;

    Mock::given(method("POST"))
        .and(path("/parse/image"))
        .respond_with(ocr_response("late").set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let config = EnrichmentConfig {
        timeout_secs: 1,
        ..create_test_config(&mock_server)
    };
    let backends = AiBackends::from_config(&config).expect("Failed to build backends");
    let enricher = Enricher::new(backends, &config);

    let mut page = sample_page(&mock_server);
    let started = std::time::Instant::now();
    enricher.enrich(&mut page).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(page.logos().all(|logo| logo.recognized_text.is_none()));
    assert!(page.images().all(|image| image.detections.is_some()));
}

#[tokio::test]
async fn test_backends_require_detector_endpoint() {
    let config = EnrichmentConfig::default();
    assert!(matches!(
        AiBackends::from_config(&config),
        Err(EnrichError::Detection(_))
    ));
}

#[tokio::test]
async fn test_recognizer_trait_object() {
    let mock_server = MockServer::start().await;
    let recognizer: Arc<dyn TextRecognizer> = Arc::new(ocr_client(&mock_server));

    // No rasterizer mock is mounted, so the vector path fails cleanly
    let result = recognizer.recognize("<svg/>", true).await;
    assert!(result.is_err());
}
