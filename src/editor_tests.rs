use super::*;
use crate::models::Notification;
use crate::test_support::{record, MockApi};
use serde_json::json;
use tempfile::TempDir;

fn form() -> NewsForm {
    NewsForm {
        title_arabic: "افتتاح المطار".to_string(),
        title_english: "Airport opening".to_string(),
        description_arabic: "<p>افتتاح مبنى الركاب الجديد</p>".to_string(),
        description_english: "<p>The new terminal opens</p>".to_string(),
        category: "Travel".to_string(),
        date: "2024-02-20".to_string(),
        image: "https://cdn.test/old.png".to_string(),
    }
}

fn png() -> ImageFile {
    ImageFile {
        filename: "cover.png".to_string(),
        mime_type: "image/png".to_string(),
        bytes: vec![0x89, b'P', b'N', b'G'],
    }
}

#[tokio::test]
async fn test_create_uploads_image_first() {
    let api = MockApi::default();
    api.reply("UPLOAD", IMAGE_UPLOAD_PATH, Ok(json!({ "imageUrl": "https://cdn.test/new.png" })));
    api.reply("POST", "/api/news", Ok(record(12, "Airport opening")));
    let controller = NewsController::new(api);

    let response = create_news(&controller, form(), Some(png())).await.unwrap();
    assert_eq!(response["id"], 12);

    let api = controller.client();
    assert_eq!(
        api.calls(),
        vec!["UPLOAD /api/images/upload".to_string(), "POST /api/news".to_string()]
    );
    assert_eq!(api.uploads.lock().unwrap()[0].filename, "cover.png");
    let body = api.bodies.lock().unwrap()[0].clone();
    assert_eq!(body["image"], "https://cdn.test/new.png");
    assert_eq!(body["category"], "travel");
}

#[tokio::test]
async fn test_update_keeps_existing_image_without_upload() {
    let api = MockApi::default();
    api.reply("PUT", "/api/news/12", Ok(record(12, "Airport opening")));
    let controller = NewsController::new(api);

    update_news(&controller, &NewsId::Number(12), form(), None).await.unwrap();

    let body = controller.client().bodies.lock().unwrap()[0].clone();
    assert_eq!(body["image"], "https://cdn.test/old.png");
    assert_eq!(
        controller.drain_notifications(),
        vec![Notification::success("News updated successfully.")]
    );
}

#[tokio::test]
async fn test_bare_string_upload_response() {
    let api = MockApi::default();
    api.reply("UPLOAD", IMAGE_UPLOAD_PATH, Ok(json!("https://cdn.test/bare.png")));

    let url = upload_image(&api, png()).await.unwrap();
    assert_eq!(url, "https://cdn.test/bare.png");
}

#[tokio::test]
async fn test_invalid_form_sends_nothing() {
    let controller = NewsController::new(MockApi::default());
    let invalid = NewsForm { category: String::new(), ..form() };

    let err = create_news(&controller, invalid, Some(png())).await.unwrap_err();

    assert!(matches!(err, EditorError::Invalid(_)));
    assert!(controller.client().calls().is_empty());
}

#[tokio::test]
async fn test_failed_upload_stops_before_save() {
    let api = MockApi::default();
    api.reply("UPLOAD", IMAGE_UPLOAD_PATH, Err(ApiError::Status { status: 413, message: None }));
    let controller = NewsController::new(api);

    let err = create_news(&controller, form(), Some(png())).await.unwrap_err();

    assert!(matches!(err, EditorError::Upload(ApiError::Status { status: 413, .. })));
    assert_eq!(controller.client().calls(), vec!["UPLOAD /api/images/upload".to_string()]);
}

#[tokio::test]
async fn test_failed_save_propagates() {
    let api = MockApi::default();
    api.reply(
        "POST",
        "/api/news",
        Err(ApiError::Status { status: 400, message: Some("Duplicate title".to_string()) }),
    );
    let controller = NewsController::new(api);

    let err = create_news(&controller, form(), None).await.unwrap_err();

    assert!(matches!(err, EditorError::Save(_)));
    assert_eq!(controller.drain_notifications(), vec![Notification::error("Duplicate title")]);
}

#[tokio::test]
async fn test_image_from_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Photo.JPG");
    std::fs::write(&path, b"jpeg-bytes").unwrap();

    let image = ImageFile::from_path(path.to_str().unwrap()).await.unwrap();
    assert_eq!(image.filename, "Photo.JPG");
    assert_eq!(image.mime_type, "image/jpeg");
    assert_eq!(image.bytes, b"jpeg-bytes");

    let text = dir.path().join("notes.txt");
    std::fs::write(&text, b"hello").unwrap();
    assert!(matches!(
        ImageFile::from_path(text.to_str().unwrap()).await,
        Err(EditorError::Image { .. })
    ));
}
