mod helpers;

use anuvad_storage::Storage;
use helpers::setup_test_app;
use uuid::Uuid;

#[tokio::test]
async fn test_health() {
    let app = setup_test_app().await;
    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_read_url_for_existing_html() {
    let app = setup_test_app().await;
    let project_id = Uuid::new_v4();

    app.storage
        .upload_with_key(
            &format!("projects/{}/judgment-42.html", project_id),
            b"<p>anuvad</p>".to_vec(),
            "text/html",
        )
        .await
        .unwrap();

    let response = app
        .client()
        .post("/api/v0/documents/read-url")
        .json(&serde_json::json!({
            "project_id": project_id,
            "file_name": "judgment-42",
            "file_type": "html"
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    let signed_url = body["signed_url"].as_str().unwrap();
    let path = body["path"].as_str().unwrap();
    assert_eq!(path, format!("projects/{}/judgment-42.html", project_id));
    assert!(signed_url.ends_with(path));
}

#[tokio::test]
async fn test_read_url_missing_file_is_404() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/v0/documents/read-url")
        .json(&serde_json::json!({
            "project_id": Uuid::new_v4(),
            "file_name": "missing",
            "file_type": "pdf"
        }))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_read_url_unsupported_type_is_400() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/v0/documents/read-url")
        .json(&serde_json::json!({
            "project_id": Uuid::new_v4(),
            "file_name": "judgment-42",
            "file_type": "txt"
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_upload_url_unsupported_on_local_backend() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/v0/documents/upload-url")
        .json(&serde_json::json!({
            "project_id": Uuid::new_v4(),
            "file_name": "fresh.pdf"
        }))
        .await;

    // Local storage cannot issue signed PUT URLs
    assert_eq!(response.status_code(), 500);
}

#[tokio::test]
async fn test_delete_file_roundtrip() {
    let app = setup_test_app().await;
    let project_id = Uuid::new_v4();
    let key = format!("projects/{}/old.pdf", project_id);

    app.storage
        .upload_with_key(&key, b"pdf bytes".to_vec(), "application/pdf")
        .await
        .unwrap();

    let response = app
        .client()
        .delete("/api/v0/documents")
        .json(&serde_json::json!({
            "project_id": project_id,
            "file_name": "old.pdf"
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    assert!(!app.storage.exists(&key).await.unwrap());

    // Deleting again reports the missing blob
    let response = app
        .client()
        .delete("/api/v0/documents")
        .json(&serde_json::json!({
            "project_id": project_id,
            "file_name": "old.pdf"
        }))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_download_selected_rejects_empty_selection() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/v0/documents/download-selected")
        .json(&serde_json::json!({
            "project_id": Uuid::new_v4(),
            "document_ids": []
        }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_invalid_file_name_rejected() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/v0/documents/read-url")
        .json(&serde_json::json!({
            "project_id": Uuid::new_v4(),
            "file_name": "../escape",
            "file_type": "pdf"
        }))
        .await;

    assert_eq!(response.status_code(), 400);
}
