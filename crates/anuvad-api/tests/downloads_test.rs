mod helpers;

use helpers::setup_test_app;
use uuid::Uuid;

#[tokio::test]
async fn test_download_unsupported_format_is_400() {
    let app = setup_test_app().await;
    let project_id = Uuid::new_v4();
    let document_id = Uuid::new_v4();

    let response = app
        .client()
        .get(&format!(
            "/api/v0/projects/{}/documents/{}/download/txt",
            project_id, document_id
        ))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UNSUPPORTED_FORMAT");
}

#[tokio::test]
async fn test_download_format_is_case_insensitive_in_parsing() {
    let app = setup_test_app().await;

    // "DOCX" parses as a valid format; the request then proceeds into the
    // pipeline and fails on the (unreachable) test database rather than on
    // format validation.
    let response = app
        .client()
        .get(&format!(
            "/api/v0/projects/{}/documents/{}/download/DOCX",
            Uuid::new_v4(),
            Uuid::new_v4()
        ))
        .await;

    assert_ne!(response.status_code(), 400);
}
