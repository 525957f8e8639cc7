use crate::helpers::{FailingStore, TestApp};

#[tokio::test]
async fn health_check_works() {
    let test_app = TestApp::spawn_app().await;

    for path in ["/health", "/api/health"] {
        let response = test_app.get(path).await;

        assert!(response.status().is_success(), "{} did not answer 200", path);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "OK");
        assert_eq!(body["database"], "connected");
        assert_eq!(body["databaseUrlConfigured"], true);
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn health_check_reports_disconnected_storage() {
    let test_app = TestApp::spawn_app().await;
    test_app.store.set_offline(true);

    let response = test_app.get("/health").await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["databaseUrlConfigured"], true);
}

#[tokio::test]
async fn health_check_reports_missing_database_configuration() {
    let test_app = TestApp::spawn_demo_app().await;

    let body: serde_json::Value = test_app.get("/api/health").await.json().await.unwrap();

    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["databaseUrlConfigured"], false);
}

#[tokio::test]
async fn health_check_reports_unusable_storage_as_disconnected() {
    let test_app = TestApp::spawn_app_with_store(FailingStore::unusable()).await;

    let body: serde_json::Value = test_app.get("/health").await.json().await.unwrap();

    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["databaseUrlConfigured"], true);
}
