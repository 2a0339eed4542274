use storefront_api::{response::ResponseStatus, routes::health::health_check};

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");
    assert_eq!(response.0.status, ResponseStatus::Success);
    assert!(response.0.meta.is_none());

    let body = serde_json::to_value(&response.0).expect("serializable");
    assert_eq!(body["data"]["status"], "ok");
}
