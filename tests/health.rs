use foodbee::routes::health::health_check;

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
}

#[test]
fn api_doc_lists_basket_and_order_routes() {
    use utoipa::OpenApi;

    let doc = foodbee::routes::doc::ApiDoc::openapi();
    for path in [
        "/api/basket",
        "/api/basket/update",
        "/api/orders",
        "/api/orders/{id}/status",
        "/api/shops/cvr/{cvr}",
    ] {
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }
}
