mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use storefront_api::{dto::auth::Claims, middleware::auth::AuthUser, routes::create_app};
use tower::ServiceExt;

fn token_for(user: &AuthUser, secret: &str) -> String {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize;
    let claims = Claims {
        sub: user.user_id.to_string(),
        role: user.role.clone(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token")
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn cart_requires_a_valid_token() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let app = create_app(state);

    let (status, body) = send(&app, "GET", "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");

    let forged = token_for(&common::customer(), "some-other-secret");
    let (status, _) = send(&app, "GET", "/api/cart", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn checkout_over_http() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let product = common::create_product(&state, "Hoodie", 250, &["M", "L"], &["Black"]).await?;
    let app = create_app(state);
    let user = common::customer();
    let token = token_for(&user, common::JWT_SECRET);

    let (status, body) = send(
        &app,
        "POST",
        "/api/cart/add",
        Some(&token),
        Some(json!({
            "product_id": product.id,
            "quantity": 2,
            "selected_size": "L",
            "selected_color": "Black"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["total_price"], 500);
    assert!(body.get("pagination").is_none());

    let (status, body) = send(
        &app,
        "POST",
        "/api/cart/add",
        Some(&token),
        Some(json!({ "product_id": product.id, "quantity": 1, "selected_size": "XS" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["data"]["error"].as_str().is_some());

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&token),
        Some(json!({
            "order_items": [{
                "product_id": product.id,
                "name": "Hoodie",
                "price": 250,
                "quantity": 2,
                "selected_size": "L",
                "selected_color": "Black"
            }],
            "payment_method": "card",
            "total_amount": 500,
            "discount_amount": 0,
            "final_amount": 500,
            "address_id": uuid::Uuid::new_v4(),
            "username": "ignored"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["order"]["status"], "PENDING");
    let order_id = body["data"]["order"]["id"].as_str().expect("id").to_string();

    let (status, body) = send(&app, "GET", &format!("/api/orders/{order_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["price"], 250);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/orders/{order_id}/status"),
        Some(&token),
        Some(json!({ "status": "SHIPPED" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = token_for(&common::admin(), common::JWT_SECRET);
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/orders/{order_id}/status"),
        Some(&admin_token),
        Some(json!({ "status": "SHIPPED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "SHIPPED");

    let (status, body) = send(&app, "GET", "/api/orders?per_page=5", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total_items"], 1);
    assert_eq!(body["pagination"]["page"], 1);
    Ok(())
}

#[tokio::test]
async fn catalog_is_public_and_creation_is_admin_only() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let app = create_app(state);

    let payload = json!({ "name": "Scarf", "price": 90, "stock": 5, "colors": ["Grey"] });
    let customer_token = token_for(&common::customer(), common::JWT_SECRET);
    let (status, _) = send(&app, "POST", "/api/products", Some(&customer_token), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = token_for(&common::admin(), common::JWT_SECRET);
    let (status, body) = send(&app, "POST", "/api/products", Some(&admin_token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, body) = send(&app, "GET", "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "Scarf");
    assert_eq!(body["pagination"]["total_items"], 1);

    let (status, body) = send(&app, "GET", &format!("/api/products/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["colors"], json!(["Grey"]));
    Ok(())
}

#[tokio::test]
async fn unknown_routes_get_a_json_404() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let app = create_app(state);

    let (status, body) = send(&app, "GET", "/api/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}
