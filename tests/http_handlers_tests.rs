use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use crud_admin::{app, config::AppConfig, test_utils::test_helpers, AppState};
use tower::ServiceExt;

async fn setup() -> (Router, AppState) {
    let state = test_helpers::create_test_state().await.unwrap();
    let router = app::build_app(state.clone(), &test_helpers::test_config())
        .await
        .unwrap();
    (router, state)
}

async fn setup_with(config: AppConfig) -> (Router, AppState) {
    let pool = test_helpers::create_test_db().await.unwrap();
    let state = AppState::new(pool, &config);
    let router = app::build_app(state.clone(), &config).await.unwrap();
    (router, state)
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn get(router: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    router
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn send_form(
    router: &Router,
    method: &str,
    uri: &str,
    body: &str,
    cookie: Option<&str>,
) -> Response {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    router
        .clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

fn extract_csrf_token(html: &str) -> String {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker).expect("page to carry a csrf token") + marker.len();
    let end = html[start..].find('"').unwrap();
    html[start..start + end].to_string()
}

/// Opens a session on `page` and returns its cookie and the form token.
async fn open_form(router: &Router, page: &str) -> (String, String) {
    let response = get(router, page, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie to be issued")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let token = extract_csrf_token(&body_text(response).await);
    (cookie, token)
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

async fn json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

// HTML pages

#[tokio::test]
async fn test_home_shows_counts() {
    let (router, state) = setup().await;
    test_helpers::insert_test_user(&state.pool, "Ana", "ana@x.com", "admin")
        .await
        .unwrap();

    let response = get(&router, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Frame-Options").unwrap(),
        "DENY"
    );

    let html = body_text(response).await;
    assert!(html.contains(r#"<span class="card-count">1</span>"#));
    assert!(html.contains(r#"<span class="card-count">0</span>"#));
}

#[tokio::test]
async fn test_strict_transport_follows_configured_environment() {
    let (router, state) = setup().await;
    assert!(!state.production);
    let response = get(&router, "/", None).await;
    assert!(response.headers().get("Strict-Transport-Security").is_none());

    let (router, state) = setup_with(AppConfig {
        environment: "production".to_string(),
        ..test_helpers::test_config()
    })
    .await;
    assert!(state.production);
    let response = get(&router, "/", None).await;
    assert_eq!(
        response.headers().get("Strict-Transport-Security").unwrap(),
        "max-age=31536000; includeSubDomains"
    );
    let cookie = response.headers().get(header::SET_COOKIE).unwrap();
    assert!(cookie.to_str().unwrap().starts_with("__Host-session="));
}

#[tokio::test]
async fn test_layout_offers_theme_choice() {
    let (router, _state) = setup().await;

    let html = body_text(get(&router, "/", None).await).await;
    assert!(html.contains(r#"<script src="/static/theme-toggle.js" defer></script>"#));
    for choice in ["light", "dark", "system"] {
        assert!(html.contains(&format!(r#"<option value="{}""#, choice)), "{}", choice);
    }

    let response = get(&router, "/static/theme-toggle.js", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let script = body_text(response).await;
    assert!(script.contains("localStorage"));
    assert!(script.contains("prefers-color-scheme"));
}

#[tokio::test]
async fn test_empty_listings_render_defined_state() {
    let (router, _state) = setup().await;

    let users = body_text(get(&router, "/users", None).await).await;
    assert!(users.contains("No users registered yet"));

    let products = body_text(get(&router, "/products", None).await).await;
    assert!(products.contains("No products in the catalog yet"));
}

#[tokio::test]
async fn test_create_user_redirects_and_lists_it() {
    let (router, _state) = setup().await;

    // Empty listing is rendered and cached first
    let before = body_text(get(&router, "/users", None).await).await;
    assert!(before.contains("No users registered yet"));

    let (cookie, token) = open_form(&router, "/users/new").await;
    let body = format!(
        "name=Ana&email=ana%40x.com&role=admin&csrf_token={}",
        token
    );
    let response = send_form(&router, "POST", "/users", &body, Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/users");

    let after = body_text(get(&router, "/users", Some(&cookie)).await).await;
    assert!(after.contains("Ana"));
    assert!(after.contains("ana@x.com"));
    assert!(!after.contains("No users registered yet"));
}

#[tokio::test]
async fn test_invalid_user_form_is_rerendered_with_errors() {
    let (router, state) = setup().await;

    let (cookie, token) = open_form(&router, "/users/new").await;
    let body = format!("name=A&email=nope&role=user&csrf_token={}", token);
    let response = send_form(&router, "POST", "/users", &body, Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("Name must be at least 2 characters"));
    assert!(html.contains("Invalid email address"));
    // Submitted values survive the round trip
    assert!(html.contains(r#"value="nope""#));

    assert_eq!(state.user_service.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_email_shows_form_message() {
    let (router, state) = setup().await;
    test_helpers::insert_test_user(&state.pool, "Ana", "ana@x.com", "user")
        .await
        .unwrap();

    let (cookie, token) = open_form(&router, "/users/new").await;
    let body = format!("name=Other&email=ana%40x.com&csrf_token={}", token);
    let response = send_form(&router, "POST", "/users", &body, Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let html = body_text(response).await;
    assert!(html.contains("A user with this email already exists."));
}

#[tokio::test]
async fn test_form_post_without_valid_token_is_forbidden() {
    let (router, state) = setup().await;

    let (cookie, _token) = open_form(&router, "/users/new").await;
    let body = "name=Ana&email=ana%40x.com&csrf_token=forged";
    let response = send_form(&router, "POST", "/users", body, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // No session at all
    let response = send_form(&router, "POST", "/users", body, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert_eq!(state.user_service.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_token_in_header_does_not_replace_form_field() {
    let (router, state) = setup().await;

    let (cookie, token) = open_form(&router, "/users/new").await;
    let request = Request::builder()
        .method("POST")
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, &cookie)
        .header("X-CSRF-Token", &token)
        .body(Body::from("name=Ana&email=ana%40x.com"))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(state.user_service.count_users().await.unwrap(), 0);

    // The same token in the form body is accepted
    let body = format!("name=Ana&email=ana%40x.com&csrf_token={}", token);
    let response = send_form(&router, "POST", "/users", &body, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(state.user_service.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_edit_and_update_user() {
    let (router, state) = setup().await;
    let id = test_helpers::insert_test_user(&state.pool, "Ana", "ana@x.com", "user")
        .await
        .unwrap();

    let (cookie, token) = open_form(&router, &format!("/users/{}/edit", id)).await;
    let body = format!(
        "name=Ana+Maria&email=ana%40x.com&role=editor&csrf_token={}",
        token
    );
    let response = send_form(
        &router,
        "POST",
        &format!("/users/{}", id),
        &body,
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let user = state.user_service.get_user(id).await.unwrap();
    assert_eq!(user.name, "Ana Maria");
    assert_eq!(user.role.as_str(), "editor");
}

#[tokio::test]
async fn test_missing_records_render_not_found() {
    let (router, _state) = setup().await;

    for uri in ["/users/999/edit", "/products/999/edit", "/users/abc/edit", "/nowhere"] {
        let response = get(&router, uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        assert!(body_text(response).await.contains("Not found"));
    }

    let (cookie, token) = open_form(&router, "/users/new").await;
    let body = format!("name=Ghost&email=ghost%40x.com&csrf_token={}", token);
    let response = send_form(&router, "POST", "/users/999", &body, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_user_and_missing_user() {
    let (router, state) = setup().await;
    let id = test_helpers::insert_test_user(&state.pool, "Ana", "ana@x.com", "user")
        .await
        .unwrap();

    let (cookie, token) = open_form(&router, "/users").await;
    let response = send_form(
        &router,
        "POST",
        &format!("/users/{}/delete", id),
        &format!("csrf_token={}", token),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/users?notice=User%20deleted");
    assert_eq!(state.user_service.count_users().await.unwrap(), 0);

    // The token rotates after every accepted form
    let page = body_text(get(&router, "/users", Some(&cookie)).await).await;
    let token = extract_csrf_token(&page);

    let response = send_form(
        &router,
        "POST",
        "/users/999/delete",
        &format!("csrf_token={}", token),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/users?error=User%20not%20found");

    let page = body_text(get(&router, location(&response), Some(&cookie)).await).await;
    assert!(page.contains("User not found"));
}

#[tokio::test]
async fn test_create_product_through_form() {
    let (router, state) = setup().await;

    let (cookie, token) = open_form(&router, "/products/new").await;
    let body = format!(
        "name=Desk+lamp&description=&price=12.5&stock=30&image_url=&csrf_token={}",
        token
    );
    let response = send_form(&router, "POST", "/products", &body, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/products");

    let html = body_text(get(&router, "/products", Some(&cookie)).await).await;
    assert!(html.contains("Desk lamp"));
    assert!(html.contains("12.50"));
    assert!(html.contains("stock-plenty"));

    let products = state.product_service.list_products().await.unwrap();
    assert_eq!(products[0].description, None);
    assert_eq!(products[0].image_url, None);
}

#[tokio::test]
async fn test_invalid_product_price_is_rejected() {
    let (router, state) = setup().await;

    let (cookie, token) = open_form(&router, "/products/new").await;
    let body = format!("name=Lamp&price=0&stock=-2&csrf_token={}", token);
    let response = send_form(&router, "POST", "/products", &body, Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("Price must be greater than 0"));
    assert!(html.contains("Stock cannot be negative"));
    assert_eq!(state.product_service.count_products().await.unwrap(), 0);
}

// Listing cache

#[tokio::test]
async fn test_listing_served_from_cache_until_a_write() {
    let (router, state) = setup().await;

    let first = body_text(get(&router, "/products", None).await).await;
    assert!(first.contains("No products in the catalog yet"));

    // Written behind the services' back: the cached fragment still wins
    test_helpers::insert_test_product(&state.pool, "Hidden", "3.00", 1)
        .await
        .unwrap();
    let cached = body_text(get(&router, "/products", None).await).await;
    assert!(!cached.contains("Hidden"));

    // Any write through the actions marks the listing stale
    let (cookie, token) = open_form(&router, "/products/new").await;
    let body = format!("name=Visible&price=4&stock=2&csrf_token={}", token);
    let response = send_form(&router, "POST", "/products", &body, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let fresh = body_text(get(&router, "/products", None).await).await;
    assert!(fresh.contains("Hidden"));
    assert!(fresh.contains("Visible"));
}

// JSON API

#[tokio::test]
async fn test_api_user_lifecycle() {
    let (router, _state) = setup().await;

    let response = send_form(
        &router,
        "POST",
        "/api/users",
        "name=Ana&email=ana%40x.com&role=admin",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json(response).await;
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["role"], "admin");
    let id = created["data"]["id"].as_i64().unwrap();

    let response = get(&router, &format!("/api/users/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["email"], "ana@x.com");

    let response = send_form(
        &router,
        "PUT",
        &format!("/api/users/{}", id),
        "name=Ana+B&email=ana.b%40x.com",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json(response).await;
    assert_eq!(updated["data"]["name"], "Ana B");
    assert_eq!(updated["data"]["role"], "user");

    let list = json(get(&router, "/api/users", None).await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let response = send_form(
        &router,
        "DELETE",
        &format!("/api/users/{}", id),
        "",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await, serde_json::json!({ "success": true }));
}

#[tokio::test]
async fn test_api_error_bodies() {
    let (router, _state) = setup().await;

    let response = send_form(&router, "POST", "/api/users", "name=A&email=bad", None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json(response).await;
    assert_eq!(body["error"]["email"][0], "Invalid email address");
    assert_eq!(body["error"]["name"][0], "Name must be at least 2 characters");

    send_form(&router, "POST", "/api/users", "name=Ana&email=ana%40x.com", None).await;
    let response = send_form(&router, "POST", "/api/users", "name=Ana&email=ana%40x.com", None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        json(response).await["error"]["_form"],
        "A user with this email already exists."
    );

    let response = send_form(&router, "DELETE", "/api/products/999", "", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(response).await["error"]["_form"], "Record not found");

    let response = get(&router, "/api/products/abc", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_product_price_is_rounded() {
    let (router, _state) = setup().await;

    let response = send_form(
        &router,
        "POST",
        "/api/products",
        "name=Scarf&price=19.999&stock=4",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json(response).await;
    assert_eq!(body["data"]["price"], "20.00");
    assert_eq!(body["data"]["stock"], 4);
}
