use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use whir_accounts::AccountService;
use whir_auth::{AuthConfig, MockIdTokenVerifier, SigningSecret, TokenAuthority};
use whir_core::AccountKind;
use whir_gateway::{create_router, GatewayConfig, GatewayState};
use whir_store::MemoryCollection;

struct TestApp {
    router: Router,
    users: Arc<MemoryCollection>,
}

fn app_with(federation: bool) -> TestApp {
    let secret = SigningSecret::new("gateway-test-secret").unwrap();
    let authority = TokenAuthority::new(&AuthConfig::new(secret));
    let users = Arc::new(MemoryCollection::new(AccountKind::EndUser));
    let businesses = Arc::new(MemoryCollection::new(AccountKind::Business));

    let config = GatewayConfig {
        redirect_url: "http://localhost:3000/home".to_string(),
        ..GatewayConfig::default()
    };

    let mut state = GatewayState::new(
        AccountService::new(Arc::clone(&users), authority.clone()),
        AccountService::new(businesses, authority),
        config,
    );
    if federation {
        state = state.with_federation(Arc::new(MockIdTokenVerifier));
    }

    TestApp {
        router: create_router(state),
        users,
    }
}

fn app() -> TestApp {
    app_with(false)
}

async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

fn ada() -> Value {
    json!({
        "email": "ada@example.com",
        "password": "analytical",
        "first_name": "Ada",
        "last_name": "Lovelace"
    })
}

struct Tokens {
    access: String,
    refresh: String,
}

fn header_tokens(response: &Response<Body>) -> Tokens {
    Tokens {
        access: response.headers()["x-auth-token"].to_str().unwrap().to_string(),
        refresh: response.headers()["x-refresh-token"].to_str().unwrap().to_string(),
    }
}

async fn signed_up(app: &TestApp) -> Tokens {
    let response = send(app, post_json("/users/signup", &ada())).await;
    assert_eq!(response.status(), StatusCode::OK);
    header_tokens(&response)
}

fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

async fn assert_error(response: Response<Body>, status: StatusCode, name: &str) {
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["status"], status.as_u16());
    assert_eq!(body["name"], name);
}

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let response = send(&app, get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["account_kinds"], json!(["user", "business"]));
    assert_eq!(body["google_sign_in"], false);
}

#[tokio::test]
async fn health_survives_store_outage() {
    let app = app_with(true);
    app.users.fail_reads(true);

    let response = send(&app, get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["google_sign_in"], true);
}

#[tokio::test]
async fn sign_up_delivers_tokens_in_headers() {
    let app = app();
    let response = send(&app, post_json("/users/signup", &ada())).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    let tokens = header_tokens(&response);
    assert!(!tokens.access.is_empty());
    assert_ne!(tokens.access, tokens.refresh);

    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert_eq!(body["data"]["kind"], "end_user");
    assert!(body["data"].get("password_hash").is_none());
    assert_eq!(app.users.len(), 1);
}

#[tokio::test]
async fn cookie_consent_delivers_cookies() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/users/signup")
        .header(CONTENT_TYPE, "application/json")
        .header("Cookie-Consent", "true")
        .body(Body::from(ada().to_string()))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-auth-token").is_none());

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("access_token=") && c.contains("Max-Age=3600")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("refresh_token=") && c.contains("Max-Age=86400")));
    assert!(cookies.iter().all(|c| c.contains("HttpOnly")));
}

#[tokio::test]
async fn gate_prefers_cookie_over_header() {
    let app = app();
    let tokens = signed_up(&app).await;

    let request = get("/users")
        .header(COOKIE, format!("access_token={}", tokens.access))
        .header(AUTHORIZATION, "not-a-token")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["first_name"], "Ada");
}

#[tokio::test]
async fn gate_accepts_raw_authorization_header() {
    let app = app();
    let tokens = signed_up(&app).await;

    let request = get("/users")
        .header(AUTHORIZATION, tokens.access.as_str())
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn gate_rejects_generically() {
    let app = app();
    let tokens = signed_up(&app).await;

    let missing = get("/users").body(Body::empty()).unwrap();
    assert_error(
        send(&app, missing).await,
        StatusCode::UNAUTHORIZED,
        "Failed to authenticate user",
    )
    .await;

    let refresh_as_access = get("/users")
        .header(AUTHORIZATION, tokens.refresh.as_str())
        .body(Body::empty())
        .unwrap();
    assert_error(
        send(&app, refresh_as_access).await,
        StatusCode::UNAUTHORIZED,
        "Failed to authenticate user",
    )
    .await;

    app.users.fail_reads(true);
    let outage = get("/users")
        .header(AUTHORIZATION, tokens.access.as_str())
        .body(Body::empty())
        .unwrap();
    assert_error(
        send(&app, outage).await,
        StatusCode::UNAUTHORIZED,
        "Failed to authenticate user",
    )
    .await;
}

#[tokio::test]
async fn user_token_does_not_open_business_routes() {
    let app = app();
    let tokens = signed_up(&app).await;

    let request = get("/business/me")
        .header(AUTHORIZATION, tokens.access.as_str())
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn business_sign_up_and_profile() {
    let app = app();
    let body = json!({
        "email": "shop@example.com",
        "password": "espresso",
        "first_name": "Sam",
        "business_name": "Corner Cafe",
        "address": {
            "street": "1 Main St", "city": "Springfield", "state": "IL",
            "postalCode": "62701", "country": "US"
        },
        "latitude": 39.78,
        "longitude": -89.65
    });
    let response = send(&app, post_json("/business/signup", &body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let tokens = header_tokens(&response);

    let request = get("/business/me")
        .header(AUTHORIZATION, tokens.access.as_str())
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["kind"], "business");
    assert_eq!(body["data"]["business"]["business_name"], "Corner Cafe");
    assert!(app.users.is_empty());
}

#[tokio::test]
async fn refresh_rotates_pair() {
    let app = app();
    let tokens = signed_up(&app).await;

    let request = get("/token")
        .header("refresh_token", tokens.refresh.as_str())
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let renewed = header_tokens(&response);

    let request = get("/users")
        .header(AUTHORIZATION, renewed.access.as_str())
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_rejects_access_token_and_missing_header() {
    let app = app();
    let tokens = signed_up(&app).await;

    let request = get("/token")
        .header("refresh_token", tokens.access.as_str())
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::UNAUTHORIZED);

    let request = get("/token").body(Body::empty()).unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_reports_store_outage() {
    let app = app();
    let tokens = signed_up(&app).await;
    app.users.fail_reads(true);

    let request = get("/token")
        .header("refresh_token", tokens.refresh.as_str())
        .body(Body::empty())
        .unwrap();
    assert_error(
        send(&app, request).await,
        StatusCode::BAD_GATEWAY,
        "There was an error connecting with the server",
    )
    .await;
}

#[tokio::test]
async fn malformed_and_invalid_bodies() {
    let app = app();

    let request = Request::builder()
        .method("POST")
        .uri("/users/signup")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    assert_error(
        send(&app, request).await,
        StatusCode::UNPROCESSABLE_ENTITY,
        "There was an error with the client request",
    )
    .await;

    let short_password = json!({
        "email": "ada@example.com",
        "password": "123",
        "first_name": "Ada"
    });
    assert_error(
        send(&app, post_json("/users/signup", &short_password)).await,
        StatusCode::BAD_REQUEST,
        "There was an error with user validation",
    )
    .await;
}

#[tokio::test]
async fn duplicate_sign_up_is_generic() {
    let app = app();
    signed_up(&app).await;

    let mut again = ada();
    again["email"] = json!("ADA@example.com");
    assert_error(
        send(&app, post_json("/users/signup", &again)).await,
        StatusCode::UNAUTHORIZED,
        "There was an error registering this account",
    )
    .await;
}

#[tokio::test]
async fn login_flow() {
    let app = app();
    signed_up(&app).await;

    let wrong = json!({"email": "ada@example.com", "password": "difference"});
    assert_error(
        send(&app, post_json("/users/login", &wrong)).await,
        StatusCode::UNAUTHORIZED,
        "The username or password is incorrect",
    )
    .await;

    let unknown = json!({"email": "nobody@example.com", "password": "analytical"});
    assert_error(
        send(&app, post_json("/users/login", &unknown)).await,
        StatusCode::UNAUTHORIZED,
        "The username or password is incorrect",
    )
    .await;

    let right = json!({"email": "ada@example.com", "password": "analytical"});
    let response = send(&app, post_json("/users/login", &right)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let tokens = header_tokens(&response);
    assert!(!tokens.access.is_empty());
}

#[tokio::test]
async fn google_sign_in_sets_cookies_and_redirects() {
    let app = app_with(true);
    let request = Request::builder()
        .method("POST")
        .uri("/auth/google")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("credential=test-id-token%3Agrace%40example.com%3AGrace"))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "http://localhost:3000/home");
    assert_eq!(set_cookies(&response).len(), 2);
    assert_eq!(app.users.len(), 1);
}

#[tokio::test]
async fn google_sign_in_rejects_bad_credential() {
    let app = app_with(true);
    let request = Request::builder()
        .method("POST")
        .uri("/auth/google")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("credential=forged"))
        .unwrap();
    assert_error(
        send(&app, request).await,
        StatusCode::UNAUTHORIZED,
        "There was an error logging in",
    )
    .await;
    assert!(app.users.is_empty());
}
