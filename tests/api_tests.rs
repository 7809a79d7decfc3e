use chrono::Duration;
use reqwest::{Client, StatusCode, header, redirect::Policy};
use serde_json::{Value, json};
use std::sync::Arc;
use tansiqy::{
    AppConfig, AppState, MemoryRepository, Repositories,
    auth::{SESSION_COOKIE, issue_token},
    create_router,
    csrf::{CSRF_COOKIE, CSRF_FIELD, sign_token, stamp_forms, verify_token},
    models::{NewsRequest, User, UserRequest, UserRole},
    pages::is_local_url,
    repository::CrudRepository,
};
use tokio::net::TcpListener;

// --- Test Server ---

struct TestApp {
    address: String,
    state: AppState,
    client: Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Creates an account directly through the service layer and returns a
    /// bearer token for it.
    async fn token_for(&self, email: &str, role: UserRole) -> String {
        let user = self.create_user(email, role).await;
        issue_token(&self.state.config, &user, Duration::minutes(10))
            .unwrap()
            .0
    }

    async fn create_user(&self, email: &str, role: UserRole) -> User {
        let view = self
            .state
            .users
            .create(&UserRequest {
                email: email.to_string(),
                full_name: None,
                password: Some("test-password".to_string()),
                role,
                is_active: true,
            })
            .await
            .expect("create user");
        self.state
            .repos
            .users
            .get_by_id(view.id)
            .await
            .unwrap()
            .expect("stored user")
    }

    /// Loads the login page like a browser and returns the anti-forgery
    /// cookie pair together with the token stamped into its form.
    async fn form_credentials(&self) -> (String, String) {
        let response = self.client.get(self.url("/account/login")).send().await.unwrap();
        let cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(&format!("{CSRF_COOKIE}=")))
            .and_then(|value| value.split(';').next())
            .expect("anti-forgery cookie")
            .to_string();
        let html = response.text().await.unwrap();
        let marker = format!("name=\"{CSRF_FIELD}\" value=\"");
        let start = html.find(&marker).expect("stamped form") + marker.len();
        let token = html[start..].split('"').next().unwrap().to_string();
        (cookie, token)
    }

    /// Submits a url-encoded form the way the rendered page would.
    async fn post_form(&self, path: &str, body: &str) -> reqwest::Response {
        let (cookie, token) = self.form_credentials().await;
        self.client
            .post(self.url(path))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::COOKIE, cookie)
            .body(format!("{body}&{CSRF_FIELD}={token}"))
            .send()
            .await
            .unwrap()
    }
}

/// Binds the full router to an ephemeral port over the in-memory store.
async fn spawn_app() -> TestApp {
    let state = AppState::new(
        Repositories::memory(Arc::new(MemoryRepository::new())),
        AppConfig::default(),
    );
    let app = create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Redirects are asserted, not followed.
    let client = Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();

    TestApp {
        address: format!("http://127.0.0.1:{port}"),
        state,
        client,
    }
}

fn university_body(name: &str) -> Value {
    json!({
        "nameAr": name,
        "type": 2,
        "governorate": 1,
        "fees": 95000
    })
}

// --- Infrastructure ---

#[tokio::test]
async fn test_health_check_and_request_id() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/health")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;

    let doc: Value = app
        .client
        .get(app.url("/api-docs/openapi.json"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(doc["paths"]["/api/universities/types"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
}

// --- Auth ---

#[tokio::test]
async fn test_login_endpoint_returns_token() {
    let app = spawn_app().await;
    app.create_user("api-admin@tansiqy.test", UserRole::Admin).await;

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": "api-admin@tansiqy.test", "password": "test-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["role"], "Admin");
    assert_eq!(body["email"], "api-admin@tansiqy.test");
}

#[tokio::test]
async fn test_login_endpoint_error_shapes() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": "nobody@tansiqy.test", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid email or password");
    assert_eq!(body["error"], "unauthorized");

    // Malformed body is a validation error, not a 422
    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": "nobody@tansiqy.test" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_mutations_require_admin() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/universities"))
        .json(&university_body("جامعة"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let student = app.token_for("pupil@tansiqy.test", UserRole::Student).await;
    let response = app
        .client
        .post(app.url("/api/universities"))
        .bearer_auth(&student)
        .json(&university_body("جامعة"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .client
        .delete(app.url("/api/universities/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// --- Catalog ---

#[tokio::test]
async fn test_admin_create_then_public_read() {
    let app = spawn_app().await;
    let admin = app.token_for("boss@tansiqy.test", UserRole::Admin).await;

    let response = app
        .client
        .post(app.url("/api/universities"))
        .bearer_auth(&admin)
        .json(&university_body("جامعة النيل"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let created: Value = response.json().await.unwrap();
    assert_eq!(location, format!("/api/universities/{}", created["id"]));
    assert_eq!(created["typeAr"], "جامعات خاصة");

    let response = app.client.get(app.url(&location)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=300"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["nameAr"], "جامعة النيل");
    assert_eq!(body["fees"], 95000.0);
    // Absent optional values are omitted
    assert!(body.get("nameEn").is_none());
}

#[tokio::test]
async fn test_invalid_payload_and_type_are_400() {
    let app = spawn_app().await;
    let admin = app.token_for("boss@tansiqy.test", UserRole::Admin).await;

    let response = app
        .client
        .post(app.url("/api/universities"))
        .bearer_auth(&admin)
        .json(&json!({ "nameAr": "", "type": 2, "governorate": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Arabic name is required");

    let response = app
        .client
        .get(app.url("/api/universities/type/7"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .client
        .get(app.url("/api/universities/search?minFees=lots"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_not_found_is_json_and_not_cached() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/universities/999"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "University with ID 999 not found");
    assert_eq!(body["error"], "not_found");
}

// --- Response Cache ---

#[tokio::test]
async fn test_anonymous_reads_are_served_from_cache() {
    let app = spawn_app().await;

    let first: Value = app
        .client
        .get(app.url("/api/news"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first, json!([]));

    // Written behind the cache's back
    let request: NewsRequest = serde_json::from_value(json!({
        "title": "فتح باب التقديم",
        "description": "يبدأ التقديم للمرحلة الأولى"
    }))
    .unwrap();
    app.state.news.create(&request).await.unwrap();

    let cached: Value = app
        .client
        .get(app.url("/api/news"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cached, json!([]));

    // A different query string is a different cache entry
    let fresh: Value = app
        .client
        .get(app.url("/api/news?page=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fresh.as_array().map(Vec::len), Some(1));

    // Authenticated requests bypass the cache
    let admin = app.token_for("reader@tansiqy.test", UserRole::Admin).await;
    let personal: Value = app
        .client
        .get(app.url("/api/news"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(personal.as_array().map(Vec::len), Some(1));
}

// --- Front-end ---

#[tokio::test]
async fn test_home_page_renders_type_breakdown() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));
    let html = response.text().await.unwrap();
    assert!(html.contains("dir=\"rtl\""));
    assert!(html.contains("جامعات تكنولوجية"));
}

#[tokio::test]
async fn test_admin_page_redirects_anonymous_to_login() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/universities/create"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/account/login?returnUrl=%2Funiversities%2Fcreate"
    );
}

#[tokio::test]
async fn test_session_login_sets_cookie_and_unlocks_admin_pages() {
    let app = spawn_app().await;
    app.create_user("editor@tansiqy.test", UserRole::Admin).await;

    let response = app
        .post_form("/account/login", "email=editor%40tansiqy.test&password=test-password&returnUrl=%2Funiversities%2Fcreate")
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/universities/create"
    );
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with(&format!("{SESSION_COOKIE}=")));
    assert!(set_cookie.contains("HttpOnly"));

    let session = set_cookie.split(';').next().unwrap().to_string();
    let response = app
        .client
        .get(app.url("/universities/create"))
        .header(header::COOKIE, session)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_session_login_rejects_bad_credentials_and_foreign_return_url() {
    let app = spawn_app().await;
    app.create_user("editor@tansiqy.test", UserRole::Admin).await;

    let response = app
        .post_form("/account/login", "email=editor%40tansiqy.test&password=wrong")
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let response = app
        .post_form("/account/login", "email=editor%40tansiqy.test&password=test-password&returnUrl=https%3A%2F%2Fevil.example")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

    // A tab would be stripped by the browser, leaving `//evil.example`
    // and a newline cannot be written into a header at all
    for return_url in ["%2F%09%2Fevil.example", "%2F%0D%0A%2Fevil.example"] {
        let response = app
            .post_form(
                "/account/login",
                &format!("email=editor%40tansiqy.test&password=test-password&returnUrl={return_url}"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
        assert!(response.headers().get(header::SET_COOKIE).is_some());
    }
}

#[test]
fn test_only_plain_local_paths_are_return_targets() {
    for url in ["/", "/universities/create", "/universities?type=2&x=%D8%A8"] {
        assert!(is_local_url(url), "{url:?} should be accepted");
    }
    for url in [
        "",
        "universities",
        "https://evil.example",
        "//evil.example",
        "/\\evil.example",
        "/\t/evil.example",
        "/\n/evil.example",
        "/a b",
        "/path\\..\\x",
    ] {
        assert!(!is_local_url(url), "{url:?} should be rejected");
    }
}

#[tokio::test]
async fn test_student_session_is_sent_to_access_denied() {
    let app = spawn_app().await;
    let token = app.token_for("pupil@tansiqy.test", UserRole::Student).await;

    let response = app
        .client
        .get(app.url("/users"))
        .header(header::COOKIE, format!("{SESSION_COOKIE}={token}"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/account/access-denied"
    );
}

#[tokio::test]
async fn test_unknown_type_on_listing_page_redirects_to_selection() {
    let app = spawn_app().await;

    for path in ["/universities", "/universities?type=42", "/universities?type=abc"] {
        let response = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/universities/select-type"
        );
    }
}

// --- Anti-Forgery ---

#[tokio::test]
async fn test_login_page_hands_out_nonce_cookie_and_stamped_form() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/account/login")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with(&format!("{CSRF_COOKIE}=")));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));

    let html = response.text().await.unwrap();
    assert!(html.contains(&format!("<input type=\"hidden\" name=\"{CSRF_FIELD}\"")));
}

#[tokio::test]
async fn test_form_post_without_valid_token_is_rejected() {
    let app = spawn_app().await;
    app.create_user("editor@tansiqy.test", UserRole::Admin).await;
    let credentials = "email=editor%40tansiqy.test&password=test-password";

    // No cookie and no field, as a cross-site form would send it
    let response = app
        .client
        .post(app.url("/account/login"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(credentials)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    // A token minted for one browser does not verify against another's cookie
    let (_, token) = app.form_credentials().await;
    let (other_cookie, _) = app.form_credentials().await;
    let response = app
        .client
        .post(app.url("/account/login"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, other_cookie)
        .body(format!("{credentials}&{CSRF_FIELD}={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.post_form("/account/login", credentials).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[test]
fn test_tokens_bind_to_nonce_and_secret() {
    let config = AppConfig::default();
    let token = sign_token(&config, "nonce-a").unwrap();

    assert!(verify_token(&config, &token, "nonce-a"));
    assert!(!verify_token(&config, &token, "nonce-b"));
    assert!(!verify_token(&config, "not-a-token", "nonce-a"));

    let other = AppConfig {
        jwt_secret: "another-secret".to_string(),
        ..AppConfig::default()
    };
    assert!(!verify_token(&other, &token, "nonce-a"));
}

#[test]
fn test_only_post_forms_are_stamped() {
    let html = "<form method=\"get\" action=\"/universities/search\"></form>\
<form method=\"post\" action=\"/account/logout\" class=\"d-inline\"><button>x</button></form>";

    let stamped = stamp_forms(html, "tok").unwrap();

    assert_eq!(
        stamped,
        "<form method=\"get\" action=\"/universities/search\"></form>\
<form method=\"post\" action=\"/account/logout\" class=\"d-inline\">\
<input type=\"hidden\" name=\"csrfToken\" value=\"tok\"><button>x</button></form>"
    );
    assert!(stamp_forms("<p>no forms</p>", "tok").is_none());
}
