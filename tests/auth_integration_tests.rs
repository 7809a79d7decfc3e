use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header, request::Parts},
    response::IntoResponse,
};
use chrono::Duration;
use cookie::SameSite;
use std::sync::Arc;
use tansiqy::{
    AppConfig, AppError, AppState, MemoryRepository, Repositories,
    auth::{
        AdminUser, AuthUser, SESSION_COOKIE, bearer_token, decode_token, expired_session_cookie,
        issue_token, session_cookie, session_token,
    },
    models::{User, UserRequest, UserRole},
    repository::CrudRepository,
};

// --- Helpers ---

fn test_state_with(config: AppConfig) -> AppState {
    AppState::new(
        Repositories::memory(Arc::new(MemoryRepository::new())),
        config,
    )
}

fn test_state() -> AppState {
    test_state_with(AppConfig::default())
}

/// Creates an account through the user service and returns its stored row.
async fn create_user(state: &AppState, email: &str, role: UserRole, is_active: bool) -> User {
    let view = state
        .users
        .create(&UserRequest {
            email: email.to_string(),
            full_name: Some("Test User".to_string()),
            password: Some("correct-horse".to_string()),
            role,
            is_active,
        })
        .await
        .expect("create user");
    state
        .repos
        .users
        .get_by_id(view.id)
        .await
        .unwrap()
        .expect("stored user")
}

fn parts_with_bearer(token: Option<&str>) -> Parts {
    let mut builder = Request::builder().uri("/api/universities");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(()).unwrap().into_parts().0
}

fn token_for(config: &AppConfig, user: &User) -> String {
    issue_token(config, user, Duration::minutes(5)).unwrap().0
}

// --- Token Validation ---

#[tokio::test]
async fn test_issued_token_round_trips_claims() {
    let state = test_state();
    let user = create_user(&state, "claims@tansiqy.test", UserRole::Admin, true).await;

    let (token, expires_at) = issue_token(&state.config, &user, Duration::minutes(60)).unwrap();
    let claims = decode_token(&state.config, &token).unwrap();

    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.email, "claims@tansiqy.test");
    assert_eq!(claims.role, "Admin");
    assert_eq!(claims.iss, "TansiqyAPI");
    assert_eq!(claims.aud, "TansiqyClient");
    assert_eq!(claims.exp, expires_at.timestamp());
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let state = test_state();
    let user = create_user(&state, "forged@tansiqy.test", UserRole::Admin, true).await;
    let attacker = AppConfig {
        jwt_secret: "not-the-real-secret".to_string(),
        ..AppConfig::default()
    };

    let err = decode_token(&state.config, &token_for(&attacker, &user)).unwrap_err();

    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_token_for_other_audience_or_issuer_is_rejected() {
    let state = test_state();
    let user = create_user(&state, "aud@tansiqy.test", UserRole::Admin, true).await;

    let other_audience = AppConfig {
        jwt_audience: "SomeOtherClient".to_string(),
        ..AppConfig::default()
    };
    let err = decode_token(&state.config, &token_for(&other_audience, &user)).unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let other_issuer = AppConfig {
        jwt_issuer: "SomeOtherIssuer".to_string(),
        ..AppConfig::default()
    };
    let err = decode_token(&state.config, &token_for(&other_issuer, &user)).unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_expired_token_is_reported_with_header() {
    let state = test_state();
    let user = create_user(&state, "late@tansiqy.test", UserRole::Admin, true).await;

    let (token, _) = issue_token(&state.config, &user, Duration::seconds(-30)).unwrap();
    let err = decode_token(&state.config, &token).unwrap_err();
    assert!(matches!(err, AppError::TokenExpired));

    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get("token-expired").unwrap(), "true");
}

// --- Extractors ---

#[tokio::test]
async fn test_admin_extractor_accepts_admin_token() {
    let state = test_state();
    let user = create_user(&state, "boss@tansiqy.test", UserRole::Admin, true).await;
    let token = token_for(&state.config, &user);

    let mut parts = parts_with_bearer(Some(&token));
    let AdminUser(admin) = AdminUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();

    assert_eq!(admin.id, user.id);
    assert!(admin.is_admin());
}

#[tokio::test]
async fn test_admin_extractor_without_token_is_401() {
    let state = test_state();

    let mut parts = parts_with_bearer(None);
    let err = AdminUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Authentication required");
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_extractor_rejects_student_with_403() {
    let state = test_state();
    let user = create_user(&state, "pupil@tansiqy.test", UserRole::Student, true).await;
    let token = token_for(&state.config, &user);

    let mut parts = parts_with_bearer(Some(&token));
    let err = AdminUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);

    // The same token still authenticates as a plain user
    let mut parts = parts_with_bearer(Some(&token));
    let auth = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(auth.role, UserRole::Student);
}

#[tokio::test]
async fn test_role_is_read_from_database_not_token() {
    let state = test_state();
    let user = create_user(&state, "demoted@tansiqy.test", UserRole::Admin, true).await;
    let token = token_for(&state.config, &user);

    state
        .users
        .update(
            user.id,
            &UserRequest {
                email: user.email.clone(),
                full_name: None,
                password: None,
                role: UserRole::Student,
                is_active: true,
            },
        )
        .await
        .unwrap();

    let mut parts = parts_with_bearer(Some(&token));
    let err = AdminUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_token_of_deactivated_or_deleted_account_is_401() {
    let state = test_state();
    let inactive = create_user(&state, "paused@tansiqy.test", UserRole::Admin, false).await;
    let removed = create_user(&state, "gone@tansiqy.test", UserRole::Admin, true).await;
    state.users.delete(removed.id).await.unwrap();

    for user in [&inactive, &removed] {
        let token = token_for(&state.config, user);
        let mut parts = parts_with_bearer(Some(&token));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}

// --- Token Transport ---

#[test]
fn test_bearer_token_requires_bearer_scheme() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
    assert_eq!(bearer_token(&headers), Some("abc.def"));
}

#[test]
fn test_session_token_is_found_among_other_cookies() {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}=tok123; lang=ar")).unwrap(),
    );
    assert_eq!(session_token(&headers).as_deref(), Some("tok123"));

    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
    assert_eq!(session_token(&headers), None);
}

#[test]
fn test_session_cookie_attributes() {
    let config = AppConfig::default();

    let cookie = session_cookie(&config, "tok");
    assert_eq!(cookie.name(), SESSION_COOKIE);
    assert_eq!(cookie.value(), "tok");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.path(), Some("/"));
    // Local runs without TLS
    assert_eq!(cookie.secure(), Some(false));

    let expired = expired_session_cookie();
    assert_eq!(expired.value(), "");
    assert_eq!(expired.max_age(), Some(cookie::time::Duration::ZERO));
}

// --- Login Service ---

#[tokio::test]
async fn test_login_issues_token_and_records_login() {
    let state = test_state();
    let user = create_user(&state, "Admin@Tansiqy.test", UserRole::Admin, true).await;
    assert!(user.last_login_at.is_none());

    // Email matching is case-insensitive
    let response = state
        .auth
        .login("admin@tansiqy.test", "correct-horse")
        .await
        .unwrap();

    assert_eq!(response.user_id, user.id);
    assert_eq!(response.role, "Admin");
    let claims = decode_token(&state.config, &response.token).unwrap();
    assert_eq!(claims.sub, user.id.to_string());

    let stored = state.repos.users.get_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.last_login_at.is_some());
}

#[tokio::test]
async fn test_login_failures_share_one_message() {
    let state = test_state();
    create_user(&state, "real@tansiqy.test", UserRole::Admin, true).await;
    create_user(&state, "sleeping@tansiqy.test", UserRole::Admin, false).await;

    let attempts = [
        ("real@tansiqy.test", "wrong-password"),
        ("nobody@tansiqy.test", "correct-horse"),
        ("sleeping@tansiqy.test", "correct-horse"),
    ];
    for (email, password) in attempts {
        let err = state.auth.login(email, password).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_bootstrap_admin_is_created_once() {
    let state = test_state_with(AppConfig {
        admin_email: Some("root@tansiqy.test".to_string()),
        admin_password: Some("bootstrap-pass".to_string()),
        ..AppConfig::default()
    });

    let created = state.auth.bootstrap_admin().await.unwrap();
    let admin = created.expect("first run creates the account");
    assert_eq!(admin.role, UserRole::Admin);
    assert!(admin.is_active);

    assert!(state.auth.bootstrap_admin().await.unwrap().is_none());
    state
        .auth
        .login("root@tansiqy.test", "bootstrap-pass")
        .await
        .expect("bootstrap credentials work");
}

#[tokio::test]
async fn test_bootstrap_admin_without_credentials_is_noop() {
    let state = test_state();

    assert!(state.auth.bootstrap_admin().await.unwrap().is_none());
    assert!(state.users.list().await.unwrap().is_empty());
}
