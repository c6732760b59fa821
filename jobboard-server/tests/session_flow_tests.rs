mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::{bearer, get, json_request, refresh_request, TestApp, PASSWORD};
use jobboard_server::auth::db::{
    AuthStore, AuthTransaction, NewRefreshToken, RefreshTokenLedger, RowLock,
};

#[tokio::test]
async fn test_register_login_refresh_and_replay() {
    let app = TestApp::new();

    let registered = app.register("Alice", "alice@test.dev", None).await;
    assert_eq!(registered.status, StatusCode::CREATED);
    assert_eq!(registered.body["user"]["email"], "alice@test.dev");
    assert_eq!(registered.body["user"]["role"], "candidate");
    assert!(registered.body["user"].get("passwordHash").is_none());
    assert!(registered.body["user"].get("password").is_none());

    let cookie_lines = registered.set_cookie_lines();
    assert_eq!(cookie_lines.len(), 2);
    for line in &cookie_lines {
        assert!(line.contains("HttpOnly"));
        assert!(line.contains("Path=/"));
        assert!(line.contains("SameSite=Lax"));
    }

    let login = app.login("alice@test.dev", PASSWORD).await;
    assert_eq!(login.status, StatusCode::OK);
    let first = login.session();

    let rotated = app.refresh_with_cookie(&first.refresh).await;
    assert_eq!(rotated.status, StatusCode::OK);
    let second = rotated.session();
    assert_ne!(first.refresh, second.refresh);
    assert_eq!(second.user["id"], first.user["id"]);

    let replay = app.refresh_with_cookie(&first.refresh).await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.error_code(), "UNAUTHORIZED");
    assert_eq!(replay.error_message(), "Invalid refresh token.");

    let again = app.refresh_with_cookie(&second.refresh).await;
    assert_eq!(again.status, StatusCode::OK);
}

#[tokio::test]
async fn test_email_is_case_insensitive() {
    let app = TestApp::new();
    app.register("Alice", "Alice@Test.dev", None).await;

    let duplicate = app.register("Other Alice", "alice@test.DEV", None).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.error_code(), "CONFLICT");

    let login = app.login("ALICE@test.dev", PASSWORD).await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["user"]["email"], "alice@test.dev");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.register("Alice", "alice@test.dev", None).await;

    let wrong_password = app.login("alice@test.dev", "not-the-password").await;
    let unknown_email = app.login("nobody@test.dev", PASSWORD).await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.status, unknown_email.status);
    assert_eq!(wrong_password.error_code(), "INVALID_CREDENTIALS");
    assert_eq!(wrong_password.error_code(), unknown_email.error_code());
    assert_eq!(wrong_password.error_message(), unknown_email.error_message());
    assert!(wrong_password.cookies().is_empty());
}

#[tokio::test]
async fn test_refresh_accepts_header_and_rejects_missing_token() {
    let app = TestApp::new();
    let session = app.register("Alice", "alice@test.dev", None).await.session();

    let missing = app
        .send(Request::builder().method(Method::POST).uri("/auth/refresh").body(Body::empty()).unwrap())
        .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.error_message(), "Refresh token missing.");

    let via_header = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/refresh")
                .header("x-refresh-token", &session.refresh)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(via_header.status, StatusCode::OK);
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let app = TestApp::new();
    let session = app.register("Alice", "alice@test.dev", None).await.session();

    let response = app.refresh_with_cookie(&session.access).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let me = app.send(bearer(get("/me"), &session.refresh)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_is_idempotent_and_ends_the_session() {
    let app = TestApp::new();
    let session = app.register("Alice", "alice@test.dev", None).await.session();

    let anonymous = app
        .send(Request::builder().method(Method::POST).uri("/auth/logout").body(Body::empty()).unwrap())
        .await;
    assert_eq!(anonymous.status, StatusCode::NO_CONTENT);
    let cleared = anonymous.cookies();
    assert_eq!(cleared.get("access_token").map(String::as_str), Some(""));
    assert_eq!(cleared.get("refresh_token").map(String::as_str), Some(""));

    let logout = || {
        Request::builder()
            .method(Method::POST)
            .uri("/auth/logout")
            .header(header::COOKIE, format!("refresh_token={}", session.refresh))
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(app.send(logout()).await.status, StatusCode::NO_CONTENT);
    assert_eq!(app.send(logout()).await.status, StatusCode::NO_CONTENT);

    let garbage = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/logout")
                .header(header::COOKIE, "refresh_token=not.a.jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(garbage.status, StatusCode::NO_CONTENT);

    let refresh = app.refresh_with_cookie(&session.refresh).await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_ledger_record_is_rejected() {
    let app = TestApp::new();
    let session = app.register("Alice", "alice@test.dev", None).await.session();
    let user_id = session.user_id();

    // Signature still valid, ledger record already past its expiry
    let codec = app.state.sessions.codec();
    let jti = Uuid::new_v4();
    let signed = codec
        .issue_refresh(user_id, auth_identity::Role::Candidate, jti)
        .unwrap();
    let token_hash = codec.hash(&signed.token).await.unwrap();

    let mut tx = app.state.store.begin().await.unwrap();
    tx.insert_token(NewRefreshToken {
        id: jti,
        user_id,
        token_hash,
        user_agent: None,
        ip: None,
        expires_at: Utc::now() - Duration::seconds(1),
    })
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let response = app.refresh_with_cookie(&signed.token).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_message(), "Invalid refresh token.");
}

#[tokio::test]
async fn test_concurrent_refresh_has_one_winner() {
    let app = TestApp::new();
    let session = app.register("Alice", "alice@test.dev", None).await.session();

    let (a, b) = tokio::join!(
        app.app.clone().oneshot(refresh_request(&session.refresh)),
        app.app.clone().oneshot(refresh_request(&session.refresh)),
    );
    let statuses = [a.unwrap().status(), b.unwrap().status()];

    let winners = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let losers = statuses
        .iter()
        .filter(|s| **s == StatusCode::UNAUTHORIZED)
        .count();
    assert_eq!((winners, losers), (1, 1));

    let mut tx = app.state.store.begin().await.unwrap();
    let record_revoked = tx
        .find_token(
            app.state.sessions.codec().verify_refresh(&session.refresh).unwrap().jti,
            RowLock::None,
        )
        .await
        .unwrap()
        .unwrap()
        .is_revoked();
    assert!(record_revoked);
    assert_eq!(tx.count_active_for_user(session.user_id()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_ledger_records_client_metadata() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "integration-test/1.0")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(Body::from(
            json!({ "name": "Alice", "email": "alice@test.dev", "password": PASSWORD }).to_string(),
        ))
        .unwrap();
    let session = app.send(request).await.session();

    let jti = app.state.sessions.codec().verify_refresh(&session.refresh).unwrap().jti;
    let mut tx = app.state.store.begin().await.unwrap();
    let record = tx.find_token(jti, RowLock::None).await.unwrap().unwrap();

    assert_eq!(record.user_agent.as_deref(), Some("integration-test/1.0"));
    assert_eq!(record.ip, Some("203.0.113.7".parse().unwrap()));
    assert_ne!(record.token_hash, session.refresh);
}

#[tokio::test]
async fn test_register_rejects_invalid_body() {
    let app = TestApp::new();

    let short = app
        .send(json_request(
            Method::POST,
            "/auth/register",
            &json!({ "name": "A", "email": "not-an-email", "password": "123" }),
        ))
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(short.error_code(), "VALIDATION_ERROR");
    assert_eq!(short.error_message(), "Invalid fields: email, name, password.");

    let unknown_role = app.register("Alice", "alice@test.dev", Some("superuser")).await;
    assert_eq!(unknown_role.status, StatusCode::BAD_REQUEST);
}
