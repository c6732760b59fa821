mod common;

use auth_identity::Role;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Utc;
use jobboard_server::auth::AccessClaims;
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::ExposeSecret;
use serde_json::json;
use uuid::Uuid;

use common::{bearer, get, json_request, TestApp, PASSWORD};

fn change_role(user_id: &str, role: &str) -> Request<Body> {
    json_request(
        Method::PATCH,
        &format!("/admin/users/{user_id}/role"),
        &json!({ "role": role }),
    )
}

#[tokio::test]
async fn test_self_registration_as_admin_is_forbidden() {
    let app = TestApp::new();

    let response = app.register("Mallory", "mallory@test.dev", Some("admin")).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "FORBIDDEN");
    assert!(response.cookies().is_empty());

    let login = app.login("mallory@test.dev", PASSWORD).await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_admin_caller_cannot_create_admin() {
    let app = TestApp::new();
    let employer = app.register("Erin", "erin@test.dev", Some("employer")).await.session();
    assert_eq!(employer.user["role"], "employer");

    let request = bearer(
        json_request(
            Method::POST,
            "/auth/register",
            &json!({ "name": "Mallory", "email": "mallory@test.dev", "password": PASSWORD, "role": "admin" }),
        ),
        &employer.access,
    );
    assert_eq!(app.send(request).await.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_can_create_admin() {
    let app = TestApp::new();
    let admin = app.seed_admin("root@test.dev").await;

    let request = bearer(
        json_request(
            Method::POST,
            "/auth/register",
            &json!({ "name": "Second Admin", "email": "second@test.dev", "password": PASSWORD, "role": "admin" }),
        ),
        &admin.access,
    );
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["user"]["role"], "admin");
    assert!(response.cookies().is_empty());

    let still_root = app.send(bearer(get("/me"), &admin.access)).await;
    assert_eq!(still_root.body["user"]["email"], "root@test.dev");

    let second = app.login("second@test.dev", PASSWORD).await;
    assert_eq!(second.status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_ignores_an_unreadable_bearer() {
    let app = TestApp::new();
    let garbage = "not.a.jwt";

    let anonymous = app
        .send(bearer(
            json_request(
                Method::POST,
                "/auth/register",
                &json!({ "name": "Alice", "email": "alice@test.dev", "password": PASSWORD }),
            ),
            garbage,
        ))
        .await;
    assert_eq!(anonymous.status, StatusCode::CREATED);
    assert_eq!(anonymous.body["user"]["role"], "candidate");

    let as_admin = app
        .send(bearer(
            json_request(
                Method::POST,
                "/auth/register",
                &json!({ "name": "Mallory", "email": "mallory@test.dev", "password": PASSWORD, "role": "admin" }),
            ),
            garbage,
        ))
        .await;
    assert_eq!(as_admin.status, StatusCode::FORBIDDEN);
    assert_eq!(as_admin.error_code(), "FORBIDDEN");
}

#[tokio::test]
async fn test_role_change_forces_reauthentication() {
    let app = TestApp::new();
    let admin = app.seed_admin("root@test.dev").await;
    let candidate = app.register("Alice", "alice@test.dev", None).await.session();
    let second_device = app.login("alice@test.dev", PASSWORD).await.session();

    let response = app
        .send(bearer(
            change_role(candidate.user["id"].as_str().unwrap(), "employer"),
            &admin.access,
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["id"], candidate.user["id"]);
    assert_eq!(response.body["user"]["role"], "employer");

    for refresh in [&candidate.refresh, &second_device.refresh] {
        let refreshed = app.refresh_with_cookie(refresh).await;
        assert_eq!(refreshed.status, StatusCode::UNAUTHORIZED);
    }

    let relogin = app.login("alice@test.dev", PASSWORD).await.session();
    assert_eq!(relogin.user["role"], "employer");
    let claims = app.state.sessions.codec().verify_access(&relogin.access).unwrap();
    assert_eq!(claims.role, Role::Employer);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = TestApp::new();
    let candidate = app.register("Alice", "alice@test.dev", None).await.session();
    let target = candidate.user["id"].as_str().unwrap().to_string();

    let anonymous = app.send(change_role(&target, "admin")).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let escalation = app
        .send(bearer(change_role(&target, "admin"), &candidate.access))
        .await;
    assert_eq!(escalation.status, StatusCode::FORBIDDEN);

    let me = app.send(bearer(get("/me"), &candidate.access)).await;
    assert_eq!(me.body["user"]["role"], "candidate");
}

#[tokio::test]
async fn test_change_role_rejects_bad_targets() {
    let app = TestApp::new();
    let admin = app.seed_admin("root@test.dev").await;

    let malformed = app.send(bearer(change_role("not-a-uuid", "employer"), &admin.access)).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .send(bearer(change_role(&Uuid::new_v4().to_string(), "employer"), &admin.access))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.error_message(), "User not found.");

    let bad_role = app
        .send(bearer(
            change_role(admin.user["id"].as_str().unwrap(), "owner"),
            &admin.access,
        ))
        .await;
    assert_eq!(bad_role.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_requires_a_valid_access_token() {
    let app = TestApp::new();

    let missing = app.send(get("/me")).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.error_message(), "Authentication required.");

    let forged = app.send(bearer(get("/me"), "eyJhbGciOiJIUzI1NiJ9.e30.c2ln")).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
    assert_eq!(forged.error_message(), "Invalid or expired token.");
}

#[tokio::test]
async fn test_expired_access_token_is_rejected_like_a_forged_one() {
    let app = TestApp::new();
    let session = app.register("Alice", "alice@test.dev", None).await.session();

    let now = Utc::now().timestamp();
    let claims = AccessClaims {
        sub: session.user_id(),
        role: Role::Candidate,
        iat: now - 1_000,
        exp: now - 100,
        iss: app.config.token.issuer.clone(),
    };
    let key = EncodingKey::from_secret(app.config.token.access_secret.expose_secret().as_bytes());
    let expired = encode(&Header::default(), &claims, &key).unwrap();

    let expired_response = app.send(bearer(get("/me"), &expired)).await;
    let forged_response = app.send(bearer(get("/me"), "eyJhbGciOiJIUzI1NiJ9.e30.c2ln")).await;

    assert_eq!(expired_response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(expired_response.status, forged_response.status);
    assert_eq!(expired_response.error_code(), "UNAUTHORIZED");
    assert_eq!(expired_response.error_code(), forged_response.error_code());
    assert_eq!(expired_response.error_message(), forged_response.error_message());
}

#[tokio::test]
async fn test_me_reads_the_access_cookie() {
    let app = TestApp::new();
    let session = app.register("Alice", "alice@test.dev", None).await.session();

    let request = Request::builder()
        .uri("/me")
        .header(header::COOKIE, format!("access_token={}", session.access))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["email"], "alice@test.dev");
    assert_eq!(response.body["user"]["name"], "Alice");
}

#[tokio::test]
async fn test_update_profile_and_password() {
    let app = TestApp::new();
    let session = app.register("Alice", "alice@test.dev", None).await.session();

    let profile = app
        .send(bearer(
            json_request(
                Method::PATCH,
                "/me",
                &json!({ "headline": "Rust engineer", "location": "Berlin" }),
            ),
            &session.access,
        ))
        .await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["user"]["headline"], "Rust engineer");
    assert_eq!(profile.body["user"]["location"], "Berlin");

    let without_current = app
        .send(bearer(
            json_request(Method::PATCH, "/me", &json!({ "newPassword": "Another456!" })),
            &session.access,
        ))
        .await;
    assert_eq!(without_current.status, StatusCode::BAD_REQUEST);

    let without_new = app
        .send(bearer(
            json_request(
                Method::PATCH,
                "/me",
                &json!({ "name": "Mallory", "currentPassword": "WRONG-password" }),
            ),
            &session.access,
        ))
        .await;
    assert_eq!(without_new.status, StatusCode::BAD_REQUEST);
    assert_eq!(without_new.error_code(), "VALIDATION_ERROR");

    let wrong_current = app
        .send(bearer(
            json_request(
                Method::PATCH,
                "/me",
                &json!({ "currentPassword": "nope", "newPassword": "Another456!" }),
            ),
            &session.access,
        ))
        .await;
    assert_eq!(wrong_current.status, StatusCode::BAD_REQUEST);

    let changed = app
        .send(bearer(
            json_request(
                Method::PATCH,
                "/me",
                &json!({ "currentPassword": PASSWORD, "newPassword": "Another456!" }),
            ),
            &session.access,
        ))
        .await;
    assert_eq!(changed.status, StatusCode::OK);

    assert_eq!(app.login("alice@test.dev", PASSWORD).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("alice@test.dev", "Another456!").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_error_body_carries_request_id() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/me")
        .header("x-request-id", "trace-abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers["x-request-id"], "trace-abc-123");
    assert_eq!(response.body["error"]["requestId"], "trace-abc-123");

    let generated = app.send(get("/me")).await;
    let id = generated.headers["x-request-id"].to_str().unwrap().to_string();
    assert!(Uuid::parse_str(&id).is_ok());
    assert_eq!(generated.body["error"]["requestId"], id.as_str());
}

#[tokio::test]
async fn test_health_reports_in_memory_storage() {
    let app = TestApp::new();

    let response = app.send(get("/health")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["storage"], "in-memory");
}
