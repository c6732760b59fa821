#![allow(dead_code)]

use auth_identity::{HashingConfig, Role};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use secrecy::SecretString;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use jobboard_server::{
    auth::{
        config::{CookieConfig, TokenConfig},
        db::MemoryAuthStore,
        session::{ClientMeta, Registration},
        Identity,
    },
    config::{AppConfig, DatabaseConfig, ServerConfig},
    create_app, AppState,
};

pub const PASSWORD: &str = "Secret123!";

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig::default(),
        token: TokenConfig {
            access_secret: SecretString::new(format!("access-{}", Uuid::new_v4())),
            refresh_secret: SecretString::new(format!("refresh-{}", Uuid::new_v4())),
            access_ttl_secs: 900,
            refresh_ttl_secs: 2_592_000,
            issuer: "jobboard".to_string(),
        },
        cookie: CookieConfig::default(),
        hashing: HashingConfig::minimal(),
    }
}

pub struct TestApp {
    pub app: Router,
    pub config: AppConfig,
    pub state: AppState,
    pub store: MemoryAuthStore,
}

/// A signed-in client: the body returned at sign-in plus both tokens
pub struct Session {
    pub user: Value,
    pub access: String,
    pub refresh: String,
}

impl Session {
    pub fn user_id(&self) -> Uuid {
        Uuid::parse_str(self.user["id"].as_str().unwrap()).unwrap()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `Set-Cookie` values by cookie name
    pub fn cookies(&self) -> HashMap<String, String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|raw| {
                let pair = raw.split(';').next()?;
                let (name, value) = pair.split_once('=')?;
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .collect()
    }

    pub fn set_cookie_lines(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok().map(str::to_string))
            .collect()
    }

    pub fn error_code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or_default()
    }

    pub fn error_message(&self) -> &str {
        self.body["error"]["message"].as_str().unwrap_or_default()
    }

    pub fn session(&self) -> Session {
        let cookies = self.cookies();
        Session {
            user: self.body["user"].clone(),
            access: cookies["access_token"].clone(),
            refresh: cookies["refresh_token"].clone(),
        }
    }
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let store = MemoryAuthStore::new();
        let state = AppState::build(&config, Arc::new(store.clone()), None).unwrap();
        let app = create_app(state.clone());
        Self { app, config, state, store }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse { status, headers, body }
    }

    pub async fn register(&self, name: &str, email: &str, role: Option<&str>) -> TestResponse {
        let mut body = serde_json::json!({ "name": name, "email": email, "password": PASSWORD });
        if let Some(role) = role {
            body["role"] = Value::String(role.to_string());
        }
        self.send(json_request(Method::POST, "/auth/register", &body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        let body = serde_json::json!({ "email": email, "password": password });
        self.send(json_request(Method::POST, "/auth/login", &body)).await
    }

    pub async fn refresh_with_cookie(&self, refresh_token: &str) -> TestResponse {
        self.send(refresh_request(refresh_token)).await
    }

    /// Create an admin account directly through the session manager
    pub async fn seed_admin(&self, email: &str) -> Session {
        let caller = Identity {
            id: Uuid::new_v4(),
            role: Role::Admin,
        };
        let tokens = self
            .state
            .sessions
            .register(
                Registration {
                    name: "Root Admin".to_string(),
                    email: email.to_string(),
                    password: PASSWORD.to_string(),
                    role: Some(Role::Admin),
                },
                Some(caller),
                &ClientMeta::default(),
            )
            .await
            .unwrap();

        Session {
            user: serde_json::to_value(&tokens.user).unwrap(),
            access: tokens.access.token,
            refresh: tokens.refresh.token,
        }
    }
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn refresh_request(refresh_token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/auth/refresh")
        .header(header::COOKIE, format!("refresh_token={refresh_token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn bearer(request: Request<Body>, access_token: &str) -> Request<Body> {
    let (mut parts, body) = request.into_parts();
    parts.headers.insert(
        header::AUTHORIZATION,
        format!("Bearer {access_token}").parse().unwrap(),
    );
    Request::from_parts(parts, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
