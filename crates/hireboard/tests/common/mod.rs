#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use hireboard::auth::PasswordCost;
use hireboard::config::AuthConfig;
use hireboard::pipeline::PipelinePolicy;
use hireboard::store::{MemoryStore, Store};
use hireboard::{hireboard_router, Hireboard};

pub struct TestApp<S> {
    pub router: Router,
    pub state: Arc<Hireboard<S>>,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    pub fn set_cookie(&self) -> &str {
        self.headers
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("set-cookie header")
    }

    /// The `auth_token` value from `Set-Cookie`.
    pub fn session_token(&self) -> String {
        self.set_cookie()
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix("auth_token="))
            .expect("auth_token cookie")
            .to_string()
    }
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-test-secret".to_string(),
        session_ttl_days: 7,
        secure_cookies: false,
        password: PasswordCost {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        },
    }
}

pub fn app_with<S>(store: Arc<S>, policy: PipelinePolicy) -> TestApp<S>
where
    S: Store + 'static,
{
    let state = Arc::new(Hireboard::new(store, &auth_config(), policy).expect("state builds"));
    TestApp {
        router: hireboard_router(Arc::clone(&state)),
        state,
    }
}

pub fn app() -> TestApp<MemoryStore> {
    app_with(Arc::new(MemoryStore::default()), PipelinePolicy::Permissive)
}

impl<S> TestApp<S>
where
    S: Store + 'static,
{
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(COOKIE, format!("theme=dark; auth_token={token}"));
        }
        let request = match body {
            Some(body) => request
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        Reply {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> Reply {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Reply {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Signs up a recruiter and returns their session token.
    pub async fn recruiter(&self, email: &str, company: &str) -> String {
        let reply = self
            .send(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(json!({
                    "email": email,
                    "password": "12345678",
                    "firstName": "Rosa",
                    "lastName": "Diaz",
                    "companyName": company,
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.session_token()
    }

    pub async fn create_job(&self, token: &str, body: Value) -> Value {
        let reply = self.post("/api/jobs", token, body).await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body["job"].clone()
    }

    pub async fn create_candidate(&self, token: &str, body: Value) -> Value {
        let reply = self.post("/api/candidates", token, body).await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body["candidate"].clone()
    }
}

pub fn job_body(title: &str, location: &str, employment_type: Option<&str>) -> Value {
    let mut body = json!({
        "title": title,
        "department": "Engineering",
        "location": location,
        "description": "Build the product",
        "requirements": "Rust",
    });
    if let Some(kind) = employment_type {
        body["employmentType"] = json!(kind);
    }
    body
}

pub fn candidate_body(first: &str, email: &str) -> Value {
    json!({
        "firstName": first,
        "lastName": "Tester",
        "email": email,
    })
}
