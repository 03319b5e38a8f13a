//! Session lifecycle through the HTTP router.
//!
//! Scenarios covered:
//! - signup creates a user with a company and sets an HttpOnly session cookie
//! - login with a wrong password and with an unknown email are indistinguishable
//! - missing, garbage, and expired tokens are rejected before any handler runs
//! - logout clears the cookie and `me` returns the caller with their company

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;

use common::app;
use hireboard::domain::UserId;
use hireboard::store::Store;

#[tokio::test]
async fn signup_then_login_opens_the_api() {
    let app = app();

    let signup = app
        .send(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "email": " A@X.com ",
                "password": "12345678",
                "firstName": "A",
                "lastName": "B",
                "companyName": "Acme",
            })),
        )
        .await;

    assert_eq!(signup.status, StatusCode::CREATED);
    assert_eq!(signup.body["success"], true);
    assert_eq!(signup.body["user"]["email"], "a@x.com");
    assert_eq!(signup.body["user"]["role"], "RECRUITER");
    assert!(signup.body["user"].get("passwordHash").is_none());
    assert!(signup.body["user"].get("password").is_none());

    let cookie = signup.set_cookie();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));
    assert!(!cookie.contains("Secure"));

    let user = app
        .state
        .store()
        .user_by_email("a@x.com")
        .unwrap()
        .expect("user stored");
    assert_ne!(user.password_hash, "12345678");
    let company = app
        .state
        .store()
        .company_owned_by(user.id)
        .unwrap()
        .expect("company stored");
    assert_eq!(company.name, "Acme");

    let login = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "12345678" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["message"], "Logged in successfully");

    let jobs = app.get("/api/jobs", &login.session_token()).await;
    assert_eq!(jobs.status, StatusCode::OK);
    assert_eq!(jobs.body, json!({ "jobs": [] }));
}

#[tokio::test]
async fn signup_validates_before_touching_the_store() {
    let app = app();

    let missing = app
        .send(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "email": "a@x.com", "password": "12345678" })),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "Missing required fields");

    let short = app
        .send(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "email": "a@x.com",
                "password": "1234567",
                "firstName": "A",
                "lastName": "B",
                "companyName": "Acme",
            })),
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(short.body["error"], "Password must be at least 8 characters");

    assert!(app.state.store().user_by_email("a@x.com").unwrap().is_none());
}

#[tokio::test]
async fn duplicate_signup_conflicts_and_keeps_the_first_password() {
    let app = app();
    app.recruiter("dup@x.com", "First Co").await;

    let second = app
        .send(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "email": "DUP@x.com",
                "password": "another-password",
                "firstName": "C",
                "lastName": "D",
                "companyName": "Second Co",
            })),
        )
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["error"], "Email already registered");

    let with_first = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "dup@x.com", "password": "12345678" })),
        )
        .await;
    assert_eq!(with_first.status, StatusCode::OK);

    let user = app
        .state
        .store()
        .user_by_email("dup@x.com")
        .unwrap()
        .unwrap();
    let company = app.state.store().company_owned_by(user.id).unwrap().unwrap();
    assert_eq!(company.name, "First Co");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_signups_for_one_email_produce_one_account() {
    let app = std::sync::Arc::new(app());

    let attempts = (0..6).map(|n| {
        let app = std::sync::Arc::clone(&app);
        tokio::spawn(async move {
            app.send(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(json!({
                    "email": "race@x.com",
                    "password": "12345678",
                    "firstName": "R",
                    "lastName": "C",
                    "companyName": format!("Company {n}"),
                })),
            )
            .await
            .status
        })
    });

    let mut statuses = Vec::new();
    for attempt in attempts.collect::<Vec<_>>() {
        statuses.push(attempt.await.unwrap());
    }

    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    let conflicts = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
    assert_eq!(created, 1, "{statuses:?}");
    assert_eq!(conflicts, 5, "{statuses:?}");
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = app();
    app.recruiter("known@x.com", "Acme").await;

    let wrong_password = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "known@x.com", "password": "wrong-password" })),
        )
        .await;
    let unknown_email = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@x.com", "password": "wrong-password" })),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.status, unknown_email.status);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(
        wrong_password.body,
        json!({ "error": "Invalid email or password" })
    );
    assert!(wrong_password.headers.get("set-cookie").is_none());
}

#[tokio::test]
async fn login_requires_both_fields() {
    let app = app();

    let reply = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "a@x.com" })),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "Email and password required");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app();
    let token = app.recruiter("json@x.com", "Acme").await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/jobs")
        .header("content-type", "application/json")
        .header("cookie", format!("auth_token={token}"))
        .body(axum::body::Body::from("{\"title\": "))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_reject_missing_and_forged_sessions() {
    let app = app();

    for uri in ["/api/jobs", "/api/candidates", "/api/dashboard", "/api/auth/me"] {
        let anonymous = app.send(Method::GET, uri, None, None).await;
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(anonymous.body, json!({ "error": "Unauthorized" }));

        let forged = app.get(uri, "not.a.token").await;
        assert_eq!(forged.status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn authentication_runs_before_body_validation() {
    let app = app();

    let reply = app
        .send(Method::POST, "/api/jobs", None, Some(json!({ "title": "" })))
        .await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sessions_expire_after_the_ttl() {
    let app = app();
    app.recruiter("ttl@x.com", "Acme").await;
    let user = app
        .state
        .store()
        .user_by_email("ttl@x.com")
        .unwrap()
        .unwrap();
    let tokens = app.state.gate().tokens();

    let fresh = tokens
        .issue_at(user.id, Utc::now() - Duration::days(7) + Duration::minutes(5))
        .unwrap();
    assert_eq!(app.get("/api/jobs", &fresh).await.status, StatusCode::OK);

    let stale = tokens
        .issue_at(user.id, Utc::now() - Duration::days(7) - Duration::minutes(5))
        .unwrap();
    let reply = app.get("/api/jobs", &stale).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body, json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn valid_token_without_a_company_is_not_found() {
    let app = app();
    let orphan = app.state.gate().tokens().issue(UserId::new()).unwrap();

    let reply = app.get("/api/jobs", &orphan).await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, json!({ "error": "No company found" }));
}

#[tokio::test]
async fn me_returns_the_user_and_their_company() {
    let app = app();
    let token = app.recruiter("me@x.com", "Acme").await;

    let reply = app.get("/api/auth/me", &token).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["user"]["email"], "me@x.com");
    assert_eq!(reply.body["user"]["firstName"], "Rosa");
    assert_eq!(reply.body["company"]["name"], "Acme");
    assert_eq!(reply.body["company"]["ownerId"], reply.body["user"]["id"]);
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = app();
    let token = app.recruiter("bye@x.com", "Acme").await;

    let reply = app
        .send(Method::POST, "/api/auth/logout", Some(&token), None)
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["success"], true);
    let cookie = reply.set_cookie();
    assert!(cookie.starts_with("auth_token=;"));
    assert!(cookie.contains("Max-Age=0"));

    let anonymous = app
        .send(Method::POST, "/api/auth/logout", None, None)
        .await;
    assert_eq!(anonymous.status, StatusCode::OK);
}
