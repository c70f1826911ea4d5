#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{TestContext, PASSWORD};
use coursehub::models::AccountType;
use coursehub::store::Store;

#[actix_rt::test]
async fn test_health_is_public() {
    let ctx = TestContext::new();
    let app = test_app!(ctx.state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["database"], "up");
}

#[actix_rt::test]
async fn test_signup_as_admin_is_forbidden() {
    let ctx = TestContext::new();
    ctx.store.insert_otp("root@example.com", "271828").await.unwrap();
    let app = test_app!(ctx.state);

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({
            "first_name": "Root",
            "last_name": "User",
            "email": "root@example.com",
            "password": PASSWORD,
            "confirm_password": PASSWORD,
            "account_type": "admin",
            "otp": "271828",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(ctx
        .store
        .find_user_by_email("root@example.com")
        .await
        .unwrap()
        .is_none());
}

#[actix_rt::test]
async fn test_signup_and_login_flow() {
    let ctx = TestContext::new();
    let app = test_app!(ctx.state);

    let req = test::TestRequest::post()
        .uri("/api/auth/sendotp")
        .set_json(json!({ "email": "ada@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert!(body.get("data").is_none(), "OTP must not be echoed");

    let otp = ctx.store.latest_otp("ada@example.com").await.unwrap().unwrap();
    let signup = json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "password": PASSWORD,
        "confirm_password": PASSWORD,
        "account_type": "student",
        "otp": otp.code,
    });
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(&signup)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert!(ctx.store.latest_otp("ada@example.com").await.unwrap().is_none());
    assert!(body["data"].get("password_hash").is_none());

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(&signup)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ada@example.com", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "token")
        .expect("login sets the token cookie")
        .into_owned();
    assert!(cookie.http_only().unwrap_or(false));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["token"], cookie.value());

    // The cookie alone authenticates.
    let req = test::TestRequest::get()
        .uri("/api/profile")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["first_name"], "Ada");
    assert_eq!(body["data"]["courses"], json!([]));
}

#[actix_rt::test]
async fn test_login_with_wrong_password() {
    let ctx = TestContext::new();
    ctx.user("grace@example.com", AccountType::Student).await;
    let app = test_app!(ctx.state);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "grace@example.com", "password": "not-the-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new();
    let app = test_app!(ctx.state);

    for uri in ["/api/profile", "/api/courses"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::try_call_service(&app, req).await;
        let status = match resp {
            Ok(resp) => resp.status(),
            Err(err) => err.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let status = match test::try_call_service(&app, req).await {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    };
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_change_password_then_login() {
    let ctx = TestContext::new();
    let user = ctx.user("grace@example.com", AccountType::Student).await;
    let app = test_app!(ctx.state);

    let req = test::TestRequest::post()
        .uri("/api/auth/change-password")
        .insert_header(ctx.bearer(&user))
        .set_json(json!({
            "old_password": PASSWORD,
            "new_password": "rotated-secret",
            "confirm_new_password": "rotated-secret",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.notifier.sent.lock().len(), 1);

    assert!(common::login(&app, "grace@example.com", PASSWORD).await.is_err());
    let token = common::login(&app, "grace@example.com", "rotated-secret")
        .await
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_delete_profile_removes_account() {
    let ctx = TestContext::new();
    let user = ctx.user("grace@example.com", AccountType::Student).await;
    let app = test_app!(ctx.state);

    let req = test::TestRequest::delete()
        .uri("/api/profile")
        .insert_header(ctx.bearer(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(ctx.store.find_user(user.id).await.unwrap().is_none());
}
