#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use coursehub::auth::{generate_token, hash_password};
use coursehub::error::AppError;
use coursehub::models::{AccountType, CategoryInput, Course, CourseInput, NewUser, User};
use coursehub::services::notify::Notifier;
use coursehub::services::payment::{Order, PaymentGateway, PaymentVerifier};
use coursehub::store::{MemoryStore, Store};
use coursehub::AppState;

pub const JWT_SECRET: &str = "integration-jwt-secret";
pub const PAYMENT_SECRET: &str = "integration-payment-secret";
pub const PASSWORD: &str = "password123";

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        self.sent
            .lock()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

pub struct FakeGateway;

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<Order, AppError> {
        Ok(Order {
            id: "order_test".to_string(),
            amount: amount_minor,
            currency: currency.to_string(),
            receipt: Some(receipt.to_string()),
            status: "created".to_string(),
        })
    }
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub state: actix_web::web::Data<AppState>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let state = actix_web::web::Data::new(AppState {
            store: store.clone(),
            notifier: notifier.clone(),
            gateway: Arc::new(FakeGateway),
            verifier: PaymentVerifier::new(PAYMENT_SECRET),
            jwt_secret: JWT_SECRET.to_string(),
            currency: "INR".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
        });
        Self {
            store,
            notifier,
            state,
        }
    }

    pub async fn user(&self, email: &str, account_type: AccountType) -> User {
        self.store
            .create_user(NewUser {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                email: email.to_string(),
                password_hash: hash_password(PASSWORD).unwrap(),
                account_type,
                contact_number: None,
                image: "https://example.com/avatar.svg".to_string(),
            })
            .await
            .unwrap()
    }

    pub fn bearer(&self, user: &User) -> (&'static str, String) {
        (
            "Authorization",
            format!("Bearer {}", generate_token(user, JWT_SECRET).unwrap()),
        )
    }

    pub async fn course(&self, instructor: &User, price: i64) -> Course {
        let category = self
            .store
            .create_category(&CategoryInput {
                name: format!("Category {}", Uuid::new_v4().simple()),
                description: "Programming".to_string(),
            })
            .await
            .unwrap();
        self.store
            .create_course(
                instructor.id,
                &CourseInput {
                    name: "Async Rust".to_string(),
                    description: "Futures and executors".to_string(),
                    what_you_will_learn: "Write async services".to_string(),
                    price,
                    tags: vec!["rust".to_string()],
                    instructions: vec![],
                    thumbnail: "https://example.com/thumb.png".to_string(),
                    category_id: category.id,
                    status: None,
                },
            )
            .await
            .unwrap()
    }
}

/// Logs in through the API and returns the issued JWT.
pub async fn login(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    password: &str,
) -> Result<String, String> {
    let req = actix_web::test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({ "email": email, "password": password }))
        .to_request();
    let resp = actix_web::test::call_service(app, req).await;
    let status = resp.status();
    let body = actix_web::test::read_body(resp).await;
    if !status.is_success() {
        return Err(format!(
            "Login failed. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    let body: serde_json::Value =
        serde_json::from_slice(&body).map_err(|e| format!("Unreadable login response: {}", e))?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| "Login response has no token".to_string())
}

/// Builds the full application around `$state`, as `main` does.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .service(coursehub::routes::health::health)
                .service(
                    actix_web::web::scope("/api")
                        .wrap(coursehub::auth::AuthMiddleware)
                        .configure(coursehub::routes::config),
                ),
        )
        .await
    };
}
