//! Payment capture and verification.
//!
//! The gateway creates orders; once the client completes checkout it forwards the
//! gateway's callback (`order_id`, `payment_id`, `signature`). The signature is an
//! HMAC-SHA256 over `order_id|payment_id` keyed with the shared secret, and only a
//! matching signature leads to enrollment.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{PaymentSuccessEmailRequest, VerifyPaymentRequest};
use crate::services::enrollment::{enroll_students, EnrollmentResult};
use crate::services::notify::{payment_success_email, Notifier};
use crate::store::Store;

type HmacSha256 = Hmac<Sha256>;

/// Recomputes and checks gateway callback signatures.
#[derive(Clone)]
pub struct PaymentVerifier {
    secret: Vec<u8>,
}

impl PaymentVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self, order_id: &str, payment_id: &str) -> Result<HmacSha256, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::InternalServerError(format!("Invalid HMAC key: {}", e)))?;
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        Ok(mac)
    }

    /// Lowercase hex HMAC-SHA256 of `order_id|payment_id`.
    pub fn expected_signature(&self, order_id: &str, payment_id: &str) -> Result<String, AppError> {
        let mac = self.mac(order_id, payment_id)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Constant-time check of a hex signature. Malformed hex never verifies.
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };
        match self.mac(order_id, payment_id) {
            Ok(mac) => mac.verify_slice(&signature).is_ok(),
            Err(_) => false,
        }
    }
}

/// An order as returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<Order, AppError>;
}

/// Razorpay Orders API client.
pub struct RazorpayGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(base_url: &str, key_id: &str, key_secret: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<Order, AppError> {
        let response = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": amount_minor,
                "currency": currency,
                "receipt": receipt,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Order creation failed with {}: {}", status, body);
            return Err(AppError::InternalServerError("Could not initiate order".into()));
        }
        Ok(response.json::<Order>().await?)
    }
}

/// Creates a gateway order for the total price of `course_ids`.
///
/// Every course must exist and the student must not already be enrolled in any of
/// them. Repeated ids are charged once.
pub async fn capture_payment(
    store: &dyn Store,
    gateway: &dyn PaymentGateway,
    currency: &str,
    user_id: Uuid,
    course_ids: &[Uuid],
) -> Result<Order, AppError> {
    if course_ids.is_empty() {
        return Err(AppError::ValidationError(
            "Please provide valid course ID".into(),
        ));
    }

    let mut seen = Vec::with_capacity(course_ids.len());
    let mut total: i64 = 0;
    for &course_id in course_ids {
        if seen.contains(&course_id) {
            continue;
        }
        seen.push(course_id);

        let course = store
            .find_course(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course {} not found", course_id)))?;
        if store.is_enrolled(course_id, user_id).await? {
            return Err(AppError::Conflict(format!(
                "Student is already enrolled in {}",
                course.name
            )));
        }
        total = total
            .checked_add(course.price)
            .ok_or_else(|| AppError::ValidationError("Order amount too large".into()))?;
    }

    let amount = total
        .checked_mul(100)
        .ok_or_else(|| AppError::ValidationError("Order amount too large".into()))?;
    if amount == 0 {
        return Err(AppError::ValidationError(
            "Order amount must be greater than zero".into(),
        ));
    }

    let receipt = format!("rcpt_{}", Uuid::new_v4().simple());
    let order = gateway.create_order(amount, currency, &receipt).await?;
    log::info!(
        "Created order {} of {} {} for user {}",
        order.id,
        amount,
        currency,
        user_id
    );
    Ok(order)
}

/// Checks the callback signature and, only if it matches, enrolls the caller in
/// every submitted course.
pub async fn verify_payment(
    store: &dyn Store,
    notifier: &dyn Notifier,
    verifier: &PaymentVerifier,
    user_id: Uuid,
    request: &VerifyPaymentRequest,
) -> Result<Vec<EnrollmentResult>, AppError> {
    request.validate()?;

    if !verifier.verify(
        &request.razorpay_order_id,
        &request.razorpay_payment_id,
        &request.razorpay_signature,
    ) {
        log::warn!(
            "Signature mismatch for order {} (user {})",
            request.razorpay_order_id,
            user_id
        );
        return Err(AppError::Unauthorized("Payment verification failed".into()));
    }

    enroll_students(store, notifier, user_id, &request.courses).await
}

pub async fn send_payment_success_email(
    store: &dyn Store,
    notifier: &dyn Notifier,
    user_id: Uuid,
    request: &PaymentSuccessEmailRequest,
) -> Result<(), AppError> {
    request.validate()?;
    let student = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let body = payment_success_email(
        &student.full_name(),
        request.amount as f64 / 100.0,
        &request.order_id,
        &request.payment_id,
    );
    notifier
        .send(&student.email, "Payment Successful", &body)
        .await
        .map_err(|e| {
            log::error!("Payment receipt to {} failed: {}", student.email, e);
            AppError::InternalServerError("Could not send email".into())
        })
}
