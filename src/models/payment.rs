use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Asks the gateway for an order covering the listed courses.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CapturePaymentRequest {
    #[validate(length(min = 1, message = "Please provide at least one course id"))]
    pub courses: Vec<Uuid>,
}

/// Gateway callback data forwarded by the client after checkout.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1))]
    pub razorpay_order_id: String,
    #[validate(length(min = 1))]
    pub razorpay_payment_id: String,
    #[validate(length(min = 1))]
    pub razorpay_signature: String,
    #[validate(length(min = 1, message = "Please provide at least one course id"))]
    pub courses: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentSuccessEmailRequest {
    #[validate(length(min = 1))]
    pub order_id: String,
    #[validate(length(min = 1))]
    pub payment_id: String,
    /// Amount paid in minor currency units.
    #[validate(range(min = 1))]
    pub amount: i64,
}
