use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{AccountType, CapturePaymentRequest, PaymentSuccessEmailRequest, VerifyPaymentRequest},
    routes::{done, ok},
    services::payment,
    state::AppState,
};
use actix_web::{post, web, Responder};
use validator::Validate;

/// Opens a gateway order for the listed courses.
#[post("/capture")]
pub async fn capture_payment(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CapturePaymentRequest>,
) -> Result<impl Responder, AppError> {
    user.require(AccountType::Student)?;
    body.validate()?;
    let order = payment::capture_payment(
        state.store.as_ref(),
        state.gateway.as_ref(),
        &state.currency,
        user.id,
        &body.courses,
    )
    .await?;
    Ok(ok("Order created successfully", order))
}

/// Checks the gateway callback signature and enrolls the caller.
///
/// ## Responses:
/// - `200 OK`: one result per submitted course.
/// - `401 Unauthorized`: the signature does not match; nothing was enrolled.
#[post("/verify")]
pub async fn verify_payment(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<VerifyPaymentRequest>,
) -> Result<impl Responder, AppError> {
    user.require(AccountType::Student)?;
    let results = payment::verify_payment(
        state.store.as_ref(),
        state.notifier.as_ref(),
        &state.verifier,
        user.id,
        &body,
    )
    .await?;
    Ok(ok("Payment verified", results))
}

#[post("/success-email")]
pub async fn send_payment_success_email(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<PaymentSuccessEmailRequest>,
) -> Result<impl Responder, AppError> {
    user.require(AccountType::Student)?;
    payment::send_payment_success_email(
        state.store.as_ref(),
        state.notifier.as_ref(),
        user.id,
        &body,
    )
    .await?;
    Ok(done("Payment success email sent"))
}
