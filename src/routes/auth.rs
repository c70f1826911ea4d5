use crate::{
    auth::{
        middleware::TOKEN_COOKIE, AuthenticatedUser, ChangePasswordRequest, LoginRequest,
        ResetPasswordRequest, ResetPasswordTokenRequest, SendOtpRequest, SignupRequest,
    },
    error::AppError,
    routes::{created, done, ApiResponse},
    services::accounts,
    state::AppState,
};
use actix_web::{
    cookie::{time::Duration, Cookie},
    post, web, HttpResponse, Responder,
};

/// Days the login cookie stays valid.
const COOKIE_TTL_DAYS: i64 = 3;

/// Mails a signup code to an address that is not registered yet.
#[post("/sendotp")]
pub async fn send_otp(
    state: web::Data<AppState>,
    body: web::Json<SendOtpRequest>,
) -> Result<impl Responder, AppError> {
    accounts::send_otp(state.store.as_ref(), state.notifier.as_ref(), &body).await?;
    Ok(done("OTP sent successfully"))
}

/// Register a new user
///
/// Requires the latest OTP mailed to the address.
#[post("/signup")]
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    let user = accounts::signup(state.store.as_ref(), &body).await?;
    Ok(created("User registered successfully", user))
}

/// Login user
///
/// Returns the JWT in the body and also sets it as an HTTP-only cookie.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let auth = accounts::login(state.store.as_ref(), &state.jwt_secret, &body).await?;
    let cookie = Cookie::build(TOKEN_COOKIE, auth.token.clone())
        .http_only(true)
        .path("/")
        .max_age(Duration::days(COOKIE_TTL_DAYS))
        .finish();

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(ApiResponse::new("User login success", auth)))
}

#[post("/change-password")]
pub async fn change_password(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, AppError> {
    accounts::change_password(state.store.as_ref(), state.notifier.as_ref(), &user, &body)
        .await?;
    Ok(done("Password updated successfully"))
}

#[post("/reset-password-token")]
pub async fn reset_password_token(
    state: web::Data<AppState>,
    body: web::Json<ResetPasswordTokenRequest>,
) -> Result<impl Responder, AppError> {
    accounts::reset_password_token(
        state.store.as_ref(),
        state.notifier.as_ref(),
        &state.frontend_url,
        &body,
    )
    .await?;
    Ok(done(
        "Email sent successfully, please check your email to continue further",
    ))
}

#[post("/reset-password")]
pub async fn reset_password(
    state: web::Data<AppState>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, AppError> {
    accounts::reset_password(state.store.as_ref(), &body).await?;
    Ok(done("Password reset successful"))
}
