pub mod extractors;
pub mod middleware;
pub mod otp;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{AccountType, User};

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

lazy_static! {
    // Person names: letters, spaces, apostrophes, dots and hyphens
    static ref NAME_REGEX: regex::Regex = regex::Regex::new(r"^[\p{L}][\p{L} .'-]*$").unwrap();
    // Six decimal digits
    static ref OTP_REGEX: regex::Regex = regex::Regex::new(r"^[0-9]{6}$").unwrap();
}

/// Payload for requesting a signup OTP.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(email)]
    pub email: String,
}

/// Payload for a new account. The OTP must be the latest one mailed to `email`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(
        length(min = 1, max = 50),
        regex(path = "NAME_REGEX", message = "First name contains invalid characters")
    )]
    pub first_name: String,
    #[validate(
        length(min = 1, max = 50),
        regex(path = "NAME_REGEX", message = "Last name contains invalid characters")
    )]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    /// Must be at least 6 characters long.
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    pub confirm_password: String,
    pub account_type: AccountType,
    #[validate(length(min = 5, max = 20))]
    pub contact_number: Option<String>,
    #[validate(regex(path = "OTP_REGEX", message = "OTP must be 6 digits"))]
    pub otp: String,
}

/// Payload for a login request.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub old_password: String,
    #[validate(length(min = 6, max = 128))]
    pub new_password: String,
    pub confirm_new_password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResetPasswordTokenRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    pub confirm_password: String,
}

/// Response after a successful login: the JWT and the account it belongs to.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}
