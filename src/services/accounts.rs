//! Signup, login and the password flows, plus profile maintenance.

use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::auth::otp::{generate_otp, generate_reset_token};
use crate::auth::{
    generate_token, hash_password, verify_password, AuthResponse, AuthenticatedUser,
    ChangePasswordRequest, LoginRequest, ResetPasswordRequest, ResetPasswordTokenRequest,
    SendOtpRequest, SignupRequest,
};
use crate::error::AppError;
use crate::models::{AccountType, NewUser, ProfileUpdate, User, UserDetails};
use crate::services::notify::{
    otp_email, password_updated_email, reset_password_email, Notifier,
};
use crate::store::Store;

/// Attempts at finding an unused OTP before giving up.
pub const MAX_OTP_ATTEMPTS: usize = 5;
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

fn default_avatar(first_name: &str, last_name: &str) -> String {
    format!(
        "https://api.dicebear.com/5.x/initials/svg?seed={}%20{}",
        first_name, last_name
    )
}

async fn issue_otp(
    store: &dyn Store,
    email: &str,
    mut generate: impl FnMut() -> String,
) -> Result<String, AppError> {
    for attempt in 1..=MAX_OTP_ATTEMPTS {
        let code = generate();
        match store.insert_otp(email, &code).await {
            Ok(otp) => return Ok(otp.code),
            Err(AppError::Conflict(_)) => {
                log::debug!("OTP collision on attempt {} for {}", attempt, email);
            }
            Err(e) => return Err(e),
        }
    }
    Err(AppError::InternalServerError(
        "Could not generate a unique OTP".into(),
    ))
}

/// Mails a fresh signup code to an unregistered address.
pub async fn send_otp(
    store: &dyn Store,
    notifier: &dyn Notifier,
    request: &SendOtpRequest,
) -> Result<(), AppError> {
    request.validate()?;
    if store.find_user_by_email(&request.email).await?.is_some() {
        return Err(AppError::Conflict("User is already registered".into()));
    }

    let code = issue_otp(store, &request.email, generate_otp).await?;
    notifier
        .send(&request.email, "Verification Email", &otp_email(&code))
        .await
        .map_err(|e| {
            log::error!("OTP mail to {} failed: {}", request.email, e);
            AppError::InternalServerError("Could not send verification email".into())
        })
}

pub async fn signup(store: &dyn Store, request: &SignupRequest) -> Result<User, AppError> {
    request.validate()?;
    if request.password != request.confirm_password {
        return Err(AppError::ValidationError(
            "Password and confirm password do not match".into(),
        ));
    }
    if request.account_type == AccountType::Admin {
        return Err(AppError::Forbidden(
            "Admin accounts cannot be created through signup".into(),
        ));
    }
    if store.find_user_by_email(&request.email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let otp = store
        .latest_otp(&request.email)
        .await?
        .ok_or_else(|| AppError::BadRequest("The OTP is not valid".into()))?;
    if otp.code != request.otp || otp.is_expired(Utc::now()) {
        return Err(AppError::BadRequest("The OTP is not valid".into()));
    }

    let user = store
        .create_user(NewUser {
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            email: request.email.clone(),
            password_hash: hash_password(&request.password)?,
            account_type: request.account_type,
            contact_number: request.contact_number.clone(),
            image: default_avatar(&request.first_name, &request.last_name),
        })
        .await?;
    store.delete_otps(&request.email).await?;
    log::info!("Registered {} account {}", user.account_type, user.id);
    Ok(user)
}

pub async fn login(
    store: &dyn Store,
    jwt_secret: &str,
    request: &LoginRequest,
) -> Result<AuthResponse, AppError> {
    request.validate()?;
    let user = store
        .find_user_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".into()))?;

    if !verify_password(&request.password, &user.password_hash)? {
        log::debug!("Password mismatch for {}", user.id);
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let token = generate_token(&user, jwt_secret)?;
    Ok(AuthResponse { token, user })
}

pub async fn change_password(
    store: &dyn Store,
    notifier: &dyn Notifier,
    caller: &AuthenticatedUser,
    request: &ChangePasswordRequest,
) -> Result<(), AppError> {
    request.validate()?;
    let user = store
        .find_user(caller.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if !verify_password(&request.old_password, &user.password_hash)? {
        return Err(AppError::Unauthorized("The password is incorrect".into()));
    }
    if request.new_password != request.confirm_new_password {
        return Err(AppError::ValidationError(
            "The password and confirm password do not match".into(),
        ));
    }

    store
        .update_password(user.id, &hash_password(&request.new_password)?)
        .await?;

    let body = password_updated_email(&user.email, &user.full_name());
    if let Err(e) = notifier
        .send(&user.email, "Password for your account has been updated", &body)
        .await
    {
        log::warn!("Password notice to {} failed: {}", user.email, e);
    }
    Ok(())
}

/// Stores a one-hour reset token and mails the link built from `frontend_url`.
pub async fn reset_password_token(
    store: &dyn Store,
    notifier: &dyn Notifier,
    frontend_url: &str,
    request: &ResetPasswordTokenRequest,
) -> Result<(), AppError> {
    request.validate()?;
    let user = store
        .find_user_by_email(&request.email)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "This email: {} is not registered with us",
                request.email
            ))
        })?;

    let token = generate_reset_token();
    let expires = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
    store.set_reset_token(user.id, Some(&token), Some(expires)).await?;

    let url = format!(
        "{}/update-password/{}",
        frontend_url.trim_end_matches('/'),
        token
    );
    notifier
        .send(&user.email, "Password Reset", &reset_password_email(&url))
        .await
        .map_err(|e| {
            log::error!("Reset link to {} failed: {}", user.email, e);
            AppError::InternalServerError("Could not send reset email".into())
        })
}

pub async fn reset_password(
    store: &dyn Store,
    request: &ResetPasswordRequest,
) -> Result<(), AppError> {
    request.validate()?;
    if request.password != request.confirm_password {
        return Err(AppError::ValidationError(
            "Password and confirm password do not match".into(),
        ));
    }

    let user = store
        .find_user_by_reset_token(&request.token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Token is invalid".into()))?;
    let expired = user
        .reset_token_expires
        .map_or(true, |expires| expires < Utc::now());
    if expired {
        return Err(AppError::Unauthorized(
            "Token is expired, please regenerate your token".into(),
        ));
    }

    store
        .update_password(user.id, &hash_password(&request.password)?)
        .await?;
    store.set_reset_token(user.id, None, None).await?;
    log::info!("Password reset for user {}", user.id);
    Ok(())
}

pub async fn user_details(store: &dyn Store, user_id: Uuid) -> Result<UserDetails, AppError> {
    let user = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let courses = store.enrolled_course_ids(user_id).await?;
    let course_progress = store.progress_record_ids(user_id).await?;
    Ok(UserDetails {
        user,
        courses,
        course_progress,
    })
}

pub async fn update_profile(
    store: &dyn Store,
    caller: &AuthenticatedUser,
    update: &ProfileUpdate,
) -> Result<User, AppError> {
    update.validate()?;
    store.update_profile(caller.id, update).await
}

/// Removes the account with its progress records, enrollments and ratings.
/// Instructors must delete their courses first.
pub async fn delete_account(store: &dyn Store, caller: &AuthenticatedUser) -> Result<(), AppError> {
    if caller.role == AccountType::Instructor
        && !store.courses_by_instructor(caller.id).await?.is_empty()
    {
        return Err(AppError::Conflict(
            "Delete your courses before deleting the account".into(),
        ));
    }
    if !store.delete_user(caller.id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    log::info!("Deleted account {}", caller.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_token;
    use crate::services::testing::{seed_course, RecordingNotifier};
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn signup_request(email: &str, otp: &str) -> SignupRequest {
        SignupRequest {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            confirm_password: "password123".to_string(),
            account_type: AccountType::Student,
            contact_number: None,
            otp: otp.to_string(),
        }
    }

    fn caller_of(user: &User) -> AuthenticatedUser {
        AuthenticatedUser {
            id: user.id,
            email: user.email.clone(),
            role: user.account_type,
        }
    }

    async fn registered(store: &MemoryStore, email: &str) -> User {
        store.insert_otp(email, "314159").await.unwrap();
        signup(store, &signup_request(email, "314159")).await.unwrap()
    }

    #[actix_rt::test]
    async fn test_otp_collision_is_retried() {
        let store = MemoryStore::new();
        store.insert_otp("first@example.com", "111111").await.unwrap();

        let mut candidates = vec!["111111", "111111", "222222"].into_iter();
        let code = issue_otp(&store, "second@example.com", || {
            candidates.next().unwrap().to_string()
        })
        .await
        .unwrap();
        assert_eq!(code, "222222");

        let err = issue_otp(&store, "third@example.com", || "111111".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));
    }

    #[actix_rt::test]
    async fn test_send_otp_mails_code_for_new_address_only() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::default();
        let request = SendOtpRequest {
            email: "new@example.com".to_string(),
        };

        send_otp(&store, &notifier, &request).await.unwrap();
        let otp = store.latest_otp("new@example.com").await.unwrap().unwrap();
        assert!(notifier.sent()[0].body.contains(&otp.code));

        registered(&store, "taken@example.com").await;
        let err = send_otp(
            &store,
            &notifier,
            &SendOtpRequest {
                email: "taken@example.com".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn test_signup_checks_otp() {
        let store = MemoryStore::new();

        let err = signup(&store, &signup_request("a@example.com", "123456"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        store.insert_otp("a@example.com", "123456").await.unwrap();
        let err = signup(&store, &signup_request("a@example.com", "654321"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let user = signup(&store, &signup_request("a@example.com", "123456"))
            .await
            .unwrap();
        assert_eq!(user.account_type, AccountType::Student);
        assert!(user.image.contains("dicebear"));
        assert_ne!(user.password_hash, "password123");

        let err = signup(&store, &signup_request("a@example.com", "123456"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn test_spent_otp_can_be_issued_again() {
        let store = MemoryStore::new();
        store.insert_otp("a@example.com", "123456").await.unwrap();
        signup(&store, &signup_request("a@example.com", "123456"))
            .await
            .unwrap();

        assert!(store.latest_otp("a@example.com").await.unwrap().is_none());
        store.insert_otp("b@example.com", "123456").await.unwrap();
        let user = signup(&store, &signup_request("b@example.com", "123456"))
            .await
            .unwrap();
        assert_eq!(user.email, "b@example.com");
    }

    #[actix_rt::test]
    async fn test_signup_refuses_admin_accounts() {
        let store = MemoryStore::new();
        store.insert_otp("a@example.com", "123456").await.unwrap();
        let request = SignupRequest {
            account_type: AccountType::Admin,
            ..signup_request("a@example.com", "123456")
        };

        let err = signup(&store, &request).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(store.find_user_by_email("a@example.com").await.unwrap().is_none());

        let request = SignupRequest {
            account_type: AccountType::Instructor,
            ..signup_request("a@example.com", "123456")
        };
        let user = signup(&store, &request).await.unwrap();
        assert_eq!(user.account_type, AccountType::Instructor);
    }

    #[actix_rt::test]
    async fn test_signup_rejects_password_mismatch() {
        let store = MemoryStore::new();
        store.insert_otp("a@example.com", "123456").await.unwrap();
        let request = SignupRequest {
            confirm_password: "different1".to_string(),
            ..signup_request("a@example.com", "123456")
        };
        let err = signup(&store, &request).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[actix_rt::test]
    async fn test_login_issues_token() {
        let store = MemoryStore::new();
        let user = registered(&store, "a@example.com").await;

        let response = login(
            &store,
            "secret",
            &LoginRequest {
                email: "a@example.com".to_string(),
                password: "password123".to_string(),
            },
        )
        .await
        .unwrap();
        let claims = verify_token(&response.token, "secret").unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, AccountType::Student);

        let err = login(
            &store,
            "secret",
            &LoginRequest {
                email: "a@example.com".to_string(),
                password: "wrong-password".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[actix_rt::test]
    async fn test_change_password() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::default();
        let user = registered(&store, "a@example.com").await;
        let caller = caller_of(&user);

        let wrong_old = ChangePasswordRequest {
            old_password: "nope".to_string(),
            new_password: "new-password".to_string(),
            confirm_new_password: "new-password".to_string(),
        };
        let err = change_password(&store, &notifier, &caller, &wrong_old)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let request = ChangePasswordRequest {
            old_password: "password123".to_string(),
            ..wrong_old
        };
        change_password(&store, &notifier, &caller, &request)
            .await
            .unwrap();

        let stored = store.find_user(user.id).await.unwrap().unwrap();
        assert!(verify_password("new-password", &stored.password_hash).unwrap());
        assert_eq!(notifier.sent().len(), 1);
    }

    #[actix_rt::test]
    async fn test_reset_password_flow() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::default();
        let user = registered(&store, "a@example.com").await;

        reset_password_token(
            &store,
            &notifier,
            "http://localhost:3000/",
            &ResetPasswordTokenRequest {
                email: "a@example.com".to_string(),
            },
        )
        .await
        .unwrap();
        let stored = store.find_user(user.id).await.unwrap().unwrap();
        let token = stored.reset_token.unwrap();
        assert!(notifier.sent()[0]
            .body
            .contains(&format!("http://localhost:3000/update-password/{}", token)));

        let err = reset_password(
            &store,
            &ResetPasswordRequest {
                token: "unknown".to_string(),
                password: "brand-new".to_string(),
                confirm_password: "brand-new".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        reset_password(
            &store,
            &ResetPasswordRequest {
                token: token.clone(),
                password: "brand-new".to_string(),
                confirm_password: "brand-new".to_string(),
            },
        )
        .await
        .unwrap();
        let stored = store.find_user(user.id).await.unwrap().unwrap();
        assert!(verify_password("brand-new", &stored.password_hash).unwrap());
        assert!(stored.reset_token.is_none());
    }

    #[actix_rt::test]
    async fn test_expired_reset_token_is_rejected() {
        let store = MemoryStore::new();
        let user = registered(&store, "a@example.com").await;
        store
            .set_reset_token(user.id, Some("stale"), Some(Utc::now() - Duration::minutes(1)))
            .await
            .unwrap();

        let err = reset_password(
            &store,
            &ResetPasswordRequest {
                token: "stale".to_string(),
                password: "brand-new".to_string(),
                confirm_password: "brand-new".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            AppError::Unauthorized("Token is expired, please regenerate your token".into())
        );
    }

    #[actix_rt::test]
    async fn test_delete_account_cascades() {
        let store = MemoryStore::new();
        let user = registered(&store, "a@example.com").await;
        let course = seed_course(&store, 100).await;
        store.enroll(course.id, user.id).await.unwrap();

        let details = user_details(&store, user.id).await.unwrap();
        assert_eq!(details.courses, vec![course.id]);
        assert_eq!(details.course_progress.len(), 1);

        delete_account(&store, &caller_of(&user)).await.unwrap();
        assert!(store.find_user(user.id).await.unwrap().is_none());
        assert!(store.enrolled_students(course.id).await.unwrap().is_empty());
        assert!(store.find_progress(course.id, user.id).await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_instructor_with_courses_cannot_delete_account() {
        let store = MemoryStore::new();
        let course = seed_course(&store, 100).await;
        let instructor = store.find_user(course.instructor_id).await.unwrap().unwrap();

        let err = delete_account(&store, &caller_of(&instructor))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
