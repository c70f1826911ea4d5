pub mod auth;
pub mod categories;
pub mod courses;
pub mod health;
pub mod payments;
pub mod profile;
pub mod progress;
pub mod ratings;

use actix_web::{web, HttpResponse};
use serde::Serialize;

/// Body of every successful API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// 200 with `data`.
pub fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::new(message, data))
}

/// 201 with `data`.
pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse::new(message, data))
}

/// 200 without a payload.
pub fn done(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::<()> {
        success: true,
        message: message.to_string(),
        data: None,
    })
}

/// Mounts every API route. Expected to be placed under `/api` and wrapped in
/// `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::send_otp)
            .service(auth::signup)
            .service(auth::login)
            .service(auth::change_password)
            .service(auth::reset_password_token)
            .service(auth::reset_password),
    )
    .service(
        web::scope("/profile")
            .service(profile::get_profile)
            .service(profile::update_profile)
            .service(profile::delete_profile)
            .service(profile::enrolled_courses)
            .service(profile::instructor_dashboard),
    )
    .service(
        web::scope("/categories")
            .service(categories::list_categories)
            .service(categories::create_category)
            .service(categories::category_page),
    )
    .service(
        web::scope("/courses")
            .service(courses::list_courses)
            .service(courses::create_course)
            .service(courses::get_course)
            .service(courses::edit_course)
            .service(courses::delete_course)
            .service(courses::create_section)
            .service(courses::update_section)
            .service(courses::delete_section)
            .service(courses::create_subsection)
            .service(courses::update_subsection)
            .service(courses::delete_subsection),
    )
    .service(
        web::scope("/ratings")
            .service(ratings::list_reviews)
            .service(ratings::create_rating)
            .service(ratings::average_rating),
    )
    .service(
        web::scope("/payments")
            .service(payments::capture_payment)
            .service(payments::verify_payment)
            .service(payments::send_payment_success_email),
    )
    .service(
        web::scope("/progress")
            .service(progress::update_progress)
            .service(progress::progress_percentage),
    );
}
