use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::ProfileUpdate,
    routes::{done, ok},
    services::{accounts, dashboard},
    state::AppState,
};
use actix_web::{delete, get, put, web, Responder};

/// The caller's account with enrolled course and progress record ids.
#[get("")]
pub async fn get_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let details = accounts::user_details(state.store.as_ref(), user.id).await?;
    Ok(ok("User data fetched successfully", details))
}

#[put("")]
pub async fn update_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<ProfileUpdate>,
) -> Result<impl Responder, AppError> {
    let updated = accounts::update_profile(state.store.as_ref(), &user, &body).await?;
    Ok(ok("Profile updated successfully", updated))
}

#[delete("")]
pub async fn delete_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    accounts::delete_account(state.store.as_ref(), &user).await?;
    Ok(done("User deleted successfully"))
}

/// Student only.
#[get("/enrolled-courses")]
pub async fn enrolled_courses(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let courses = dashboard::enrolled_courses(state.store.as_ref(), &user).await?;
    Ok(ok("Enrolled courses fetched successfully", courses))
}

/// Instructor only.
#[get("/instructor-dashboard")]
pub async fn instructor_dashboard(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let stats = dashboard::instructor_dashboard(state.store.as_ref(), &user).await?;
    Ok(ok("Instructor dashboard fetched successfully", stats))
}
