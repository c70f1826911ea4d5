use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{AccountType, ProgressQuery, ProgressUpdateRequest},
    routes::ok,
    services::progress,
    state::AppState,
};
use actix_web::{post, web, Responder};
use serde_json::json;

/// Marks a lecture as watched by the calling student.
#[post("/update")]
pub async fn update_progress(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<ProgressUpdateRequest>,
) -> Result<impl Responder, AppError> {
    user.require(AccountType::Student)?;
    let record = progress::mark_complete(
        state.store.as_ref(),
        body.course_id,
        body.subsection_id,
        user.id,
    )
    .await?;
    Ok(ok("Course progress updated", record))
}

#[post("/percentage")]
pub async fn progress_percentage(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<ProgressQuery>,
) -> Result<impl Responder, AppError> {
    let percentage =
        progress::get_percentage(state.store.as_ref(), body.course_id, user.id).await?;
    Ok(ok(
        "Course progress fetched",
        json!({ "progress_percentage": percentage }),
    ))
}
