use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::RatingInput,
    routes::{created, ok},
    services::ratings,
    state::AppState,
};
use actix_web::{get, post, web, Responder};
use serde_json::json;
use uuid::Uuid;

/// All reviews, highest rating first.
#[get("")]
pub async fn list_reviews(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let reviews = ratings::all_reviews(state.store.as_ref()).await?;
    Ok(ok("All reviews fetched successfully", reviews))
}

#[post("")]
pub async fn create_rating(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<RatingInput>,
) -> Result<impl Responder, AppError> {
    let rating = ratings::create_rating(state.store.as_ref(), &user, &body).await?;
    Ok(created("Rating and review created successfully", rating))
}

#[get("/average/{course_id}")]
pub async fn average_rating(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let average = ratings::average_rating(state.store.as_ref(), path.into_inner()).await?;
    Ok(ok("Average rating fetched successfully", json!({ "average_rating": average })))
}
