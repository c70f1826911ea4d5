use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{AccountType, Rating, RatingInput, Review};
use crate::store::Store;

/// Only enrolled students may review a course, once each.
pub async fn create_rating(
    store: &dyn Store,
    caller: &AuthenticatedUser,
    input: &RatingInput,
) -> Result<Rating, AppError> {
    caller.require(AccountType::Student)?;
    input.validate()?;
    store
        .find_course(input.course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".into()))?;
    if !store.is_enrolled(input.course_id, caller.id).await? {
        return Err(AppError::Forbidden(
            "Student is not enrolled in the course".into(),
        ));
    }

    let rating = store.create_rating(caller.id, input).await?;
    log::info!("User {} rated course {}", caller.id, input.course_id);
    Ok(rating)
}

/// Mean rating of the course, 0 when it has none.
pub async fn average_rating(store: &dyn Store, course_id: Uuid) -> Result<f64, AppError> {
    Ok(store.average_rating(course_id).await?.unwrap_or(0.0))
}

pub async fn all_reviews(store: &dyn Store) -> Result<Vec<Review>, AppError> {
    store.list_reviews().await
}
