use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::CategoryInput,
    routes::{created, ok},
    services::catalog,
    state::AppState,
};
use actix_web::{get, post, web, Responder};
use uuid::Uuid;

#[get("")]
pub async fn list_categories(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let categories = catalog::list_categories(state.store.as_ref()).await?;
    Ok(ok("All categories returned successfully", categories))
}

/// Admin only.
#[post("")]
pub async fn create_category(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CategoryInput>,
) -> Result<impl Responder, AppError> {
    let category = catalog::create_category(state.store.as_ref(), &user, &body).await?;
    Ok(created("Category created successfully", category))
}

/// Published courses of the category together with the best sellers overall.
#[get("/{id}")]
pub async fn category_page(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let page = catalog::category_page(state.store.as_ref(), path.into_inner()).await?;
    Ok(ok("Category page fetched successfully", page))
}
