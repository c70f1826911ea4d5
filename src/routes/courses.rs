use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CourseInput, CourseUpdate, SectionInput, SubsectionInput, SubsectionUpdate},
    routes::{created, ok},
    services::catalog,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, Responder};
use serde_json::json;
use uuid::Uuid;

/// Retrieves every course.
#[get("")]
pub async fn list_courses(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let courses = catalog::list_courses(state.store.as_ref()).await?;
    Ok(ok("All courses fetched successfully", courses))
}

/// Creates a course owned by the calling instructor.
///
/// ## Responses:
/// - `201 Created`: the new course, in `draft` unless a status was given.
/// - `403 Forbidden`: the caller is not an instructor.
/// - `404 Not Found`: the category does not exist.
/// - `422 Unprocessable Entity`: validation failed.
#[post("")]
pub async fn create_course(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CourseInput>,
) -> Result<impl Responder, AppError> {
    let course = catalog::create_course(state.store.as_ref(), &user, &body).await?;
    Ok(created("Course created successfully", course))
}

/// Course with instructor, category, ordered content and total duration.
#[get("/{id}")]
pub async fn get_course(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let details = catalog::course_details(state.store.as_ref(), path.into_inner()).await?;
    Ok(ok("Course details fetched successfully", details))
}

#[put("/{id}")]
pub async fn edit_course(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<CourseUpdate>,
) -> Result<impl Responder, AppError> {
    let details =
        catalog::edit_course(state.store.as_ref(), &user, path.into_inner(), &body).await?;
    Ok(ok("Course updated successfully", details))
}

/// Deletes a course with its content, enrollments, progress and ratings.
///
/// ## Responses:
/// - `200 OK`: `data.unenrolled_students` lists the students that lost access.
/// - `403 Forbidden`: the caller does not own the course.
/// - `404 Not Found`: no such course.
#[delete("/{id}")]
pub async fn delete_course(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let unenrolled = catalog::delete_course(state.store.as_ref(), &user, path.into_inner()).await?;
    Ok(ok(
        "Course deleted successfully",
        json!({ "unenrolled_students": unenrolled }),
    ))
}

#[post("/{id}/sections")]
pub async fn create_section(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<SectionInput>,
) -> Result<impl Responder, AppError> {
    let content =
        catalog::add_section(state.store.as_ref(), &user, path.into_inner(), &body).await?;
    Ok(created("Section created successfully", content))
}

#[put("/{id}/sections/{section_id}")]
pub async fn update_section(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<SectionInput>,
) -> Result<impl Responder, AppError> {
    let (course_id, section_id) = path.into_inner();
    let content =
        catalog::rename_section(state.store.as_ref(), &user, course_id, section_id, &body)
            .await?;
    Ok(ok("Section updated successfully", content))
}

#[delete("/{id}/sections/{section_id}")]
pub async fn delete_section(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<impl Responder, AppError> {
    let (course_id, section_id) = path.into_inner();
    let content =
        catalog::delete_section(state.store.as_ref(), &user, course_id, section_id).await?;
    Ok(ok("Section deleted successfully", content))
}

#[post("/{id}/sections/{section_id}/subsections")]
pub async fn create_subsection(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<SubsectionInput>,
) -> Result<impl Responder, AppError> {
    let (course_id, section_id) = path.into_inner();
    let content =
        catalog::add_subsection(state.store.as_ref(), &user, course_id, section_id, &body)
            .await?;
    Ok(created("SubSection created successfully", content))
}

#[put("/{id}/sections/{section_id}/subsections/{sub_id}")]
pub async fn update_subsection(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid, Uuid)>,
    body: web::Json<SubsectionUpdate>,
) -> Result<impl Responder, AppError> {
    let (course_id, section_id, sub_id) = path.into_inner();
    let content = catalog::update_subsection(
        state.store.as_ref(),
        &user,
        course_id,
        section_id,
        sub_id,
        &body,
    )
    .await?;
    Ok(ok("SubSection updated successfully", content))
}

#[delete("/{id}/sections/{section_id}/subsections/{sub_id}")]
pub async fn delete_subsection(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl Responder, AppError> {
    let (course_id, section_id, sub_id) = path.into_inner();
    let content =
        catalog::delete_subsection(state.store.as_ref(), &user, course_id, section_id, sub_id)
            .await?;
    Ok(ok("SubSection deleted successfully", content))
}
