use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::notify::{course_enrollment_email, Notifier};
use crate::store::{EnrollOutcome, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Enrolled,
    AlreadyEnrolled,
    NotFound,
}

/// Outcome for one course of a batch enrollment.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentResult {
    pub course_id: Uuid,
    pub status: EnrollmentStatus,
    pub progress_id: Option<Uuid>,
    pub message: String,
}

/// Enrolls `user_id` in each course, one course at a time.
///
/// The batch is best-effort: an unknown course or an existing enrollment is
/// recorded in its result and the loop moves on, so a partial failure leaves the
/// earlier enrollments in place. Storage failures abort the batch. A failed
/// confirmation mail never undoes an enrollment.
pub async fn enroll_students(
    store: &dyn Store,
    notifier: &dyn Notifier,
    user_id: Uuid,
    course_ids: &[Uuid],
) -> Result<Vec<EnrollmentResult>, AppError> {
    if course_ids.is_empty() {
        return Err(AppError::ValidationError(
            "Please provide course ID and user ID".into(),
        ));
    }
    let student = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let mut results = Vec::with_capacity(course_ids.len());
    for &course_id in course_ids {
        let Some(course) = store.find_course(course_id).await? else {
            log::warn!("Enrollment of {} skipped: course {} not found", user_id, course_id);
            results.push(EnrollmentResult {
                course_id,
                status: EnrollmentStatus::NotFound,
                progress_id: None,
                message: "Course not found".into(),
            });
            continue;
        };

        let result = match store.enroll(course_id, user_id).await {
            Ok(EnrollOutcome::Enrolled(record)) => {
                log::info!("Enrolled user {} in course {}", user_id, course_id);
                let body = course_enrollment_email(&course.name, &student.full_name());
                let subject = format!("Successfully enrolled into {}", course.name);
                if let Err(e) = notifier.send(&student.email, &subject, &body).await {
                    log::warn!("Enrollment mail to {} failed: {}", student.email, e);
                }
                EnrollmentResult {
                    course_id,
                    status: EnrollmentStatus::Enrolled,
                    progress_id: Some(record.id),
                    message: "Enrolled".into(),
                }
            }
            Ok(EnrollOutcome::AlreadyEnrolled) => EnrollmentResult {
                course_id,
                status: EnrollmentStatus::AlreadyEnrolled,
                progress_id: None,
                message: "Student is already enrolled".into(),
            },
            // The course can vanish between the lookup and the insert.
            Err(AppError::NotFound(message)) => EnrollmentResult {
                course_id,
                status: EnrollmentStatus::NotFound,
                progress_id: None,
                message,
            },
            Err(e) => return Err(e),
        };
        results.push(result);
    }
    Ok(results)
}
