use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{AccountType, Course, SectionDetails};
use crate::services::catalog::{format_duration, total_duration_seconds};
use crate::services::progress::completion_percentage;
use crate::store::Store;

/// A course on the student dashboard.
#[derive(Debug, Serialize)]
pub struct EnrolledCourse {
    #[serde(flatten)]
    pub course: Course,
    pub sections: Vec<SectionDetails>,
    pub total_duration: String,
    pub progress_percentage: f64,
}

/// Per-course figures on the instructor dashboard.
#[derive(Debug, Serialize, PartialEq)]
pub struct CourseStats {
    pub course_id: Uuid,
    pub course_name: String,
    pub course_description: String,
    pub total_students_enrolled: usize,
    /// Students × price, in whole currency units.
    pub total_amount_generated: i64,
}

pub async fn enrolled_courses(
    store: &dyn Store,
    caller: &AuthenticatedUser,
) -> Result<Vec<EnrolledCourse>, AppError> {
    caller.require(AccountType::Student)?;

    let mut courses = Vec::new();
    for course_id in store.enrolled_course_ids(caller.id).await? {
        let Some(course) = store.find_course(course_id).await? else {
            continue;
        };
        let sections = store.course_content(course_id).await?;
        let total: usize = sections.iter().map(|s| s.subsections.len()).sum();
        let completed = store
            .find_progress(course_id, caller.id)
            .await?
            .map_or(0, |record| record.completed_videos.len());

        courses.push(EnrolledCourse {
            total_duration: format_duration(total_duration_seconds(&sections)),
            progress_percentage: completion_percentage(completed, total),
            course,
            sections,
        });
    }
    Ok(courses)
}

pub async fn instructor_dashboard(
    store: &dyn Store,
    caller: &AuthenticatedUser,
) -> Result<Vec<CourseStats>, AppError> {
    caller.require(AccountType::Instructor)?;

    let mut stats = Vec::new();
    for course in store.courses_by_instructor(caller.id).await? {
        let students = store.enrolled_students(course.id).await?.len();
        stats.push(CourseStats {
            course_id: course.id,
            total_students_enrolled: students,
            total_amount_generated: course.price.saturating_mul(students as i64),
            course_name: course.name,
            course_description: course.description,
        });
    }
    Ok(stats)
}
