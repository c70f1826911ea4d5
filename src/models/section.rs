use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::Subsection;

/// A chapter of a course. Owned by exactly one course.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Section {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    /// 1-based position within the course.
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SectionInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

/// A section with its ordered subsections.
#[derive(Debug, Clone, Serialize)]
pub struct SectionDetails {
    #[serde(flatten)]
    pub section: Section,
    pub subsections: Vec<Subsection>,
}
