use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{Category, SectionDetails, User};

/// Publication state of a course.
/// Corresponds to the `course_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "course_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    /// Visible to its instructor only.
    #[default]
    Draft,
    /// Listed on category pages.
    Published,
}

/// A course row. Sections, enrolled students and ratings live in their own tables.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub what_you_will_learn: String,
    /// Price in whole currency units.
    pub price: i64,
    pub tags: Vec<String>,
    pub instructions: Vec<String>,
    pub thumbnail: String,
    pub status: CourseStatus,
    pub instructor_id: Uuid,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a course.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CourseInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(length(min = 1, max = 5000))]
    pub what_you_will_learn: String,
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(length(min = 1))]
    pub tags: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[validate(url)]
    pub thumbnail: String,
    pub category_id: Uuid,
    pub status: Option<CourseStatus>,
}

/// Allow-listed course fields an instructor may edit.
/// Only the fields present in the request are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CourseUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub what_you_will_learn: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    #[validate(length(min = 1))]
    pub tags: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    #[validate(url)]
    pub thumbnail: Option<String>,
    pub category_id: Option<Uuid>,
    pub status: Option<CourseStatus>,
}

impl CourseUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.what_you_will_learn.is_none()
            && self.price.is_none()
            && self.tags.is_none()
            && self.instructions.is_none()
            && self.thumbnail.is_none()
            && self.category_id.is_none()
            && self.status.is_none()
    }

    /// Applies the present fields onto `course`.
    pub fn apply_to(&self, course: &mut Course) {
        if let Some(name) = &self.name {
            course.name = name.clone();
        }
        if let Some(description) = &self.description {
            course.description = description.clone();
        }
        if let Some(learn) = &self.what_you_will_learn {
            course.what_you_will_learn = learn.clone();
        }
        if let Some(price) = self.price {
            course.price = price;
        }
        if let Some(tags) = &self.tags {
            course.tags = tags.clone();
        }
        if let Some(instructions) = &self.instructions {
            course.instructions = instructions.clone();
        }
        if let Some(thumbnail) = &self.thumbnail {
            course.thumbnail = thumbnail.clone();
        }
        if let Some(category_id) = self.category_id {
            course.category_id = category_id;
        }
        if let Some(status) = self.status {
            course.status = status;
        }
    }
}

/// Public view of a course's instructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub image: String,
}

impl From<&User> for InstructorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
        }
    }
}

/// A course with its full content tree, as returned by the details endpoint.
#[derive(Debug, Serialize)]
pub struct CourseDetails {
    #[serde(flatten)]
    pub course: Course,
    pub instructor: Option<InstructorSummary>,
    pub category: Option<Category>,
    pub sections: Vec<SectionDetails>,
    pub students_enrolled: Vec<Uuid>,
    pub total_duration: String,
}
