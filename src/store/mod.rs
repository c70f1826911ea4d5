//! Persistence seam.
//!
//! Handlers and services never talk to a database directly; they receive an
//! `Arc<dyn Store>`. `PgStore` is the production implementation, `MemoryStore` keeps
//! everything in process and backs the test-suite.
//!
//! Operations that must not race (enrollment, marking a lecture complete, OTP and
//! rating insertion) are single store calls so each implementation can make them
//! atomic: `PgStore` through unique keys inside a transaction, `MemoryStore` by
//! holding its lock for the whole operation.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Category, CategoryInput, Course, CourseInput, CourseStatus, CourseUpdate, NewUser, Otp,
    ProfileUpdate, ProgressRecord, Rating, RatingInput, Review, Section, SectionDetails,
    Subsection, SubsectionInput, SubsectionUpdate, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, AppError>;

/// Result of an atomic enrollment attempt.
#[derive(Debug, Clone)]
pub enum EnrollOutcome {
    /// The student was added to the course and a fresh progress record was created.
    Enrolled(ProgressRecord),
    /// The (course, user) pair already existed; nothing was written.
    AlreadyEnrolled,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Round-trips to the backing database.
    async fn ping(&self) -> StoreResult<()>;

    // Users

    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<User>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;
    async fn set_reset_token(
        &self,
        id: Uuid,
        token: Option<&str>,
        expires: Option<DateTime<Utc>>,
    ) -> StoreResult<()>;
    async fn find_user_by_reset_token(&self, token: &str) -> StoreResult<Option<User>>;
    /// Deletes the user, their progress records, enrollments and ratings.
    /// Returns `false` if no such user existed.
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;
    async fn enrolled_course_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;
    async fn progress_record_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;

    // One-time passwords

    /// Drops expired codes, then stores the new one. Fails with `Conflict` when
    /// an unexpired code is already in use.
    async fn insert_otp(&self, email: &str, code: &str) -> StoreResult<Otp>;
    async fn latest_otp(&self, email: &str) -> StoreResult<Option<Otp>>;
    /// Frees every code issued to `email`.
    async fn delete_otps(&self, email: &str) -> StoreResult<()>;

    // Categories

    async fn create_category(&self, input: &CategoryInput) -> StoreResult<Category>;
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>>;

    // Courses

    async fn create_course(&self, instructor_id: Uuid, input: &CourseInput) -> StoreResult<Course>;
    async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>>;
    async fn list_courses(&self) -> StoreResult<Vec<Course>>;
    async fn courses_by_category(
        &self,
        category_id: Uuid,
        status: Option<CourseStatus>,
    ) -> StoreResult<Vec<Course>>;
    async fn courses_by_instructor(&self, instructor_id: Uuid) -> StoreResult<Vec<Course>>;
    async fn update_course(&self, id: Uuid, update: &CourseUpdate) -> StoreResult<Course>;
    /// Deletes the course with its sections, subsections, enrollments, progress records
    /// and ratings in one unit. Returns the ids of the students that were enrolled,
    /// or `None` if the course did not exist.
    async fn delete_course(&self, id: Uuid) -> StoreResult<Option<Vec<Uuid>>>;
    /// Ordered sections of a course, each with its ordered subsections.
    async fn course_content(&self, course_id: Uuid) -> StoreResult<Vec<SectionDetails>>;
    async fn enrolled_students(&self, course_id: Uuid) -> StoreResult<Vec<Uuid>>;

    // Sections

    /// Appends a section to the course. `NotFound` if the course does not exist.
    async fn create_section(&self, course_id: Uuid, name: &str) -> StoreResult<Section>;
    async fn find_section(&self, id: Uuid) -> StoreResult<Option<Section>>;
    async fn rename_section(&self, id: Uuid, name: &str) -> StoreResult<Section>;
    /// Deletes the section and its subsections.
    async fn delete_section(&self, id: Uuid) -> StoreResult<bool>;

    // Subsections

    /// Appends a lecture to the section. `NotFound` if the section does not exist.
    async fn create_subsection(
        &self,
        section_id: Uuid,
        input: &SubsectionInput,
    ) -> StoreResult<Subsection>;
    async fn find_subsection(&self, id: Uuid) -> StoreResult<Option<Subsection>>;
    async fn update_subsection(
        &self,
        id: Uuid,
        update: &SubsectionUpdate,
    ) -> StoreResult<Subsection>;
    /// Deletes the lecture and drops it from every progress record.
    async fn delete_subsection(&self, id: Uuid) -> StoreResult<bool>;

    // Enrollment and progress

    /// Atomically adds `user_id` to the course's enrolled set and creates its progress
    /// record. `NotFound` if the course or the user does not exist.
    async fn enroll(&self, course_id: Uuid, user_id: Uuid) -> StoreResult<EnrollOutcome>;
    async fn is_enrolled(&self, course_id: Uuid, user_id: Uuid) -> StoreResult<bool>;
    async fn find_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<ProgressRecord>>;
    /// Inserts the subsection into the record's completed set. Returns `false` if it
    /// was already there.
    async fn add_completed(&self, progress_id: Uuid, subsection_id: Uuid) -> StoreResult<bool>;

    // Ratings

    /// Fails with `Conflict` if the user already rated the course.
    async fn create_rating(&self, user_id: Uuid, input: &RatingInput) -> StoreResult<Rating>;
    async fn average_rating(&self, course_id: Uuid) -> StoreResult<Option<f64>>;
    /// All reviews, highest rating first.
    async fn list_reviews(&self) -> StoreResult<Vec<Review>>;
}
