use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{EnrollOutcome, Store, StoreResult};
use crate::error::AppError;
use crate::models::otp::OTP_TTL_MINUTES;
use crate::models::{
    Category, CategoryInput, Course, CourseInput, CourseStatus, CourseUpdate, NewUser, Otp,
    ProfileUpdate, ProgressRecord, Rating, RatingInput, Review, Section, SectionDetails,
    Subsection, SubsectionInput, SubsectionUpdate, User,
};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, account_type, \
     contact_number, gender, date_of_birth, about, image, reset_token, reset_token_expires, created_at";

const COURSE_COLUMNS: &str = "id, name, description, what_you_will_learn, price, tags, \
     instructions, thumbnail, status, instructor_id, category_id, created_at, updated_at";

const SUBSECTION_COLUMNS: &str =
    "id, section_id, title, description, duration_seconds, video_url, position";

#[derive(FromRow)]
struct ProgressRow {
    id: Uuid,
    course_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

/// Replaces the driver's unique-violation text with a message fit for clients.
fn conflict_as(message: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |error| match AppError::from(error) {
        AppError::Conflict(_) => AppError::Conflict(message.into()),
        other => other,
    }
}

/// `Store` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations in `migrations/`.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn completed_videos(&self, progress_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT subsection_id FROM completed_subsections WHERE progress_id = $1 ORDER BY completed_at",
        )
        .bind(progress_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, first_name, last_name, email, password_hash, account_type, contact_number, image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(new_user.account_type)
            .bind(&new_user.contact_number)
            .bind(&new_user.image)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_as("Email already registered"))?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<User> {
        let sql = format!(
            "UPDATE users SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                gender = COALESCE($4, gender), \
                date_of_birth = COALESCE($5, date_of_birth), \
                about = COALESCE($6, about), \
                contact_number = COALESCE($7, contact_number) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&update.first_name)
            .bind(&update.last_name)
            .bind(&update.gender)
            .bind(update.date_of_birth)
            .bind(&update.about)
            .bind(&update.contact_number)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: Option<&str>,
        expires: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE users SET reset_token = $2, reset_token_expires = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expires)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }

    async fn find_user_by_reset_token(&self, token: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM course_progress WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM enrollments WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM ratings WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn enrolled_course_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(sqlx::query_scalar::<_, Uuid>(
            "SELECT course_id FROM enrollments WHERE user_id = $1 ORDER BY enrolled_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn progress_record_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM course_progress WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_otp(&self, email: &str, code: &str) -> StoreResult<Otp> {
        let cutoff = Utc::now() - Duration::minutes(OTP_TTL_MINUTES);
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM otps WHERE created_at <= $1")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?;
        let otp = sqlx::query_as::<_, Otp>(
            "INSERT INTO otps (id, email, code) VALUES ($1, $2, $3) \
             RETURNING id, email, code, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(code)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_as("OTP code already in use"))?;
        tx.commit().await?;
        Ok(otp)
    }

    async fn latest_otp(&self, email: &str) -> StoreResult<Option<Otp>> {
        Ok(sqlx::query_as::<_, Otp>(
            "SELECT id, email, code, created_at FROM otps WHERE email = $1 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_otps(&self, email: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM otps WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_category(&self, input: &CategoryInput) -> StoreResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, description) VALUES ($1, $2, $3) \
             RETURNING id, name, description",
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_as("Category already exists"))?;
        Ok(category)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(
            sqlx::query_as::<_, Category>("SELECT id, name, description FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(
            sqlx::query_as::<_, Category>("SELECT id, name, description FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create_course(&self, instructor_id: Uuid, input: &CourseInput) -> StoreResult<Course> {
        let sql = format!(
            "INSERT INTO courses (id, name, description, what_you_will_learn, price, tags, instructions, \
             thumbnail, status, instructor_id, category_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {COURSE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Course>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.what_you_will_learn)
            .bind(input.price)
            .bind(&input.tags)
            .bind(&input.instructions)
            .bind(&input.thumbnail)
            .bind(input.status.unwrap_or_default())
            .bind(instructor_id)
            .bind(input.category_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");
        Ok(sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_courses(&self) -> StoreResult<Vec<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at");
        Ok(sqlx::query_as::<_, Course>(&sql).fetch_all(&self.pool).await?)
    }

    async fn courses_by_category(
        &self,
        category_id: Uuid,
        status: Option<CourseStatus>,
    ) -> StoreResult<Vec<Course>> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses \
             WHERE category_id = $1 AND ($2::course_status IS NULL OR status = $2) \
             ORDER BY created_at"
        );
        Ok(sqlx::query_as::<_, Course>(&sql)
            .bind(category_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn courses_by_instructor(&self, instructor_id: Uuid) -> StoreResult<Vec<Course>> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE instructor_id = $1 ORDER BY created_at"
        );
        Ok(sqlx::query_as::<_, Course>(&sql)
            .bind(instructor_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_course(&self, id: Uuid, update: &CourseUpdate) -> StoreResult<Course> {
        let sql = format!(
            "UPDATE courses SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                what_you_will_learn = COALESCE($4, what_you_will_learn), \
                price = COALESCE($5, price), \
                tags = COALESCE($6, tags), \
                instructions = COALESCE($7, instructions), \
                thumbnail = COALESCE($8, thumbnail), \
                category_id = COALESCE($9, category_id), \
                status = COALESCE($10, status), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .bind(&update.name)
            .bind(&update.description)
            .bind(&update.what_you_will_learn)
            .bind(update.price)
            .bind(&update.tags)
            .bind(&update.instructions)
            .bind(&update.thumbnail)
            .bind(update.category_id)
            .bind(update.status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".into()))
    }

    async fn delete_course(&self, id: Uuid) -> StoreResult<Option<Vec<Uuid>>> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM courses WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        // Unenroll every student, then walk course -> sections -> subsections.
        let students = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM enrollments WHERE course_id = $1 RETURNING user_id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM course_progress WHERE course_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM ratings WHERE course_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "DELETE FROM subsections WHERE section_id IN (SELECT id FROM sections WHERE course_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM sections WHERE course_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(students))
    }

    async fn course_content(&self, course_id: Uuid) -> StoreResult<Vec<SectionDetails>> {
        let sections = sqlx::query_as::<_, Section>(
            "SELECT id, course_id, name, position FROM sections WHERE course_id = $1 ORDER BY position",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {SUBSECTION_COLUMNS} FROM subsections \
             WHERE section_id IN (SELECT id FROM sections WHERE course_id = $1) \
             ORDER BY position"
        );
        let subsections = sqlx::query_as::<_, Subsection>(&sql)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;

        let mut by_section: HashMap<Uuid, Vec<Subsection>> = HashMap::new();
        for subsection in subsections {
            by_section
                .entry(subsection.section_id)
                .or_default()
                .push(subsection);
        }
        Ok(sections
            .into_iter()
            .map(|section| SectionDetails {
                subsections: by_section.remove(&section.id).unwrap_or_default(),
                section,
            })
            .collect())
    }

    async fn enrolled_students(&self, course_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM enrollments WHERE course_id = $1 ORDER BY enrolled_at",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_section(&self, course_id: Uuid, name: &str) -> StoreResult<Section> {
        let mut tx = self.pool.begin().await?;
        // Row lock serialises concurrent appends to the same course.
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM courses WHERE id = $1 FOR UPDATE")
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".into()))?;

        let section = sqlx::query_as::<_, Section>(
            "INSERT INTO sections (id, course_id, name, position) \
             SELECT $1, $2, $3, COALESCE(MAX(position), 0) + 1 FROM sections WHERE course_id = $2 \
             RETURNING id, course_id, name, position",
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(section)
    }

    async fn find_section(&self, id: Uuid) -> StoreResult<Option<Section>> {
        Ok(sqlx::query_as::<_, Section>(
            "SELECT id, course_id, name, position FROM sections WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn rename_section(&self, id: Uuid, name: &str) -> StoreResult<Section> {
        sqlx::query_as::<_, Section>(
            "UPDATE sections SET name = $2 WHERE id = $1 RETURNING id, course_id, name, position",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Section not found".into()))
    }

    async fn delete_section(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM subsections WHERE section_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM sections WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn create_subsection(
        &self,
        section_id: Uuid,
        input: &SubsectionInput,
    ) -> StoreResult<Subsection> {
        let mut tx = self.pool.begin().await?;
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM sections WHERE id = $1 FOR UPDATE")
            .bind(section_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Section not found".into()))?;

        let sql = format!(
            "INSERT INTO subsections (id, section_id, title, description, duration_seconds, video_url, position) \
             SELECT $1, $2, $3, $4, $5, $6, COALESCE(MAX(position), 0) + 1 FROM subsections WHERE section_id = $2 \
             RETURNING {SUBSECTION_COLUMNS}"
        );
        let subsection = sqlx::query_as::<_, Subsection>(&sql)
            .bind(Uuid::new_v4())
            .bind(section_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.duration_seconds)
            .bind(&input.video_url)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(subsection)
    }

    async fn find_subsection(&self, id: Uuid) -> StoreResult<Option<Subsection>> {
        let sql = format!("SELECT {SUBSECTION_COLUMNS} FROM subsections WHERE id = $1");
        Ok(sqlx::query_as::<_, Subsection>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_subsection(
        &self,
        id: Uuid,
        update: &SubsectionUpdate,
    ) -> StoreResult<Subsection> {
        let sql = format!(
            "UPDATE subsections SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                duration_seconds = COALESCE($4, duration_seconds), \
                video_url = COALESCE($5, video_url) \
             WHERE id = $1 RETURNING {SUBSECTION_COLUMNS}"
        );
        sqlx::query_as::<_, Subsection>(&sql)
            .bind(id)
            .bind(&update.title)
            .bind(&update.description)
            .bind(update.duration_seconds)
            .bind(&update.video_url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Subsection not found".into()))
    }

    async fn delete_subsection(&self, id: Uuid) -> StoreResult<bool> {
        // completed_subsections rows go with it through ON DELETE CASCADE.
        let deleted = sqlx::query("DELETE FROM subsections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn enroll(&self, course_id: Uuid, user_id: Uuid) -> StoreResult<EnrollOutcome> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, Uuid>("SELECT id FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".into()))?;
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        // The primary key on (course_id, user_id) decides concurrent attempts.
        let inserted = sqlx::query(
            "INSERT INTO enrollments (course_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(course_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if inserted == 0 {
            tx.rollback().await?;
            return Ok(EnrollOutcome::AlreadyEnrolled);
        }

        sqlx::query(
            "INSERT INTO course_progress (id, course_id, user_id) VALUES ($1, $2, $3) \
             ON CONFLICT (course_id, user_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        let row = sqlx::query_as::<_, ProgressRow>(
            "SELECT id, course_id, user_id, created_at FROM course_progress \
             WHERE course_id = $1 AND user_id = $2",
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        let completed_videos = sqlx::query_scalar::<_, Uuid>(
            "SELECT subsection_id FROM completed_subsections WHERE progress_id = $1 ORDER BY completed_at",
        )
        .bind(row.id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(EnrollOutcome::Enrolled(ProgressRecord {
            id: row.id,
            course_id: row.course_id,
            user_id: row.user_id,
            completed_videos,
            created_at: row.created_at,
        }))
    }

    async fn is_enrolled(&self, course_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM enrollments WHERE course_id = $1 AND user_id = $2)",
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<ProgressRecord>> {
        let row = sqlx::query_as::<_, ProgressRow>(
            "SELECT id, course_id, user_id, created_at FROM course_progress \
             WHERE course_id = $1 AND user_id = $2",
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(ProgressRecord {
                completed_videos: self.completed_videos(row.id).await?,
                id: row.id,
                course_id: row.course_id,
                user_id: row.user_id,
                created_at: row.created_at,
            })),
            None => Ok(None),
        }
    }

    async fn add_completed(&self, progress_id: Uuid, subsection_id: Uuid) -> StoreResult<bool> {
        let inserted = sqlx::query(
            "INSERT INTO completed_subsections (progress_id, subsection_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(progress_id)
        .bind(subsection_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(inserted == 1)
    }

    async fn create_rating(&self, user_id: Uuid, input: &RatingInput) -> StoreResult<Rating> {
        let rating = sqlx::query_as::<_, Rating>(
            "INSERT INTO ratings (id, user_id, course_id, rating, review) VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, course_id, rating, review, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(input.course_id)
        .bind(input.rating)
        .bind(&input.review)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_as("Course is already reviewed by the user"))?;
        Ok(rating)
    }

    async fn average_rating(&self, course_id: Uuid) -> StoreResult<Option<f64>> {
        Ok(sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(rating)::FLOAT8 FROM ratings WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_reviews(&self) -> StoreResult<Vec<Review>> {
        Ok(sqlx::query_as::<_, Review>(
            "SELECT r.id, r.rating, r.review, c.id AS course_id, c.name AS course_name, \
                    u.id AS user_id, u.first_name, u.last_name, u.email, u.image \
             FROM ratings r \
             JOIN courses c ON c.id = r.course_id \
             JOIN users u ON u.id = r.user_id \
             ORDER BY r.rating DESC, r.created_at",
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
