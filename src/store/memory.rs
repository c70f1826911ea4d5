use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{EnrollOutcome, Store, StoreResult};
use crate::error::AppError;
use crate::models::{
    Category, CategoryInput, Course, CourseInput, CourseStatus, CourseUpdate, NewUser, Otp,
    ProfileUpdate, ProgressRecord, Rating, RatingInput, Review, Section, SectionDetails,
    Subsection, SubsectionInput, SubsectionUpdate, User,
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    otps: Vec<Otp>,
    categories: Vec<Category>,
    courses: Vec<Course>,
    sections: HashMap<Uuid, Section>,
    subsections: HashMap<Uuid, Subsection>,
    /// (course_id, user_id) pairs in enrollment order.
    enrollments: Vec<(Uuid, Uuid)>,
    progress: HashMap<Uuid, ProgressRecord>,
    ratings: Vec<Rating>,
}

impl State {
    fn course_mut(&mut self, id: Uuid) -> Option<&mut Course> {
        self.courses.iter_mut().find(|c| c.id == id)
    }

    fn sections_of(&self, course_id: Uuid) -> Vec<Section> {
        let mut sections: Vec<Section> = self
            .sections
            .values()
            .filter(|s| s.course_id == course_id)
            .cloned()
            .collect();
        sections.sort_by_key(|s| s.position);
        sections
    }

    fn subsections_of(&self, section_id: Uuid) -> Vec<Subsection> {
        let mut subsections: Vec<Subsection> = self
            .subsections
            .values()
            .filter(|s| s.section_id == section_id)
            .cloned()
            .collect();
        subsections.sort_by_key(|s| s.position);
        subsections
    }

    fn remove_subsection(&mut self, id: Uuid) -> bool {
        if self.subsections.remove(&id).is_none() {
            return false;
        }
        for record in self.progress.values_mut() {
            record.completed_videos.retain(|done| *done != id);
        }
        true
    }

    fn remove_section(&mut self, id: Uuid) -> bool {
        if self.sections.remove(&id).is_none() {
            return false;
        }
        let children: Vec<Uuid> = self
            .subsections
            .values()
            .filter(|s| s.section_id == id)
            .map(|s| s.id)
            .collect();
        for child in children {
            self.remove_subsection(child);
        }
        true
    }
}

/// In-process `Store` holding all records behind one mutex.
///
/// Every trait method takes the lock once, so each call is atomic with respect to
/// every other call.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut state = self.state.lock();
        if state.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            account_type: new_user.account_type,
            contact_number: new_user.contact_number,
            gender: None,
            date_of_birth: None,
            about: None,
            image: new_user.image,
            reset_token: None,
            reset_token_expires: None,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.lock().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.lock();
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> StoreResult<User> {
        let mut state = self.state.lock();
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if let Some(first_name) = &update.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &update.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(gender) = &update.gender {
            user.gender = Some(gender.clone());
        }
        if let Some(dob) = update.date_of_birth {
            user.date_of_birth = Some(dob);
        }
        if let Some(about) = &update.about {
            user.about = Some(about.clone());
        }
        if let Some(contact) = &update.contact_number {
            user.contact_number = Some(contact.clone());
        }
        Ok(user.clone())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut state = self.state.lock();
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: Option<&str>,
        expires: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let mut state = self.state.lock();
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        user.reset_token = token.map(str::to_string);
        user.reset_token_expires = expires;
        Ok(())
    }

    async fn find_user_by_reset_token(&self, token: &str) -> StoreResult<Option<User>> {
        let state = self.state.lock();
        Ok(state
            .users
            .values()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock();
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.progress.retain(|_, record| record.user_id != id);
        state.enrollments.retain(|(_, user_id)| *user_id != id);
        state.ratings.retain(|r| r.user_id != id);
        Ok(true)
    }

    async fn enrolled_course_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let state = self.state.lock();
        Ok(state
            .enrollments
            .iter()
            .filter(|(_, u)| *u == user_id)
            .map(|(c, _)| *c)
            .collect())
    }

    async fn progress_record_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let state = self.state.lock();
        let mut records: Vec<&ProgressRecord> = state
            .progress
            .values()
            .filter(|r| r.user_id == user_id)
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records.into_iter().map(|r| r.id).collect())
    }

    async fn insert_otp(&self, email: &str, code: &str) -> StoreResult<Otp> {
        let mut state = self.state.lock();
        let now = Utc::now();
        state.otps.retain(|o| !o.is_expired(now));
        if state.otps.iter().any(|o| o.code == code) {
            return Err(AppError::Conflict("OTP code already in use".into()));
        }
        let otp = Otp {
            id: Uuid::new_v4(),
            email: email.to_string(),
            code: code.to_string(),
            created_at: now,
        };
        state.otps.push(otp.clone());
        Ok(otp)
    }

    async fn latest_otp(&self, email: &str) -> StoreResult<Option<Otp>> {
        let state = self.state.lock();
        // max_by_key keeps the last maximum, so later pushes win ties on created_at.
        Ok(state
            .otps
            .iter()
            .filter(|o| o.email == email)
            .max_by_key(|o| o.created_at)
            .cloned())
    }

    async fn delete_otps(&self, email: &str) -> StoreResult<()> {
        self.state.lock().otps.retain(|o| o.email != email);
        Ok(())
    }

    async fn create_category(&self, input: &CategoryInput) -> StoreResult<Category> {
        let mut state = self.state.lock();
        if state.categories.iter().any(|c| c.name == input.name) {
            return Err(AppError::Conflict("Category already exists".into()));
        }
        let category = Category {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            description: input.description.clone(),
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(self.state.lock().categories.clone())
    }

    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let state = self.state.lock();
        Ok(state.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn create_course(&self, instructor_id: Uuid, input: &CourseInput) -> StoreResult<Course> {
        let mut state = self.state.lock();
        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            description: input.description.clone(),
            what_you_will_learn: input.what_you_will_learn.clone(),
            price: input.price,
            tags: input.tags.clone(),
            instructions: input.instructions.clone(),
            thumbnail: input.thumbnail.clone(),
            status: input.status.unwrap_or_default(),
            instructor_id,
            category_id: input.category_id,
            created_at: now,
            updated_at: now,
        };
        state.courses.push(course.clone());
        Ok(course)
    }

    async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
        let state = self.state.lock();
        Ok(state.courses.iter().find(|c| c.id == id).cloned())
    }

    async fn list_courses(&self) -> StoreResult<Vec<Course>> {
        Ok(self.state.lock().courses.clone())
    }

    async fn courses_by_category(
        &self,
        category_id: Uuid,
        status: Option<CourseStatus>,
    ) -> StoreResult<Vec<Course>> {
        let state = self.state.lock();
        Ok(state
            .courses
            .iter()
            .filter(|c| c.category_id == category_id)
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect())
    }

    async fn courses_by_instructor(&self, instructor_id: Uuid) -> StoreResult<Vec<Course>> {
        let state = self.state.lock();
        Ok(state
            .courses
            .iter()
            .filter(|c| c.instructor_id == instructor_id)
            .cloned()
            .collect())
    }

    async fn update_course(&self, id: Uuid, update: &CourseUpdate) -> StoreResult<Course> {
        let mut state = self.state.lock();
        let course = state
            .course_mut(id)
            .ok_or_else(|| AppError::NotFound("Course not found".into()))?;
        update.apply_to(course);
        course.updated_at = Utc::now();
        Ok(course.clone())
    }

    async fn delete_course(&self, id: Uuid) -> StoreResult<Option<Vec<Uuid>>> {
        let mut state = self.state.lock();
        let Some(index) = state.courses.iter().position(|c| c.id == id) else {
            return Ok(None);
        };

        let students: Vec<Uuid> = state
            .enrollments
            .iter()
            .filter(|(course_id, _)| *course_id == id)
            .map(|(_, user_id)| *user_id)
            .collect();
        state.enrollments.retain(|(course_id, _)| *course_id != id);
        state.progress.retain(|_, record| record.course_id != id);
        state.ratings.retain(|r| r.course_id != id);

        let section_ids: Vec<Uuid> = state.sections_of(id).iter().map(|s| s.id).collect();
        for section_id in section_ids {
            state.remove_section(section_id);
        }
        state.courses.remove(index);
        Ok(Some(students))
    }

    async fn course_content(&self, course_id: Uuid) -> StoreResult<Vec<SectionDetails>> {
        let state = self.state.lock();
        Ok(state
            .sections_of(course_id)
            .into_iter()
            .map(|section| {
                let subsections = state.subsections_of(section.id);
                SectionDetails {
                    section,
                    subsections,
                }
            })
            .collect())
    }

    async fn enrolled_students(&self, course_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let state = self.state.lock();
        Ok(state
            .enrollments
            .iter()
            .filter(|(c, _)| *c == course_id)
            .map(|(_, u)| *u)
            .collect())
    }

    async fn create_section(&self, course_id: Uuid, name: &str) -> StoreResult<Section> {
        let mut state = self.state.lock();
        if !state.courses.iter().any(|c| c.id == course_id) {
            return Err(AppError::NotFound("Course not found".into()));
        }
        let position = state
            .sections_of(course_id)
            .last()
            .map_or(1, |s| s.position + 1);
        let section = Section {
            id: Uuid::new_v4(),
            course_id,
            name: name.to_string(),
            position,
        };
        state.sections.insert(section.id, section.clone());
        Ok(section)
    }

    async fn find_section(&self, id: Uuid) -> StoreResult<Option<Section>> {
        Ok(self.state.lock().sections.get(&id).cloned())
    }

    async fn rename_section(&self, id: Uuid, name: &str) -> StoreResult<Section> {
        let mut state = self.state.lock();
        let section = state
            .sections
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Section not found".into()))?;
        section.name = name.to_string();
        Ok(section.clone())
    }

    async fn delete_section(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.lock().remove_section(id))
    }

    async fn create_subsection(
        &self,
        section_id: Uuid,
        input: &SubsectionInput,
    ) -> StoreResult<Subsection> {
        let mut state = self.state.lock();
        if !state.sections.contains_key(&section_id) {
            return Err(AppError::NotFound("Section not found".into()));
        }
        let position = state
            .subsections_of(section_id)
            .last()
            .map_or(1, |s| s.position + 1);
        let subsection = Subsection {
            id: Uuid::new_v4(),
            section_id,
            title: input.title.clone(),
            description: input.description.clone(),
            duration_seconds: input.duration_seconds,
            video_url: input.video_url.clone(),
            position,
        };
        state.subsections.insert(subsection.id, subsection.clone());
        Ok(subsection)
    }

    async fn find_subsection(&self, id: Uuid) -> StoreResult<Option<Subsection>> {
        Ok(self.state.lock().subsections.get(&id).cloned())
    }

    async fn update_subsection(
        &self,
        id: Uuid,
        update: &SubsectionUpdate,
    ) -> StoreResult<Subsection> {
        let mut state = self.state.lock();
        let subsection = state
            .subsections
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Subsection not found".into()))?;
        update.apply_to(subsection);
        Ok(subsection.clone())
    }

    async fn delete_subsection(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.lock().remove_subsection(id))
    }

    async fn enroll(&self, course_id: Uuid, user_id: Uuid) -> StoreResult<EnrollOutcome> {
        let mut state = self.state.lock();
        if !state.courses.iter().any(|c| c.id == course_id) {
            return Err(AppError::NotFound("Course not found".into()));
        }
        if !state.users.contains_key(&user_id) {
            return Err(AppError::NotFound("User not found".into()));
        }
        if state.enrollments.contains(&(course_id, user_id)) {
            return Ok(EnrollOutcome::AlreadyEnrolled);
        }
        state.enrollments.push((course_id, user_id));

        let record = ProgressRecord {
            id: Uuid::new_v4(),
            course_id,
            user_id,
            completed_videos: Vec::new(),
            created_at: Utc::now(),
        };
        state.progress.insert(record.id, record.clone());
        Ok(EnrollOutcome::Enrolled(record))
    }

    async fn is_enrolled(&self, course_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self.state.lock().enrollments.contains(&(course_id, user_id)))
    }

    async fn find_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<ProgressRecord>> {
        let state = self.state.lock();
        Ok(state
            .progress
            .values()
            .find(|r| r.course_id == course_id && r.user_id == user_id)
            .cloned())
    }

    async fn add_completed(&self, progress_id: Uuid, subsection_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock();
        if !state.subsections.contains_key(&subsection_id) {
            return Err(AppError::NotFound("Subsection not found".into()));
        }
        let record = state
            .progress
            .get_mut(&progress_id)
            .ok_or_else(|| AppError::NotFound("Course progress not found".into()))?;
        if record.completed_videos.contains(&subsection_id) {
            return Ok(false);
        }
        record.completed_videos.push(subsection_id);
        Ok(true)
    }

    async fn create_rating(&self, user_id: Uuid, input: &RatingInput) -> StoreResult<Rating> {
        let mut state = self.state.lock();
        if state
            .ratings
            .iter()
            .any(|r| r.user_id == user_id && r.course_id == input.course_id)
        {
            return Err(AppError::Conflict(
                "Course is already reviewed by the user".into(),
            ));
        }
        let rating = Rating {
            id: Uuid::new_v4(),
            user_id,
            course_id: input.course_id,
            rating: input.rating,
            review: input.review.clone(),
            created_at: Utc::now(),
        };
        state.ratings.push(rating.clone());
        Ok(rating)
    }

    async fn average_rating(&self, course_id: Uuid) -> StoreResult<Option<f64>> {
        let state = self.state.lock();
        let ratings: Vec<f64> = state
            .ratings
            .iter()
            .filter(|r| r.course_id == course_id)
            .map(|r| f64::from(r.rating))
            .collect();
        if ratings.is_empty() {
            return Ok(None);
        }
        Ok(Some(ratings.iter().sum::<f64>() / ratings.len() as f64))
    }

    async fn list_reviews(&self) -> StoreResult<Vec<Review>> {
        let state = self.state.lock();
        let mut reviews: Vec<Review> = state
            .ratings
            .iter()
            .filter_map(|r| {
                let user = state.users.get(&r.user_id)?;
                let course = state.courses.iter().find(|c| c.id == r.course_id)?;
                Some(Review {
                    id: r.id,
                    rating: r.rating,
                    review: r.review.clone(),
                    course_id: course.id,
                    course_name: course.name.clone(),
                    user_id: user.id,
                    first_name: user.first_name.clone(),
                    last_name: user.last_name.clone(),
                    email: user.email.clone(),
                    image: user.image.clone(),
                })
            })
            .collect();
        reviews.sort_by(|a, b| b.rating.cmp(&a.rating));
        Ok(reviews)
    }
}
