//! Courses, their sections and lectures, and the category catalog.
//!
//! Only the instructor who created a course may change it or its content; every
//! mutation below goes through `owned_course` first.

use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{
    AccountType, Category, CategoryInput, Course, CourseDetails, CourseInput, CourseStatus,
    CourseUpdate, InstructorSummary, Section, SectionDetails, SectionInput, Subsection,
    SubsectionInput, SubsectionUpdate,
};
use crate::store::Store;

const TOP_SELLING_LIMIT: usize = 10;

/// `"{h}h {m}m"` from an hour up, `"{m}m {s}s"` from a minute up, else `"{s}s"`.
pub fn format_duration(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

pub fn total_duration_seconds(content: &[SectionDetails]) -> i64 {
    content
        .iter()
        .flat_map(|section| section.subsections.iter())
        .map(|sub| i64::from(sub.duration_seconds))
        .sum()
}

async fn owned_course(
    store: &dyn Store,
    user: &AuthenticatedUser,
    course_id: Uuid,
) -> Result<Course, AppError> {
    user.require(AccountType::Instructor)?;
    let course = store
        .find_course(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".into()))?;
    if course.instructor_id != user.id {
        return Err(AppError::Forbidden(
            "Only the course instructor can modify this course".into(),
        ));
    }
    Ok(course)
}

async fn section_of(
    store: &dyn Store,
    course_id: Uuid,
    section_id: Uuid,
) -> Result<Section, AppError> {
    store
        .find_section(section_id)
        .await?
        .filter(|section| section.course_id == course_id)
        .ok_or_else(|| AppError::NotFound("Section not found".into()))
}

async fn subsection_of(
    store: &dyn Store,
    section_id: Uuid,
    subsection_id: Uuid,
) -> Result<Subsection, AppError> {
    store
        .find_subsection(subsection_id)
        .await?
        .filter(|sub| sub.section_id == section_id)
        .ok_or_else(|| AppError::NotFound("SubSection not found".into()))
}

pub async fn create_course(
    store: &dyn Store,
    user: &AuthenticatedUser,
    input: &CourseInput,
) -> Result<Course, AppError> {
    user.require(AccountType::Instructor)?;
    input.validate()?;
    store
        .find_category(input.category_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category details not found".into()))?;

    let course = store.create_course(user.id, input).await?;
    log::info!("Instructor {} created course {}", user.id, course.id);
    Ok(course)
}

pub async fn list_courses(store: &dyn Store) -> Result<Vec<Course>, AppError> {
    store.list_courses().await
}

/// The course with its instructor, category, ordered content and enrolled students.
pub async fn course_details(store: &dyn Store, course_id: Uuid) -> Result<CourseDetails, AppError> {
    let course = store
        .find_course(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Could not find course with id: {}", course_id)))?;

    let instructor = store
        .find_user(course.instructor_id)
        .await?
        .map(|user| InstructorSummary::from(&user));
    let category = store.find_category(course.category_id).await?;
    let sections = store.course_content(course_id).await?;
    let students_enrolled = store.enrolled_students(course_id).await?;
    let total_duration = format_duration(total_duration_seconds(&sections));

    Ok(CourseDetails {
        course,
        instructor,
        category,
        sections,
        students_enrolled,
        total_duration,
    })
}

pub async fn edit_course(
    store: &dyn Store,
    user: &AuthenticatedUser,
    course_id: Uuid,
    update: &CourseUpdate,
) -> Result<CourseDetails, AppError> {
    update.validate()?;
    if update.is_empty() {
        return Err(AppError::ValidationError("No fields to update".into()));
    }
    owned_course(store, user, course_id).await?;
    if let Some(category_id) = update.category_id {
        store
            .find_category(category_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Category details not found".into()))?;
    }

    store.update_course(course_id, update).await?;
    course_details(store, course_id).await
}

/// Deletes the course and everything hanging off it. Returns the students that
/// were enrolled.
pub async fn delete_course(
    store: &dyn Store,
    user: &AuthenticatedUser,
    course_id: Uuid,
) -> Result<Vec<Uuid>, AppError> {
    owned_course(store, user, course_id).await?;
    let unenrolled = store
        .delete_course(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".into()))?;
    log::info!(
        "Deleted course {} and unenrolled {} students",
        course_id,
        unenrolled.len()
    );
    Ok(unenrolled)
}

pub async fn add_section(
    store: &dyn Store,
    user: &AuthenticatedUser,
    course_id: Uuid,
    input: &SectionInput,
) -> Result<Vec<SectionDetails>, AppError> {
    input.validate()?;
    owned_course(store, user, course_id).await?;
    store.create_section(course_id, &input.name).await?;
    store.course_content(course_id).await
}

pub async fn rename_section(
    store: &dyn Store,
    user: &AuthenticatedUser,
    course_id: Uuid,
    section_id: Uuid,
    input: &SectionInput,
) -> Result<Vec<SectionDetails>, AppError> {
    input.validate()?;
    owned_course(store, user, course_id).await?;
    section_of(store, course_id, section_id).await?;
    store.rename_section(section_id, &input.name).await?;
    store.course_content(course_id).await
}

pub async fn delete_section(
    store: &dyn Store,
    user: &AuthenticatedUser,
    course_id: Uuid,
    section_id: Uuid,
) -> Result<Vec<SectionDetails>, AppError> {
    owned_course(store, user, course_id).await?;
    section_of(store, course_id, section_id).await?;
    if !store.delete_section(section_id).await? {
        return Err(AppError::NotFound("Section not found".into()));
    }
    store.course_content(course_id).await
}

pub async fn add_subsection(
    store: &dyn Store,
    user: &AuthenticatedUser,
    course_id: Uuid,
    section_id: Uuid,
    input: &SubsectionInput,
) -> Result<Vec<SectionDetails>, AppError> {
    input.validate()?;
    owned_course(store, user, course_id).await?;
    section_of(store, course_id, section_id).await?;
    store.create_subsection(section_id, input).await?;
    store.course_content(course_id).await
}

pub async fn update_subsection(
    store: &dyn Store,
    user: &AuthenticatedUser,
    course_id: Uuid,
    section_id: Uuid,
    subsection_id: Uuid,
    update: &SubsectionUpdate,
) -> Result<Vec<SectionDetails>, AppError> {
    update.validate()?;
    owned_course(store, user, course_id).await?;
    section_of(store, course_id, section_id).await?;
    subsection_of(store, section_id, subsection_id).await?;
    store.update_subsection(subsection_id, update).await?;
    store.course_content(course_id).await
}

pub async fn delete_subsection(
    store: &dyn Store,
    user: &AuthenticatedUser,
    course_id: Uuid,
    section_id: Uuid,
    subsection_id: Uuid,
) -> Result<Vec<SectionDetails>, AppError> {
    owned_course(store, user, course_id).await?;
    section_of(store, course_id, section_id).await?;
    subsection_of(store, section_id, subsection_id).await?;
    if !store.delete_subsection(subsection_id).await? {
        return Err(AppError::NotFound("SubSection not found".into()));
    }
    store.course_content(course_id).await
}

pub async fn create_category(
    store: &dyn Store,
    user: &AuthenticatedUser,
    input: &CategoryInput,
) -> Result<Category, AppError> {
    user.require(AccountType::Admin)?;
    input.validate()?;
    store.create_category(input).await
}

pub async fn list_categories(store: &dyn Store) -> Result<Vec<Category>, AppError> {
    store.list_categories().await
}

#[derive(Debug, Serialize)]
pub struct CategoryPage {
    pub category: Category,
    /// Published courses of the category.
    pub courses: Vec<Course>,
    /// Published courses across all categories, most enrolled first.
    pub top_selling: Vec<Course>,
}

pub async fn category_page(store: &dyn Store, category_id: Uuid) -> Result<CategoryPage, AppError> {
    let category = store
        .find_category(category_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;
    let courses = store
        .courses_by_category(category_id, Some(CourseStatus::Published))
        .await?;
    if courses.is_empty() {
        log::debug!("No published courses in category {}", category_id);
        return Err(AppError::NotFound(
            "No courses found for the selected category".into(),
        ));
    }

    let mut ranked = Vec::new();
    for course in store.list_courses().await? {
        if course.status != CourseStatus::Published {
            continue;
        }
        let students = store.enrolled_students(course.id).await?.len();
        ranked.push((students, course));
    }
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    let top_selling = ranked
        .into_iter()
        .take(TOP_SELLING_LIMIT)
        .map(|(_, course)| course)
        .collect();

    Ok(CategoryPage {
        category,
        courses,
        top_selling,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{course_input, seed_user};
    use crate::store::MemoryStore;

    fn caller(id: Uuid, role: AccountType) -> AuthenticatedUser {
        AuthenticatedUser {
            id,
            email: "caller@example.com".to_string(),
            role,
        }
    }

    fn lecture(seconds: i32) -> SubsectionInput {
        SubsectionInput {
            title: "Lecture".to_string(),
            description: "Content".to_string(),
            duration_seconds: seconds,
            video_url: "https://videos.example.com/lecture.mp4".to_string(),
        }
    }

    async fn setup(store: &MemoryStore) -> (AuthenticatedUser, Course) {
        let instructor = seed_user(store, "instructor@example.com", AccountType::Instructor).await;
        let category = store
            .create_category(&CategoryInput {
                name: "Systems".to_string(),
                description: "Low level".to_string(),
            })
            .await
            .unwrap();
        let user = caller(instructor.id, AccountType::Instructor);
        let course = create_course(store, &user, &course_input(category.id, 300))
            .await
            .unwrap();
        (user, course)
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(60), "1m 0s");
        assert_eq!(format_duration(754), "12m 34s");
        assert_eq!(format_duration(3600), "1h 0m");
        assert_eq!(format_duration(7384), "2h 3m");
    }

    #[actix_rt::test]
    async fn test_new_course_is_draft_and_needs_category() {
        let store = MemoryStore::new();
        let (user, course) = setup(&store).await;
        assert_eq!(course.status, CourseStatus::Draft);
        assert_eq!(course.instructor_id, user.id);

        let err = create_course(&store, &user, &course_input(Uuid::new_v4(), 100))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let student = caller(Uuid::new_v4(), AccountType::Student);
        let err = create_course(&store, &student, &course_input(course.category_id, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[actix_rt::test]
    async fn test_only_owner_can_edit() {
        let store = MemoryStore::new();
        let (owner, course) = setup(&store).await;
        let other = seed_user(&store, "other@example.com", AccountType::Instructor).await;
        let update = CourseUpdate {
            price: Some(999),
            ..Default::default()
        };

        let err = edit_course(
            &store,
            &caller(other.id, AccountType::Instructor),
            course.id,
            &update,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let details = edit_course(&store, &owner, course.id, &update).await.unwrap();
        assert_eq!(details.course.price, 999);

        let err = edit_course(&store, &owner, course.id, &CourseUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[actix_rt::test]
    async fn test_course_details_total_duration() {
        let store = MemoryStore::new();
        let (user, course) = setup(&store).await;
        let content = add_section(
            &store,
            &user,
            course.id,
            &SectionInput {
                name: "Intro".to_string(),
            },
        )
        .await
        .unwrap();
        let section_id = content[0].section.id;
        add_subsection(&store, &user, course.id, section_id, &lecture(1800))
            .await
            .unwrap();
        add_subsection(&store, &user, course.id, section_id, &lecture(2100))
            .await
            .unwrap();

        let details = course_details(&store, course.id).await.unwrap();
        assert_eq!(details.total_duration, "1h 5m");
        assert_eq!(details.sections[0].subsections.len(), 2);
        assert_eq!(details.instructor.unwrap().id, user.id);
    }

    #[actix_rt::test]
    async fn test_section_must_belong_to_course() {
        let store = MemoryStore::new();
        let (user, course) = setup(&store).await;
        let second = create_course(&store, &user, &course_input(course.category_id, 10))
            .await
            .unwrap();
        let content = add_section(
            &store,
            &user,
            second.id,
            &SectionInput {
                name: "Other".to_string(),
            },
        )
        .await
        .unwrap();

        let err = delete_section(&store, &user, course.id, content[0].section.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_rt::test]
    async fn test_delete_course_cascades() {
        let store = MemoryStore::new();
        let (user, course) = setup(&store).await;
        let first = seed_user(&store, "s1@example.com", AccountType::Student).await;
        let second = seed_user(&store, "s2@example.com", AccountType::Student).await;
        let content = add_section(
            &store,
            &user,
            course.id,
            &SectionInput {
                name: "Intro".to_string(),
            },
        )
        .await
        .unwrap();
        let content = add_subsection(&store, &user, course.id, content[0].section.id, &lecture(60))
            .await
            .unwrap();
        let section_id = content[0].section.id;
        let subsection_id = content[0].subsections[0].id;
        store.enroll(course.id, first.id).await.unwrap();
        store.enroll(course.id, second.id).await.unwrap();

        let mut unenrolled = delete_course(&store, &user, course.id).await.unwrap();
        unenrolled.sort();
        let mut expected = vec![first.id, second.id];
        expected.sort();

        assert_eq!(unenrolled, expected);
        assert!(store.find_course(course.id).await.unwrap().is_none());
        assert!(store.find_section(section_id).await.unwrap().is_none());
        assert!(store.find_subsection(subsection_id).await.unwrap().is_none());
        for student in [&first, &second] {
            assert!(store.enrolled_course_ids(student.id).await.unwrap().is_empty());
            assert!(store.progress_record_ids(student.id).await.unwrap().is_empty());
            assert!(store.find_progress(course.id, student.id).await.unwrap().is_none());
        }

        let err = delete_course(&store, &user, course.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_rt::test]
    async fn test_category_page_lists_published_courses() {
        let store = MemoryStore::new();
        let (user, course) = setup(&store).await;

        let err = category_page(&store, course.category_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        edit_course(
            &store,
            &user,
            course.id,
            &CourseUpdate {
                status: Some(CourseStatus::Published),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let page = category_page(&store, course.category_id).await.unwrap();
        assert_eq!(page.courses.len(), 1);
        assert_eq!(page.top_selling[0].id, course.id);
    }

    #[actix_rt::test]
    async fn test_only_admin_creates_categories() {
        let store = MemoryStore::new();
        let input = CategoryInput {
            name: "Databases".to_string(),
            description: "Storage engines".to_string(),
        };

        let err = create_category(&store, &caller(Uuid::new_v4(), AccountType::Instructor), &input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        create_category(&store, &caller(Uuid::new_v4(), AccountType::Admin), &input)
            .await
            .unwrap();
        assert_eq!(list_categories(&store).await.unwrap().len(), 1);
    }
}
