use uuid::Uuid;

use crate::error::AppError;
use crate::models::ProgressRecord;
use crate::store::Store;

/// Share of completed lectures as a percentage, rounded to two decimals.
/// A course without lectures counts as fully complete.
pub fn completion_percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let raw = completed as f64 * 100.0 / total as f64;
    (raw * 100.0).round() / 100.0
}

/// Records `subsection_id` as watched in the student's progress for `course_id`.
pub async fn mark_complete(
    store: &dyn Store,
    course_id: Uuid,
    subsection_id: Uuid,
    user_id: Uuid,
) -> Result<ProgressRecord, AppError> {
    let subsection = store
        .find_subsection(subsection_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid subsection".into()))?;

    let in_course = store
        .find_section(subsection.section_id)
        .await?
        .is_some_and(|section| section.course_id == course_id);
    if !in_course {
        return Err(AppError::NotFound(
            "Subsection does not belong to this course".into(),
        ));
    }

    let mut record = store
        .find_progress(course_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course progress does not exist".into()))?;

    if record.completed_videos.contains(&subsection_id) {
        return Err(AppError::Conflict("Subsection already completed".into()));
    }
    // A concurrent request may have won the race since the read above.
    if !store.add_completed(record.id, subsection_id).await? {
        return Err(AppError::Conflict("Subsection already completed".into()));
    }

    record.completed_videos.push(subsection_id);
    log::debug!(
        "User {} completed subsection {} of course {}",
        user_id,
        subsection_id,
        course_id
    );
    Ok(record)
}

pub async fn get_percentage(
    store: &dyn Store,
    course_id: Uuid,
    user_id: Uuid,
) -> Result<f64, AppError> {
    store
        .find_course(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".into()))?;
    let record = store
        .find_progress(course_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course progress not found".into()))?;

    let total: usize = store
        .course_content(course_id)
        .await?
        .iter()
        .map(|section| section.subsections.len())
        .sum();
    Ok(completion_percentage(record.completed_videos.len(), total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountType, SubsectionInput};
    use crate::services::testing::{seed_course, seed_user};
    use crate::store::MemoryStore;

    fn lecture(n: usize) -> SubsectionInput {
        SubsectionInput {
            title: format!("Lecture {}", n),
            description: String::new(),
            duration_seconds: 60,
            video_url: format!("https://videos.example.com/{}.mp4", n),
        }
    }

    #[test]
    fn test_completion_percentage() {
        assert_eq!(completion_percentage(0, 0), 100.0);
        assert_eq!(completion_percentage(0, 5), 0.0);
        assert_eq!(completion_percentage(2, 5), 40.0);
        assert_eq!(completion_percentage(1, 3), 33.33);
        assert_eq!(completion_percentage(2, 3), 66.67);
        assert_eq!(completion_percentage(3, 3), 100.0);
    }

    #[test]
    fn test_completion_percentage_is_monotonic() {
        let total = 7;
        let mut previous = -1.0;
        for completed in 0..=total {
            let current = completion_percentage(completed, total);
            assert!(current >= previous);
            assert!((0.0..=100.0).contains(&current));
            previous = current;
        }
    }

    #[actix_rt::test]
    async fn test_two_of_five_lectures_is_forty_percent() {
        let store = MemoryStore::new();
        let student = seed_user(&store, "s@example.com", AccountType::Student).await;
        let course = seed_course(&store, 0).await;
        let first = store.create_section(course.id, "Basics").await.unwrap();
        let second = store.create_section(course.id, "Advanced").await.unwrap();

        let mut lectures = Vec::new();
        for n in 0..3 {
            lectures.push(store.create_subsection(first.id, &lecture(n)).await.unwrap());
        }
        for n in 3..5 {
            lectures.push(store.create_subsection(second.id, &lecture(n)).await.unwrap());
        }
        store.enroll(course.id, student.id).await.unwrap();

        mark_complete(&store, course.id, lectures[0].id, student.id)
            .await
            .unwrap();
        let record = mark_complete(&store, course.id, lectures[4].id, student.id)
            .await
            .unwrap();
        assert_eq!(record.completed_videos.len(), 2);

        let percentage = get_percentage(&store, course.id, student.id).await.unwrap();
        assert_eq!(percentage, 40.0);
    }

    #[actix_rt::test]
    async fn test_mark_complete_error_order() {
        let store = MemoryStore::new();
        let student = seed_user(&store, "s@example.com", AccountType::Student).await;
        let course = seed_course(&store, 0).await;
        let other = seed_course(&store, 0).await;
        let section = store.create_section(course.id, "Basics").await.unwrap();
        let other_section = store.create_section(other.id, "Elsewhere").await.unwrap();
        let sub = store.create_subsection(section.id, &lecture(0)).await.unwrap();
        let foreign = store
            .create_subsection(other_section.id, &lecture(1))
            .await
            .unwrap();

        let err = mark_complete(&store, course.id, Uuid::new_v4(), student.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = mark_complete(&store, course.id, foreign.id, student.id)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AppError::NotFound("Subsection does not belong to this course".into())
        );

        let err = mark_complete(&store, course.id, sub.id, student.id)
            .await
            .unwrap_err();
        assert_eq!(err, AppError::NotFound("Course progress does not exist".into()));

        store.enroll(course.id, student.id).await.unwrap();
        mark_complete(&store, course.id, sub.id, student.id)
            .await
            .unwrap();
        let err = mark_complete(&store, course.id, sub.id, student.id)
            .await
            .unwrap_err();
        assert_eq!(err, AppError::Conflict("Subsection already completed".into()));

        let record = store.find_progress(course.id, student.id).await.unwrap().unwrap();
        assert_eq!(record.completed_videos, vec![sub.id]);
    }

    #[actix_rt::test]
    async fn test_percentage_without_lectures_is_complete() {
        let store = MemoryStore::new();
        let student = seed_user(&store, "s@example.com", AccountType::Student).await;
        let course = seed_course(&store, 0).await;
        store.enroll(course.id, student.id).await.unwrap();

        assert_eq!(
            get_percentage(&store, course.id, student.id).await.unwrap(),
            100.0
        );

        let err = get_percentage(&store, Uuid::new_v4(), student.id)
            .await
            .unwrap_err();
        assert_eq!(err, AppError::NotFound("Course not found".into()));
    }
}
