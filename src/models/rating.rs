use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub rating: i16,
    pub review: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RatingInput {
    pub course_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(min = 1, max = 2000))]
    pub review: String,
}

/// A rating joined with its reviewer and course name, for the public review feed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub rating: i16,
    pub review: String,
    pub course_id: Uuid,
    pub course_name: String,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        let input = RatingInput {
            course_id: Uuid::new_v4(),
            rating: 5,
            review: "Clear and practical".to_string(),
        };
        assert!(input.validate().is_ok());

        for bad in [0, 6] {
            let input = RatingInput {
                rating: bad,
                ..input.clone()
            };
            assert!(input.validate().is_err(), "rating {} should be rejected", bad);
        }
    }
}
