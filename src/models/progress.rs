use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-(course, user) record of watched lectures.
///
/// At most one exists per pair. `completed_videos` holds each subsection id at most
/// once and only ids of subsections reachable from the course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub completed_videos: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdateRequest {
    pub course_id: Uuid,
    pub subsection_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressQuery {
    pub course_id: Uuid,
}
