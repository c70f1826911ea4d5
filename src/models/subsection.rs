use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A single video lecture. Owned by exactly one section.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subsection {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_seconds: i32,
    pub video_url: String,
    /// 1-based position within the section.
    pub position: i32,
}

/// Input for adding a lecture. The video is already hosted; only its URL and
/// length are recorded.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubsectionInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(range(min = 0))]
    pub duration_seconds: i32,
    #[validate(url)]
    pub video_url: String,
}

/// Allow-listed lecture fields. A new video must come with its duration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SubsectionUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub duration_seconds: Option<i32>,
    #[validate(url)]
    pub video_url: Option<String>,
}

impl SubsectionUpdate {
    pub fn apply_to(&self, subsection: &mut Subsection) {
        if let Some(title) = &self.title {
            subsection.title = title.clone();
        }
        if let Some(description) = &self.description {
            subsection.description = description.clone();
        }
        if let Some(duration) = self.duration_seconds {
            subsection.duration_seconds = duration;
        }
        if let Some(url) = &self.video_url {
            subsection.video_url = url.clone();
        }
    }
}
