use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// The role of an account. Gates which operations a caller may perform.
/// Corresponds to the `account_type` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "account_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Buys courses, tracks progress, writes reviews.
    Student,
    /// Creates and maintains courses.
    Instructor,
    /// Maintains the category list.
    Admin,
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AccountType::Student => "Student",
            AccountType::Instructor => "Instructor",
            AccountType::Admin => "Admin",
        };
        f.write_str(name)
    }
}

/// A user account as stored in the database and returned by the API.
///
/// The password hash and the password-reset token never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub account_type: AccountType,
    pub contact_number: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub about: Option<String>,
    pub image: String,
    #[serde(skip)]
    pub reset_token: Option<String>,
    #[serde(skip)]
    pub reset_token_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Everything needed to insert a new account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub account_type: AccountType,
    pub contact_number: Option<String>,
    pub image: String,
}

/// Allow-listed profile fields a user may change about themselves.
/// Fields left out of the request are not touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 1000))]
    pub about: Option<String>,
    #[validate(length(min = 5, max = 20))]
    pub contact_number: Option<String>,
}

/// A user together with the ids of their enrolled courses and progress records.
#[derive(Debug, Serialize)]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: User,
    pub courses: Vec<Uuid>,
    pub course_progress: Vec<Uuid>,
}
