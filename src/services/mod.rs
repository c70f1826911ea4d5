//! Domain logic. Every function works against `&dyn Store` so handlers and tests
//! can swap the storage backend freely.

pub mod accounts;
pub mod catalog;
pub mod dashboard;
pub mod enrollment;
pub mod notify;
pub mod payment;
pub mod progress;
pub mod ratings;

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use uuid::Uuid;

    use crate::error::AppError;
    use crate::models::{AccountType, CategoryInput, Course, CourseInput, NewUser, User};
    use crate::services::notify::Notifier;
    use crate::services::payment::{Order, PaymentGateway};
    use crate::store::Store;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentMail {
        pub to: String,
        pub subject: String,
        pub body: String,
    }

    /// Keeps every message instead of sending it.
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<SentMail>>,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<SentMail> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
            self.sent.lock().push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            Ok(())
        }
    }

    pub struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), AppError> {
            Err(AppError::InternalServerError("smtp unavailable".into()))
        }
    }

    #[derive(Default)]
    pub struct FakeGateway;

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_order(
            &self,
            amount_minor: i64,
            currency: &str,
            receipt: &str,
        ) -> Result<Order, AppError> {
            Ok(Order {
                id: format!("order_{}", Uuid::new_v4().simple()),
                amount: amount_minor,
                currency: currency.to_string(),
                receipt: Some(receipt.to_string()),
                status: "created".to_string(),
            })
        }
    }

    pub async fn seed_user(store: &dyn Store, email: &str, account_type: AccountType) -> User {
        store
            .create_user(NewUser {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                email: email.to_string(),
                password_hash: "not-a-real-hash".to_string(),
                account_type,
                contact_number: None,
                image: "https://example.com/avatar.svg".to_string(),
            })
            .await
            .unwrap()
    }

    pub fn course_input(category_id: Uuid, price: i64) -> CourseInput {
        CourseInput {
            name: "Rust for Beginners".to_string(),
            description: "Ownership, borrowing and lifetimes".to_string(),
            what_you_will_learn: "Write safe systems code".to_string(),
            price,
            tags: vec!["rust".to_string()],
            instructions: vec![],
            thumbnail: "https://example.com/thumb.png".to_string(),
            category_id,
            status: None,
        }
    }

    /// Creates a course owned by a fresh instructor in a fresh category.
    pub async fn seed_course(store: &dyn Store, price: i64) -> Course {
        let instructor = seed_user(
            store,
            &format!("instructor-{}@example.com", Uuid::new_v4().simple()),
            AccountType::Instructor,
        )
        .await;
        let category = store
            .create_category(&CategoryInput {
                name: format!("Category {}", Uuid::new_v4().simple()),
                description: "Programming".to_string(),
            })
            .await
            .unwrap();
        store
            .create_course(instructor.id, &course_input(category.id, price))
            .await
            .unwrap()
    }
}
