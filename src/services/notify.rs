//! Outgoing mail.
//!
//! Delivery itself is an external concern; the application only depends on the
//! `Notifier` trait. The message bodies are built by the functions below.

use async_trait::async_trait;

use crate::error::AppError;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// Writes every message to the log instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        log::info!("Mail to {}: {}", to, subject);
        log::debug!("Mail body for {}:\n{}", to, body);
        Ok(())
    }
}

pub fn otp_email(code: &str) -> String {
    format!(
        "Use the code below to verify your email address.\n\n{}\n\nThe code is valid for 5 minutes.",
        code
    )
}

pub fn course_enrollment_email(course_name: &str, student_name: &str) -> String {
    format!(
        "Dear {},\n\nYou have successfully registered for the course \"{}\".\n\
         Log in to your dashboard to start learning.",
        student_name, course_name
    )
}

/// `amount` is in major currency units.
pub fn payment_success_email(
    student_name: &str,
    amount: f64,
    order_id: &str,
    payment_id: &str,
) -> String {
    format!(
        "Dear {},\n\nWe have received a payment of {:.2}.\nPayment ID: {}\nOrder ID: {}",
        student_name, amount, payment_id, order_id
    )
}

pub fn password_updated_email(email: &str, student_name: &str) -> String {
    format!(
        "Hey {},\n\nThe password for your account {} was updated successfully.\n\
         If you did not request this change, contact support immediately.",
        student_name, email
    )
}

pub fn reset_password_email(url: &str) -> String {
    format!(
        "Your link for password reset is {}.\nThe link expires in one hour.",
        url
    )
}
