pub mod category;
pub mod course;
pub mod otp;
pub mod payment;
pub mod progress;
pub mod rating;
pub mod section;
pub mod subsection;
pub mod user;

pub use category::{Category, CategoryInput};
pub use course::{Course, CourseDetails, CourseInput, CourseStatus, CourseUpdate, InstructorSummary};
pub use otp::Otp;
pub use payment::{CapturePaymentRequest, PaymentSuccessEmailRequest, VerifyPaymentRequest};
pub use progress::{ProgressQuery, ProgressRecord, ProgressUpdateRequest};
pub use rating::{Rating, RatingInput, Review};
pub use section::{Section, SectionDetails, SectionInput};
pub use subsection::{Subsection, SubsectionInput, SubsectionUpdate};
pub use user::{AccountType, NewUser, ProfileUpdate, User, UserDetails};
