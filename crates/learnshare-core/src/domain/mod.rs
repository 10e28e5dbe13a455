//! Domain entities - the core business objects.

mod user;

pub use user::{User, UserProfile, UserStatus, validate_email, validate_password, validate_username};
