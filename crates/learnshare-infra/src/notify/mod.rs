//! Verification code delivery.

mod log;

pub use log::LogCodeSender;
