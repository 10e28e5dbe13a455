//! Application services - workflows composed from core ports.

mod account;

pub use account::{AccountError, AccountService, IssuedToken};
