// src/remote/mod.rs

use crate::errors::Result;
use crate::models::{ListQuery, RegistrationForm, User};

pub mod users;

pub use users::HttpUserDirectory;

/// The remote system that owns user records.
///
/// Implemented over HTTP by [`HttpUserDirectory`]; tests substitute their own.
pub trait UserDirectory: Send + Sync {
    /// Creates a user from a validated form and returns the record the remote confirmed.
    fn create_user(&self, form: &RegistrationForm) -> impl std::future::Future<Output = Result<User>> + Send;

    /// Lists users, forwarding `query` as-is.
    fn list_users(&self, query: &ListQuery) -> impl std::future::Future<Output = Result<Vec<User>>> + Send;
}
