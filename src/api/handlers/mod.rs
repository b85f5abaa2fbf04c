// src/api/handlers/mod.rs
mod health;
mod users;

pub use health::health_check;
pub use users::{list_users, register_user, RegisterRequest};
