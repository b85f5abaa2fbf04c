// src/lib.rs
pub mod api;
pub mod banner;
pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod remote;
pub mod service;
