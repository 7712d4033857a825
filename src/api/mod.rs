//! REST client for the tasks backend.

pub mod auth;
pub mod categories;
pub mod client;
pub mod error;
pub mod tasks;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
