/// Blog Service Library
///
/// The content backend of the Scribe platform: authenticated users create,
/// edit, and delete posts, toggle likes, and manage comments; anyone can read
/// and filter the public feed.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and the route table
/// - `services`: business logic (validation, authorization, view assembly)
/// - `store`: storage traits plus the Postgres and in-memory implementations
/// - `middleware`: bearer-token authentication
/// - `models`: domain types and wire views
/// - `error`: error types and HTTP mapping
/// - `config`: configuration management
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
