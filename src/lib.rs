pub mod api;
pub mod blockchain;
pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod service;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod tests;

pub use api::error::ApiError;
pub use api::response::ApiResponse;
pub use api::route::create_router;
pub use blockchain::{EduPointsClient, TokenClient};
pub use config::Config;
pub use db::{connection, migration, transaction};
pub use service::ServiceError;
pub use state::AppState;
