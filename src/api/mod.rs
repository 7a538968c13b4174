pub mod error;
pub mod extract;
pub mod response;
pub mod route;

pub use error::ApiError;
pub use extract::{ApiJson, ApiPath, ApiQuery, StudentId};
pub use response::{created, with_total_count, ApiResponse};
pub use route::create_router;
