pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ApiError;
