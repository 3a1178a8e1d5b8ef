pub mod connection;
pub mod dispatch;
pub mod handler;
pub mod registry;

pub use registry::ConnectionRegistry;
