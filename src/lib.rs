pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod models;
pub mod server;
pub mod state;
pub mod utils;
pub mod websocket;

pub use config::Config;
pub use error::{Error, Result};
pub use server::Server;
pub use state::{AppState, AttackMode};
