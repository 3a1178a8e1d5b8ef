#[path = "../common/helpers.rs"]
mod helpers;

mod api_tests;
mod client_tests;
mod websocket_tests;
