pub mod error;
pub mod handlers;
pub mod likes_api;
pub mod server;
pub mod state;
