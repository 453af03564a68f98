pub mod auth;
pub mod error;
pub mod posts;
pub mod server;
