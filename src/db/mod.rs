pub mod models;
pub mod posts;
pub mod users;
