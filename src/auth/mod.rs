pub mod access;
pub mod tokens;
