pub mod auth;
pub mod crypto;
pub mod log;
pub mod schedule;
pub mod user;
