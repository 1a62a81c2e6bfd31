pub mod analyze;
pub mod auth;
pub mod youtube;
