//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Email/password signup and login
//! - JWT token generation and validation
//! - Argon2 password hashing
//! - AuthedUser extractor for protected routes

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use extractors::AuthedUser;
pub use models::User;
pub use routes::auth_routes;
