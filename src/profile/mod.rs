//! # Profile Module
//!
//! Role-bearing user profiles (student/teacher). One row per account,
//! readable and updatable only by its owner.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::profile_routes;
