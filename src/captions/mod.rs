//! # Captions Module
//!
//! Live video captioning sessions. The browser's speech recognizer produces
//! text segments; this module persists them, keeps an auto-saved transcript
//! snapshot per session, streams live results over WebSocket, and exports
//! transcripts as text-file downloads.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::captions_routes;
