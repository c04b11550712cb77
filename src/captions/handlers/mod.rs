pub mod export;
pub mod sessions;
pub mod websocket;
