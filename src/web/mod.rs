//! HTTP and WebSocket surface

pub mod auth;
pub mod handlers;
pub mod models;
pub mod server;
pub mod ws;
