// Handlers module - Centralizes all request handlers
pub mod cache;
pub mod costs;
pub mod health;
