pub mod config;
pub mod loader;
pub mod session_store;
