// ABOUTME: Library root for webdeploy - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod error;
pub mod output;
pub mod ports;
pub mod provider;
pub mod types;
