//! API module
//!
//! This module provides the API functionality for taskline: the HTTP server
//! and the clients that talk to it.

pub mod client;
pub mod server;

// Re-export commonly used types
pub use client::{Client, ClientConfig, ClientError, CoreClient, HttpClient};
pub use server::{router, serve, ApiResponse, ServerConfig};
