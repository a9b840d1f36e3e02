//! Client module
//!
//! This module provides client functionality to interact with a taskline session,
//! either over HTTP or in-process.

mod core;
mod http;
mod trait_def;

// Re-export the trait and types
pub use self::core::CoreClient;
pub use http::{ClientConfig, ClientError, HttpClient};
pub use trait_def::Client;
