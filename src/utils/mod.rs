//! Utility modules supporting lookups.
//!
//! - [`HttpClient`]: reqwest client with a user agent and timeouts, shared via `Arc`
//! - [`user_agent`]: build the user agent string, including the optional polite-pool contact

mod http;

pub use http::{user_agent, HttpClient};
