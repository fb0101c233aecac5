//! HTTP client module
//!
//! Provides the thin fetch layer every strategy shares: plain GET requests
//! with an identifying user-agent, no cookies, no auth.

mod http;

pub use http::HttpClient;
