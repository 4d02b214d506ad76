//! MyTaskly API module
//!
//! Contains types and the client for the upstream MyTaskly HTTP API, which is
//! the system of record for tasks, categories and notes.

pub mod client;
pub mod types;

pub use client::UpstreamClient;
