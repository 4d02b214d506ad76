//! MyTaskly MCP Server Library
//!
//! A Model Context Protocol (MCP) server for the MyTaskly task manager.
//! Verifies caller JWTs, calls the MyTaskly API on the caller's behalf and
//! shapes the results for the mobile client and its voice assistant.

pub mod auth;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod mcp;
pub mod upstream;

pub use config::Config;
pub use error::{Result, TasklyMcpError};
