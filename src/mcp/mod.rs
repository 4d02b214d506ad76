//! MCP (Model Context Protocol) module
//!
//! Implements the MCP server protocol and the tool dispatcher shared with the
//! HTTP transport.

pub mod server;
pub mod tools;
pub mod types;
