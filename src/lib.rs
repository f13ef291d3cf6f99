//! Clipvault - media delivery service
//!
//! This library crate exposes the delivery pipeline and HTTP server for
//! integration testing.

pub mod config;
pub mod delivery;
pub mod server;
