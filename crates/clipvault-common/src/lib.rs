//! Clipvault-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across clipvault:
//!
//! - **Core Types**: Record status and source kind enums
//! - **Path Utilities**: Extension checks and the extension to MIME table
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use clipvault_common::{Error, Result, VideoStatus};
//! use clipvault_common::paths::{content_type_for, is_video_file};
//! use std::path::Path;
//!
//! assert_eq!(VideoStatus::Active.to_string(), "active");
//! assert!(is_video_file(Path::new("clip.mp4")));
//! assert_eq!(content_type_for(Path::new("clip.webm")), "video/webm");
//!
//! fn example() -> Result<()> {
//!     Err(Error::invalid_input("empty video id"))
//! }
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
