//! Clipvault-DB: Database schema, migrations, and query operations
//!
//! This crate is the persistence collaborator of the delivery service. It
//! stores video records in SQLite via rusqlite with r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```
//! use clipvault_db::models::NewVideo;
//! use clipvault_db::pool::{get_conn, init_memory_pool};
//! use clipvault_db::queries::videos;
//!
//! let pool = init_memory_pool().unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! videos::insert_video(&conn, &NewVideo::new("VID_1", "VID_1.mp4").slug("abc")).unwrap();
//! let found = videos::find_by_slug(&conn, "abc", false).unwrap();
//! assert_eq!(found.unwrap().video_id, "VID_1");
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
