//! Database query modules.
//!
//! - videos: video record lookups and the write helpers used for seeding
pub mod videos;
