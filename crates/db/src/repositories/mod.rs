//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&SqlitePool` as the first argument.

pub mod detection_repo;
pub mod stats_repo;
pub mod user_repo;

pub use detection_repo::DetectionRepo;
pub use stats_repo::StatsRepo;
pub use user_repo::UserRepo;
