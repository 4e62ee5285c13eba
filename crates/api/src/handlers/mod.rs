pub mod auth;
pub mod detection;
pub mod stats;
