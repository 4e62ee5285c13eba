//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity matching its table plus the
//! input or response types built around it.

pub mod detection;
pub mod stats;
pub mod user;
