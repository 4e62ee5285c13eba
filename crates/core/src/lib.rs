//! Domain types shared by every roadsign crate.
//!
//! Nothing in here touches I/O: the detection record, its aggregation
//! rules, box geometry and the traffic-sign label table are pure data and
//! pure functions so they can be tested without images or a database.

pub mod detection;
pub mod error;
pub mod geometry;
pub mod labels;
pub mod types;
