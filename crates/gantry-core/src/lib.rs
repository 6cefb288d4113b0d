//! Gantry Core
//!
//! Core domain types, error handling, and the job registry for Gantry CI.
//! This crate has minimal dependencies and defines the shared vocabulary
//! used across all other crates.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod job;
pub mod pipeline;
pub mod ports;
pub mod registry;
pub mod run;

pub use error::{Error, Result};
pub use ids::*;
