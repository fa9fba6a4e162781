//! Rain alert service.
//!
//! Answers one question per invocation: is precipitation about to start at
//! the configured location, and if so in how many minutes? The pipeline
//! geocodes the location, fetches a minute-resolution forecast, normalizes
//! it and runs first-crossing onset detection.

pub mod alert;
pub mod config;
pub mod dev_mode;
pub mod handler;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod normalize;
