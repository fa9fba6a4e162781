//! Alert logic for the rain alert service.
//!
//! Submodules:
//! - `onset` - first-crossing rain onset detection and message formatting.

pub mod onset;

pub use onset::{detect, DetectorPolicy, Selection, DEFAULT_THRESHOLD};
