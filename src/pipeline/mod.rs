//! Pipeline entry points.
//!
//! - `run_capture`: Mirror a whole wiki into a local store

pub mod capture;

pub use capture::{CaptureReport, CaptureRun, run_capture};
