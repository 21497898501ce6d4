//! sqlrun exec - segmentation and run orchestration
//!
//! This crate turns raw script text into executable units and drives them
//! against one session on a background task: progress events flow out,
//! decisions flow back in, cancellation lands at unit boundaries.

mod controller;
mod runner;
mod segment;
#[cfg(test)]
mod test_helpers;

pub use controller::{Controller, RunHandle};
pub use runner::RunEvent;
pub use segment::segment;
