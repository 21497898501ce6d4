//! Script segmentation
//!
//! Turns raw script text into the ordered units a run executes: comments
//! are stripped, procedural blocks stay whole, and plain statement runs
//! are split on `;`.

mod splitter;


pub use splitter::segment;
