//! Normalization, segmentation and highlight scheduling.
//!
//! Every stage is a pure function over the previous stage's output.

pub mod clean;
pub mod highlight;
pub mod lines;
pub mod slides;
pub mod units;
pub mod words;
pub mod wrap;
