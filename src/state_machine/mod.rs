//! State machines driven from the UI thread.

pub mod rotator_sm;

pub use rotator_sm::{NewsRotator, RotatorEvent};
