//! Pipeline steps.
//!
//! Every external command is a step with a [`StepPolicy`]. Running it yields
//! a [`StepOutcome`]: `Success`, `Warning` (best-effort failure) or `Fatal`
//! (required failure). [`Pipeline`] runs steps in order and keeps a
//! [`StepRecord`] for each.

pub mod outcome;
pub mod pipeline;

pub use outcome::{StepOutcome, StepPolicy, StepRecord};
pub use pipeline::Pipeline;
