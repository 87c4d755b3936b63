pub mod step;

pub use step::{Resolution, ResolutionPath, StepError, StepResolver};
