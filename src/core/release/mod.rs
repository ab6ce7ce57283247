mod executor;
mod pipeline;
mod resolver;
mod types;

pub use pipeline::{plan, run, run_step, steps_for};
pub use types::{ReleaseOptions, ReleasePlan, ReleaseRun, ReleaseStepRun};
