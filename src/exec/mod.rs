//! Execution boundary: the process runner, background supervision, and
//! outcome formatting.

pub mod background;
pub mod formatter;
pub mod process_runner;

pub use background::{
    BackgroundTaskState, BackgroundTaskStatus, BackgroundTaskSupervisor, TokioBackgroundSupervisor,
};
pub use formatter::{shape_outcome, truncate_tail};
pub use process_runner::{ProcessRunner, RawExecutionResult, TokioProcessRunner};
