pub mod subsystem;
pub mod task;

pub use subsystem::{ConcurrencySubsystem, THREADS_ENV};
pub use task::{FnTask, Task};
