//! Domain model (ids, task record, state machine).

pub mod ids;
pub mod state;
pub mod task;

pub use ids::{ParseIdError, TaskId};
pub use state::{TaskStatus, UnknownStatus};
pub use task::{Task, TaskOutcome};
