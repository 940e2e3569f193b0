//! Application services for the task list.

mod controller;
mod state;

pub use controller::{
    LOAD_FAILED_MESSAGE, TaskListController, TaskListError, TaskListResult, UPLOAD_FAILED_MESSAGE,
};
pub use state::{OperationOutcome, TaskListState};
