//! Task instances, results and dataset loading

mod loader;
mod task;

pub use loader::{DatasetLoader, FileDataset};
pub use task::{TaskInstance, TaskResult};
