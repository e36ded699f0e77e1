//! Application layer: use cases that compose domain ports into the
//! asynchronous chunked-job orchestration workflows.

pub mod history_service;
pub mod merge;
pub mod task_executor;
pub mod use_cases;

pub use lexi_domain::error::{Error, Result};
