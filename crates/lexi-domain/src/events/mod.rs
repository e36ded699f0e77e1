//! Domain event re-exports (progress events live on the
//! [`crate::ports::services::ProgressPublisher`] port; this module is the
//! stable import path for consumers that only care about the payload).

pub use crate::ports::services::ProgressEvent;
