//! Infrastructure layer: durable SQLite repositories (C5), the
//! in-process Progress Bus (C6), the in-process Task Dispatcher (C9),
//! configuration loading, logging, and the infrastructure half of the
//! composition root.

pub mod config;
pub mod db;
pub mod di;
pub mod dispatcher;
pub mod events;
pub mod logging;
pub mod repositories;
