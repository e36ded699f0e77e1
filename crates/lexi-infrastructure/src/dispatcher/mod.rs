//! Task Dispatcher adapter (C9's broker binding).

mod inprocess_dispatcher;

pub use inprocess_dispatcher::InProcessDispatcher;
