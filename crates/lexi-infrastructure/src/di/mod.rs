//! Composition root building blocks (the simplified, non-linkme side of
//! DI: the `lexi` binary wires the rest — providers and the dispatcher —
//! on top of this).

mod bootstrap;

pub use bootstrap::AppContext;
