//! Progress Bus transport (C6's push-channel side).

mod broadcast_bus;

pub use broadcast_bus::BroadcastProgressBus;
