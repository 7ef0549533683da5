//! Interlocking core: graph store, phase inference, route locking, stop
//! limits.

pub mod locking;
pub mod phase;
pub mod stoplimit;
pub mod store;
