//! Input formats: static track layout and the inbound event script.

pub mod dispatch;
pub mod layout;
