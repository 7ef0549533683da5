//! Outbound result types and their JSON rendering.

pub mod history;
pub mod json;
