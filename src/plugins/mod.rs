//! Command surfaces layered on the core store.

pub mod collections;
pub mod status;
