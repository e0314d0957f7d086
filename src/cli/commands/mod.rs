//! Command implementations.

pub mod export;
pub mod fetch;
pub mod serve;
