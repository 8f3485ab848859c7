//! CLI command implementations.

pub mod compact;
pub mod handle;
pub mod inspect;
pub mod seed;
