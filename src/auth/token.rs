//! Token secrets and cache entries.

pub mod entry;
pub mod secret;
