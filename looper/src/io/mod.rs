//! I/O helpers at the boundary of a build pass.

pub mod config;
pub mod discover;
pub mod manifest;
