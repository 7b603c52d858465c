//! Deterministic, pure logic for a build pass.
//!
//! Core modules are free of I/O. They operate on the in-memory [`FileSet`]
//! and return deterministic outputs suitable for tests.
//!
//! [`FileSet`]: registry::FileSet

pub mod actions;
pub mod classify;
pub mod error;
pub mod index;
pub mod naming;
pub mod prop;
pub mod record;
pub mod registry;
pub mod walk;
