//! In-memory file-tree transformation engine for static-site builds.
//!
//! A build pass takes a [`FileSet`](core::registry::FileSet) of virtual files,
//! classifies pages and assets, lets a plugin walk and rewrite the set through
//! a constrained action surface, then canonicalizes keys and freezes sorted
//! indexes onto every record.
//!
//! - **[`core`]**: Pure logic (registry, walks, actions, indexes). No I/O.
//! - **[`io`]**: Config, directory loading and manifest output.
//!
//! [`pass`] sequences a build; [`rules`] builds a plugin from configuration.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pass;
pub mod render;
pub mod rules;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
