//! Authoring errors raised from inside a build pass.
//!
//! Every variant aborts the whole pass: they describe content the site author
//! has to fix, not transient failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("\"{file}\" should have a \"{prop}\" property")]
    MissingRequiredProperty { file: String, prop: String },

    #[error("\"{file}\" has {value} for \"{prop}\", expected one of {allowed}")]
    InvalidEnumeratedValue {
        file: String,
        prop: String,
        value: String,
        allowed: String,
    },

    #[error("duplicate \"{prop}\" between \"{first}\" and \"{second}\"")]
    DuplicateUniqueValue {
        prop: String,
        first: String,
        second: String,
    },

    #[error("unknown {value} for \"{prop}\" defined on \"{file}\" (no \"{target}\")")]
    UnknownReference {
        file: String,
        prop: String,
        value: String,
        target: String,
    },

    #[error("unknown index \"{name}\"")]
    UnknownIndex { name: String },

    #[error("sidecar \"{file}\" is invalid: {reason}")]
    InvalidSidecar { file: String, reason: String },

    #[error("\"{file}\": {message}")]
    Plugin { file: String, message: String },
}
