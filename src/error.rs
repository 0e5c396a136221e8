//! Error kinds for the counting engine, see `spec.md` §7.
//!
//! All variants are fatal: the process reports a one-line message (and the
//! subtemplate index, when applicable) and exits with a distinct non-zero
//! code. There is no retry path — color-coding iterations are statistically
//! independent, so a failed iteration simply aborts the run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CountError {
    /// non-numeric tokens, out-of-range indices, a template that is not a
    /// tree, or `k` above the sanity bound
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// file open/read/write failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// allocation failure for the graph or a count-table subtemplate
    #[error("out of memory while allocating subtemplate {subtemplate}: {detail}")]
    Oom { subtemplate: usize, detail: String },

    /// numeric overflow even after the 1e-12 scaling factor was applied
    #[error("saturation at subtemplate {subtemplate}: {detail}")]
    Saturation { subtemplate: usize, detail: String },

    /// internal inconsistency: indexer tables disagree with the decomposition
    #[error("invariant violated at subtemplate {subtemplate}: {detail}")]
    InvariantViolated { subtemplate: usize, detail: String },
}

impl CountError {
    /// distinct process exit code per error kind, used by `main.rs`
    pub fn exit_code(&self) -> i32 {
        match self {
            CountError::MalformedInput(_) => 1,
            CountError::Io(_) => 2,
            CountError::Oom { .. } => 3,
            CountError::Saturation { .. } => 4,
            CountError::InvariantViolated { .. } => 5,
        }
    }
}

pub type CountResult<T> = Result<T, CountError>;
