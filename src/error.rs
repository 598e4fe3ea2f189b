//! Library-boundary error type. CLI commands convert these into
//! `anyhow::Error` at the `main.rs`/`commands.rs` boundary (see
//! `gffx`'s own split between typed internal errors and `anyhow::bail!`
//! in its command handlers).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("io error after {retries} retries: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        retries: u32,
    },

    #[error("execution error: {0}")]
    Execution(String),

    #[error("invariant violated: {0}")]
    Invariant(String),
}
