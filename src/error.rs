//! Error boundary for the driver.
//!
//! The tree itself never returns `Result` — every outcome it can produce is
//! a normal value (including "absent", see [`crate::btree`]), and the only
//! two ways to misuse it (`t < 2`, key `0`) are programmer errors that
//! assert rather than propagate. The driver, which does real I/O and
//! parses attacker-agnostic but still fallible text files, needs an actual
//! error type.

use std::path::PathBuf;

/// Everything that can go wrong while running the file-based driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: expected a positive integer, found {text:?}", path.display())]
    MalformedKeyLine {
        path: PathBuf,
        line: usize,
        text: String,
    },

    #[error("{}:{line}: unrecognized command {text:?}", path.display())]
    MalformedCommand {
        path: PathBuf,
        line: usize,
        text: String,
    },
}
