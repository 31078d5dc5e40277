//! Error types for the boundary operations that can genuinely fail.
//!
//! Per §7, the tag/splitter/aligner/prescanner pipeline itself never raises
//! errors to its caller — every failure there degrades to the best
//! available partial result. `FlacMetaError` exists only for the I/O-shaped
//! failures at the edges: opening a file, spooling bytes to a temp file, or
//! a container-parser adapter refusing to open a stream at all.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("couldn't open {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("container parser couldn't make sense of {path:?}")]
    Unparseable { path: PathBuf },

    #[error("I/O error reading container")]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum FlacMetaError {
    #[error("container scan failed")]
    Container(#[from] ContainerError),

    #[error("I/O error spooling prescan buffer")]
    PrescanSpool(#[from] io::Error),
}
