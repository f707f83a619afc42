use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("error opening shader file {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading shader file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file {path:?} is recursively included from {from:?} (line {line})")]
    CycleDetected {
        /// The file that is already being resolved further up the include chain.
        path: PathBuf,
        /// The file containing the offending include directive.
        from: PathBuf,
        line: usize,
    },
}

#[derive(Debug, Error)]
pub enum BuildHeaderError {
    #[error("error resolving shader sections")]
    Resolve(#[from] ResolveError),

    #[error("output suffix for {input:?} is empty and would overwrite the input")]
    EmptySuffix { input: PathBuf },

    #[error("error writing header file {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An `#include` target that could not be opened.
/// Resolution continues without the included lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error in file {file:?}: #include {include} could not be found")]
pub struct MissingInclude {
    /// The file containing the include directive.
    pub file: PathBuf,
    /// The include argument with quotes removed.
    pub include: String,
    /// The 1-based line of the directive in `file`.
    pub line: usize,
}
