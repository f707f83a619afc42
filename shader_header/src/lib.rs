//! shader_header bundles GLSL shaders into generated C++ headers.
//!
//! Shader files are split into vertex, fragment, or compute sections using markers like `#[VERTEX]`.
//! Files referenced with `#include "path"` are inlined once per section.
//! The resolved source for each section is embedded as a character array in a `ShaderRD` subclass,
//! so applications can compile shaders at runtime without reading any files.
use std::path::{Path, PathBuf};

pub mod error;
pub mod header;
pub mod resolve;

use error::BuildHeaderError;
use header::write_header;
use resolve::ShaderSections;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Includes starting with this prefix resolve relative to the working directory.
    pub third_party_prefix: String,
    /// The suffix appended to each input path for the generated header.
    pub output_suffix: String,
    /// Insert a newline character after each line in the embedded source.
    pub insert_newline: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            third_party_prefix: resolve::THIRD_PARTY_PREFIX.to_string(),
            output_suffix: header::OUTPUT_SUFFIX.to_string(),
            insert_newline: true,
        }
    }
}

/// Resolve the shader at `path` and write its header next to it.
/// Returns the path of the generated header.
pub fn build_header<P: AsRef<Path>>(
    path: P,
    options: &BuildOptions,
) -> Result<PathBuf, BuildHeaderError> {
    let path = path.as_ref();
    let sections = ShaderSections::from_file(path, &options.third_party_prefix)?;
    write_header(path, &sections, options)
}

/// Build the header for each path in order.
/// A failure for one path does not stop the remaining paths from being processed.
pub fn build_headers<I, P>(
    paths: I,
    options: &BuildOptions,
) -> Vec<Result<PathBuf, BuildHeaderError>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths
        .into_iter()
        .map(|path| build_header(path, options))
        .collect()
}
