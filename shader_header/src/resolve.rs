//! Splitting shader files into sections and inlining `#include` directives.
//!
//! Shader files use section markers like `#[VERTEX]` to select which stage
//! the following lines belong to. Included files are resolved relative to the
//! including file and inlined into whatever section is active at the directive.
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Component, Path, PathBuf},
};

use indexmap::IndexSet;
use log::{debug, warn};

use crate::error::{MissingInclude, ResolveError};

const VERTEX_MARKER: &str = "#[VERTEX]";
const FRAGMENT_MARKER: &str = "#[FRAGMENT]";
const COMPUTE_MARKER: &str = "#[COMPUTE]";
const INCLUDE_DIRECTIVE: &str = "#include ";
const LINE_COMMENT: &str = "//";

/// The default prefix for includes that resolve relative to the working directory.
pub const THIRD_PARTY_PREFIX: &str = "thirdparty/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Section {
    Vertex,
    Fragment,
    Compute,
}

impl Section {
    /// Find the section selected by a marker anywhere in `line`.
    pub fn from_marker(line: &str) -> Option<Self> {
        if line.contains(VERTEX_MARKER) {
            Some(Self::Vertex)
        } else if line.contains(FRAGMENT_MARKER) {
            Some(Self::Fragment)
        } else if line.contains(COMPUTE_MARKER) {
            Some(Self::Compute)
        } else {
            None
        }
    }
}

/// The accumulated source for a single [Section].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SectionSource {
    /// Lines with comments and line endings removed.
    pub lines: Vec<String>,
    /// Files already included into this section in include order.
    /// Includes that could not be opened are still listed.
    pub included_files: IndexSet<PathBuf>,
    /// The global line count at the marker that started this section.
    pub line_offset: usize,
}

impl SectionSource {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// The vertex, fragment, and compute sources for a shader file with all includes resolved.
#[derive(Debug, Default)]
pub struct ShaderSections {
    pub vertex: SectionSource,
    pub fragment: SectionSource,
    pub compute: SectionSource,
    /// Includes that could not be opened and were skipped.
    pub missing_includes: Vec<MissingInclude>,
    current_section: Option<Section>,
    line_offset: usize,
}

impl ShaderSections {
    /// Resolve the shader at `path` and everything it includes.
    ///
    /// Include arguments starting with `third_party_prefix` are resolved
    /// relative to the working directory instead of the including file.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        third_party_prefix: &str,
    ) -> Result<Self, ResolveError> {
        let mut sections = Self::default();
        let mut resolver = Resolver {
            third_party_prefix,
            active_includes: Vec::new(),
        };
        resolver.include_file(&normalize_path(path.as_ref()), &mut sections, 0)?;
        Ok(sections)
    }

    pub fn section(&self, section: Section) -> &SectionSource {
        match section {
            Section::Vertex => &self.vertex,
            Section::Fragment => &self.fragment,
            Section::Compute => &self.compute,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut SectionSource {
        match section {
            Section::Vertex => &mut self.vertex,
            Section::Fragment => &mut self.fragment,
            Section::Compute => &mut self.compute,
        }
    }

    /// The section selected by the last marker read, if any.
    pub fn current_section(&self) -> Option<Section> {
        self.current_section
    }

    /// The number of physical lines read across all files.
    pub fn line_offset(&self) -> usize {
        self.line_offset
    }

    /// Every file an include was attempted for in any section without duplicates.
    /// This also contains the paths in [ShaderSections::missing_includes]
    /// but does not include the top level file.
    pub fn included_files(&self) -> IndexSet<&Path> {
        [&self.vertex, &self.fragment, &self.compute]
            .into_iter()
            .flat_map(|s| s.included_files.iter().map(PathBuf::as_path))
            .collect()
    }
}

struct Resolver<'a> {
    third_party_prefix: &'a str,
    // Files with an include in progress and the section active at that include.
    active_includes: Vec<(Section, PathBuf)>,
}

impl Resolver<'_> {
    fn include_file(
        &mut self,
        path: &Path,
        sections: &mut ShaderSections,
        depth: usize,
    ) -> Result<(), ResolveError> {
        let file = File::open(path).map_err(|source| ResolveError::Open {
            path: path.to_owned(),
            source,
        })?;

        // Directories can be opened on some platforms but not read.
        let metadata = file.metadata().map_err(|source| ResolveError::Open {
            path: path.to_owned(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(ResolveError::Open {
                path: path.to_owned(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
            });
        }

        debug!("Resolving {path:?} at include depth {depth}");
        self.include_lines(path, BufReader::new(file), sections, depth)
    }

    fn include_lines<R: BufRead>(
        &mut self,
        path: &Path,
        reader: R,
        sections: &mut ShaderSections,
        depth: usize,
    ) -> Result<(), ResolveError> {
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ResolveError::Read {
                path: path.to_owned(),
                source,
            })?;
            sections.line_offset += 1;

            let line = strip_comment(&line);

            if let Some(section) = Section::from_marker(line) {
                debug!(
                    "Starting {section} section in {path:?} at line offset {}",
                    sections.line_offset
                );
                sections.current_section = Some(section);
                sections.section_mut(section).line_offset = sections.line_offset;
                continue;
            }

            if let Some(include) = include_argument(line) {
                self.include(path, include, i + 1, sections, depth)?;
                continue;
            }

            if let Some(section) = sections.current_section {
                sections
                    .section_mut(section)
                    .lines
                    .push(line.replace(['\r', '\n'], ""));
            }
        }

        Ok(())
    }

    fn include(
        &mut self,
        path: &Path,
        include: &str,
        line: usize,
        sections: &mut ShaderSections,
        depth: usize,
    ) -> Result<(), ResolveError> {
        let Some(section) = sections.current_section else {
            warn!("Ignoring #include {include} outside of a shader section in {path:?}");
            return Ok(());
        };

        let included_file = include_path(path, include, self.third_party_prefix);
        if sections.section(section).included_files.contains(&included_file) {
            debug!("Skipping {included_file:?} already included in {section} section");
            return Ok(());
        }

        // Files on the include chain may be included again under a different section.
        let in_progress = included_file == path
            || self
                .active_includes
                .iter()
                .any(|(s, p)| *s == section && *p == included_file);
        if in_progress {
            return Err(ResolveError::CycleDetected {
                path: included_file,
                from: path.to_owned(),
                line,
            });
        }

        sections
            .section_mut(section)
            .included_files
            .insert(included_file.clone());

        self.active_includes.push((section, path.to_owned()));
        let result = self.include_file(&included_file, sections, depth + 1);
        self.active_includes.pop();

        match result {
            Ok(()) => Ok(()),
            Err(ResolveError::Open { .. }) => {
                let missing = MissingInclude {
                    file: path.to_owned(),
                    include: include.to_string(),
                    line,
                };
                warn!("{missing}");
                sections.missing_includes.push(missing);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn strip_comment(line: &str) -> &str {
    line.find(LINE_COMMENT).map_or(line, |i| &line[..i])
}

fn include_argument(line: &str) -> Option<&str> {
    let (_, argument) = line.split_once(INCLUDE_DIRECTIVE)?;
    let argument = argument.trim();
    Some(
        argument
            .strip_prefix('"')
            .and_then(|a| a.strip_suffix('"'))
            .unwrap_or(argument),
    )
}

/// Find the path for an include argument in the file at `path`.
///
/// Arguments starting with `third_party_prefix` are relative to the working directory.
/// All other arguments are relative to the directory containing `path`.
pub fn include_path(path: &Path, include: &str, third_party_prefix: &str) -> PathBuf {
    if !third_party_prefix.is_empty() && include.starts_with(third_party_prefix) {
        normalize_path(Path::new(include))
    } else {
        let parent = path.parent().unwrap_or(Path::new(""));
        normalize_path(&parent.join(include))
    }
}

/// Remove `.` and fold `..` without accessing the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => (),
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // The parent of the root is the root.
                Some(Component::RootDir | Component::Prefix(_)) => (),
                _ => normalized.push(".."),
            },
            c => normalized.push(c),
        }
    }
    normalized
}
