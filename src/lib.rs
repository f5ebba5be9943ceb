//! KLL (Keyboard Layout Language) compiler core.
//!
//! The pipeline is a pure function of the source files and their
//! roles: parse each file, organize its expressions into per-context
//! stores, fold the contexts in role precedence order, then finalize
//! the merged context into emitter-ready tables.

pub mod context;
pub mod emitters;
pub mod error;
pub mod finalize;
pub mod hid;
pub mod merge;
pub mod parser;
mod test;
pub mod types;

use indexmap::IndexMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use context::{KllState, MappingEntry, Value};
pub use emitters::EmitterKind;
pub use error::{Diagnostics, Error, Warning};
pub use finalize::{finalize, FinalData};
pub use merge::{merge, MergeContext};
pub use parser::parse_int;
pub use types::{
    Action, Animation, Capability, Key, KllFile, Mapping, Position, ResultList, ResultType,
    Schedule, Statement, Trigger, TriggerList, TriggerMode, TriggerType,
};

/// File roles, in merge precedence order (low to high).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum FileRole {
    Generic,
    Configuration,
    BaseMap,
    DefaultMap,
    PartialMap(usize),
    Merge,
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => write!(f, "Generic"),
            Self::Configuration => write!(f, "Configuration"),
            Self::BaseMap => write!(f, "BaseMap"),
            Self::DefaultMap => write!(f, "DefaultMap"),
            Self::PartialMap(n) => write!(f, "PartialMap_{}", n),
            Self::Merge => write!(f, "Merge"),
        }
    }
}

/// Cooperative cancellation flag, checked at stage boundaries.
pub type CancelFlag = Arc<AtomicBool>;

fn check_cancel(cancel: &CancelFlag) -> Result<(), Error> {
    if cancel.load(Ordering::Relaxed) {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

/// Structured compilation request from the driver.
#[derive(Debug, Default, Clone)]
pub struct CompileRequest {
    pub generic_files: Vec<PathBuf>,
    pub config_files: Vec<PathBuf>,
    pub base_files: Vec<PathBuf>,
    pub default_files: Vec<PathBuf>,
    /// Each inner group is one PartialMap layer, in declaration order.
    pub partial_groups: Vec<Vec<PathBuf>>,
    pub merge_files: Vec<PathBuf>,
    pub emitter: EmitterKind,
    pub output: Option<PathBuf>,
    pub json_output: Option<PathBuf>,
}

impl CompileRequest {
    pub fn all_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.generic_files
            .iter()
            .chain(&self.config_files)
            .chain(&self.base_files)
            .chain(&self.default_files)
            .chain(self.partial_groups.iter().flatten())
            .chain(&self.merge_files)
    }
}

// Holds owned text of all source files
// All other data structures borrow from this
#[derive(Debug, Default)]
pub struct Filestore {
    files: IndexMap<PathBuf, String>,
}

impl Filestore {
    pub fn new() -> Self {
        Filestore {
            files: IndexMap::new(),
        }
    }

    pub fn load_file(&mut self, path: &Path) -> Result<(), Error> {
        let raw_text = fs::read_to_string(path).map_err(|source| Error::Io {
            file: path.display().to_string(),
            source,
        })?;
        self.files.insert(path.to_path_buf(), raw_text);
        Ok(())
    }

    /// Register pre-read text under a synthetic path (tests, stdin).
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: String) {
        self.files.insert(path.into(), text);
    }

    pub fn text(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(|s| s.as_str())
    }

    /// Parse and organize one file; parse failures are accumulated and
    /// yield `None`.
    pub fn organize<'a>(
        &'a self,
        path: &Path,
        role: FileRole,
        diag: &mut Diagnostics,
    ) -> Option<KllState<'a>> {
        let name = path.display().to_string();
        let text = match self.text(path) {
            Some(text) => text,
            None => {
                diag.error(Error::Internal(format!("file '{}' was never loaded", name)));
                return None;
            }
        };
        log::debug!("parsing {} as {}", name, role);
        match KllFile::from_str(text) {
            Ok(kll) => Some(kll.into_state(&name, diag)),
            Err(err) => {
                diag.error(Error::from_pest(&name, text, err));
                None
            }
        }
    }
}

/// Per-role organized contexts, ready for the merge fold.
#[derive(Debug, Default)]
pub struct KllGroups<'a> {
    pub generic: Vec<KllState<'a>>,
    pub config: Vec<KllState<'a>>,
    pub base: Vec<KllState<'a>>,
    pub default: Vec<KllState<'a>>,
    pub partials: Vec<Vec<KllState<'a>>>,
    pub merge: Vec<KllState<'a>>,
}

impl<'a> KllGroups<'a> {
    pub fn new(
        filestore: &'a Filestore,
        request: &CompileRequest,
        diag: &mut Diagnostics,
    ) -> Self {
        let organize = |paths: &[PathBuf], role: FileRole, diag: &mut Diagnostics| {
            paths
                .iter()
                .filter_map(|path| filestore.organize(path, role, diag))
                .collect::<Vec<_>>()
        };
        KllGroups {
            generic: organize(&request.generic_files, FileRole::Generic, diag),
            config: organize(&request.config_files, FileRole::Configuration, diag),
            base: organize(&request.base_files, FileRole::BaseMap, diag),
            default: organize(&request.default_files, FileRole::DefaultMap, diag),
            partials: request
                .partial_groups
                .iter()
                .enumerate()
                .map(|(n, group)| organize(group, FileRole::PartialMap(n + 1), diag))
                .collect(),
            merge: organize(&request.merge_files, FileRole::Merge, diag),
        }
    }
}

/// Run the whole pipeline. User errors accumulate in `diag`; the
/// returned error is either the accumulation summary, a finalization
/// abort, cancellation, or an internal failure.
pub fn compile<'a>(
    filestore: &'a Filestore,
    request: &CompileRequest,
    cancel: &CancelFlag,
    diag: &mut Diagnostics,
) -> Result<(MergeContext<'a>, FinalData), Error> {
    check_cancel(cancel)?;
    let groups = KllGroups::new(filestore, request, diag);
    if let Some(err) = diag.failure() {
        return Err(err);
    }

    check_cancel(cancel)?;
    let merged = merge::merge(&groups, diag);
    if let Some(err) = diag.failure() {
        return Err(err);
    }

    check_cancel(cancel)?;
    let data = finalize::finalize(&merged, diag)?;
    if let Some(err) = diag.failure() {
        return Err(err);
    }

    Ok((merged, data))
}
