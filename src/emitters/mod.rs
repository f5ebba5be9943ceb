//! Back-end emitters.
//!
//! Emitters consume the finalized data and the merged variable store
//! through a read-only surface; they never reach back into the
//! per-file stores.

pub mod json;
pub mod kll;

mod test;

use crate::error::Error;
use crate::finalize::FinalData;
use crate::merge::MergeContext;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EmitterKind {
    #[default]
    Kll,
    Json,
    None,
}

impl FromStr for EmitterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kll" => Ok(Self::Kll),
            "json" => Ok(Self::Json),
            "none" => Ok(Self::None),
            other => Err(format!("unknown emitter '{}' (expected kll, json or none)", other)),
        }
    }
}

/// Run the selected emitter. A missing output path prints to stdout.
pub fn emit(
    kind: EmitterKind,
    merged: &MergeContext,
    data: &FinalData,
    output: Option<&Path>,
) -> Result<(), Error> {
    match kind {
        EmitterKind::Kll => kll::write(merged, output),
        EmitterKind::Json => json::write(merged, data, output),
        EmitterKind::None => Ok(()),
    }
}

fn write_output(text: &str, output: Option<&Path>) -> Result<(), Error> {
    match output {
        Some(path) => std::fs::write(path, text).map_err(|source| Error::Io {
            file: path.display().to_string(),
            source,
        }),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}
