//! Script and unit types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identity of a script before its text has been read.
///
/// The path is the identifier; the display name is what progress output
/// and summaries show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSource {
    pub path: PathBuf,
    pub display_name: String,
}

impl ScriptSource {
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
        }
    }

    /// Derive the display name from the file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { path, display_name }
    }
}

/// A script whose text has been loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub path: PathBuf,
    pub display_name: String,
    pub raw_text: String,
}

impl Script {
    pub fn new(source: &ScriptSource, raw_text: impl Into<String>) -> Self {
        Self {
            path: source.path.clone(),
            display_name: source.display_name.clone(),
            raw_text: raw_text.into(),
        }
    }
}

/// Kind of an executable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    /// A single statement; its terminating semicolon was split away.
    Statement,
    /// A block whose internal semicolons belong to the body (stored
    /// procedures, anonymous blocks, trigger bodies).
    ProceduralBlock,
}

/// One independently executable piece of a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// 1-based position within the script's emitted sequence.
    pub ordinal: u32,
    /// Trimmed text submitted to the driver.
    pub text: String,
    pub kind: UnitKind,
}

impl Unit {
    pub fn statement(ordinal: u32, text: impl Into<String>) -> Self {
        Self {
            ordinal,
            text: text.into(),
            kind: UnitKind::Statement,
        }
    }

    pub fn procedural_block(ordinal: u32, text: impl Into<String>) -> Self {
        Self {
            ordinal,
            text: text.into(),
            kind: UnitKind::ProceduralBlock,
        }
    }

    pub fn is_procedural(&self) -> bool {
        matches!(self.kind, UnitKind::ProceduralBlock)
    }
}
