//
// navigation/marker.rs
//
// Navigation markers produced for resolved file references
//

use std::path::{Path, PathBuf};

use serde::Serialize;
use tower_lsp::lsp_types::Range;

use crate::latex::CommandInvocation;

/// Display icon for a navigation target, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconKey {
    Latex,
    Style,
    Class,
    Bibliography,
    Pdf,
    Image,
    File,
}

impl IconKey {
    pub fn from_extension(extension: Option<&str>) -> Self {
        let Some(extension) = extension else {
            return IconKey::File;
        };
        match extension.to_ascii_lowercase().as_str() {
            "tex" => IconKey::Latex,
            "sty" => IconKey::Style,
            "cls" => IconKey::Class,
            "bib" => IconKey::Bibliography,
            "pdf" => IconKey::Pdf,
            "png" | "jpg" | "jpeg" | "eps" | "svg" | "gif" => IconKey::Image,
            _ => IconKey::File,
        }
    }

    pub fn for_path(path: &Path) -> Self {
        Self::from_extension(path.extension().and_then(|e| e.to_str()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IconKey::Latex => "latex",
            IconKey::Style => "style",
            IconKey::Class => "class",
            IconKey::Bibliography => "bibliography",
            IconKey::Pdf => "pdf",
            IconKey::Image => "image",
            IconKey::File => "file",
        }
    }
}

/// A link from a command invocation to the file it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationMarker {
    pub target: PathBuf,
    pub icon: IconKey,
    pub tooltip: String,
    /// Range of the whole invocation
    pub origin: Range,
    /// Range of the parameter group that named the file
    pub argument_range: Range,
}

impl NavigationMarker {
    pub fn new(target: PathBuf, invocation: &CommandInvocation, argument_range: Range) -> Self {
        Self {
            icon: IconKey::for_path(&target),
            tooltip: tooltip_for(&target),
            target,
            origin: invocation.range,
            argument_range,
        }
    }
}

pub fn tooltip_for(target: &Path) -> String {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    format!("Go to referenced file '{}'", name)
}
