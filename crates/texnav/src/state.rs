//
// state.rs
//
// Shared server state: open documents, workspace folders, inclusion graph
//

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::{FileChangeType, FileEvent, TextDocumentContentChangeEvent, Url};
use walkdir::WalkDir;

use crate::config::{is_latex_source, TexnavConfig};
use crate::document::Document;
use crate::latex::{scan_commands, CommandInvocation};
use crate::navigation::paths::{normalize_path, uri_to_path};
use crate::navigation::{
    document_markers, CommandTable, DiskLookup, IdentityRoot, InclusionGraph, NavigationMarker,
    ResolveContext, RootFinder,
};

pub struct WorldState {
    pub documents: HashMap<Url, Document>,
    pub workspace_folders: Vec<Url>,
    pub config: TexnavConfig,
    pub commands: CommandTable,
    pub inclusion: InclusionGraph,
    /// Scanned invocations of closed files, kept so edges can be re-derived
    /// when the command table changes.
    disk_files: HashMap<PathBuf, Vec<CommandInvocation>>,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new(TexnavConfig::default())
    }
}

impl WorldState {
    pub fn new(config: TexnavConfig) -> Self {
        Self {
            documents: HashMap::new(),
            workspace_folders: Vec::new(),
            commands: config.command_table(),
            inclusion: InclusionGraph::new(config.max_root_search_depth),
            disk_files: HashMap::new(),
            config,
        }
    }

    /// Swap in a new configuration. Edges are re-derived because the command
    /// table decides which commands count as inclusions.
    pub fn apply_config(&mut self, config: TexnavConfig) {
        let table_changed = config.commands != self.config.commands;
        self.commands = config.command_table();
        self.inclusion.set_max_depth(config.max_root_search_depth);
        self.config = config;

        if table_changed {
            for (uri, doc) in &self.documents {
                if let Some(path) = uri_to_path(uri) {
                    self.inclusion.update(&path, &doc.invocations, &self.commands);
                }
            }
            for (path, invocations) in &self.disk_files {
                if !self.is_open(path) {
                    self.inclusion.update(path, invocations, &self.commands);
                }
            }
            log::info!(
                "Rebuilt inclusion edges for new command table: {} file(s) in graph",
                self.inclusion.len()
            );
        }
    }

    pub fn open_document(&mut self, uri: Url, text: &str, version: Option<i32>) {
        let doc = Document::new(text, version);
        if let Some(path) = uri_to_path(&uri) {
            self.inclusion.update(&path, &doc.invocations, &self.commands);
        }
        self.documents.insert(uri, doc);
    }

    pub fn change_document(
        &mut self,
        uri: &Url,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: Option<i32>,
    ) {
        let Some(doc) = self.documents.get_mut(uri) else {
            log::warn!("Change for unknown document: {}", uri);
            return;
        };
        for change in changes {
            doc.apply_change(change);
        }
        doc.version = version;
        doc.rescan();
        if let Some(path) = uri_to_path(uri) {
            self.inclusion.update(&path, &doc.invocations, &self.commands);
        }
    }

    /// Close a document. Its on-disk content, if any, becomes the graph's source again.
    pub fn close_document(&mut self, uri: &Url) {
        self.documents.remove(uri);
        if let Some(path) = uri_to_path(uri) {
            self.index_disk_file(&path);
        }
    }

    /// Re-read a closed file from disk into the inclusion graph.
    pub fn index_disk_file(&mut self, path: &Path) {
        match fs::read_to_string(path) {
            Ok(text) => self.index_invocations(path.to_path_buf(), scan_commands(&text)),
            Err(e) => {
                log::trace!("Not indexing '{}': {}", path.display(), e);
                self.remove_disk_file(path);
            }
        }
    }

    fn index_invocations(&mut self, path: PathBuf, invocations: Vec<CommandInvocation>) {
        let path = normalize_path(&path);
        self.inclusion.update(&path, &invocations, &self.commands);
        self.disk_files.insert(path, invocations);
    }

    pub fn remove_disk_file(&mut self, path: &Path) {
        self.disk_files.remove(&normalize_path(path));
        self.inclusion.remove(path);
    }

    /// Apply client file-watcher events for LaTeX sources.
    ///
    /// Open documents are authoritative and are left alone. Created or changed
    /// files are re-read from disk; deleted files leave the graph.
    pub fn apply_watched_changes(&mut self, changes: Vec<FileEvent>) {
        for change in changes {
            let Some(path) = uri_to_path(&change.uri) else {
                continue;
            };
            if !is_latex_source(&path) {
                continue;
            }
            if self.documents.contains_key(&change.uri) {
                log::trace!("Skipping watched file change for open document: {}", change.uri);
                continue;
            }
            match change.typ {
                FileChangeType::CREATED | FileChangeType::CHANGED => self.index_disk_file(&path),
                FileChangeType::DELETED => self.remove_disk_file(&path),
                _ => {}
            }
        }
    }

    pub fn is_open(&self, path: &Path) -> bool {
        crate::navigation::paths::path_to_uri(path)
            .is_some_and(|uri| self.documents.contains_key(&uri))
    }

    /// Apply a workspace scan. Open documents stay authoritative.
    pub fn apply_workspace_scan(&mut self, scan: WorkspaceScan) {
        let mut applied = 0;
        for (path, invocations) in scan.files {
            if self.is_open(&path) {
                continue;
            }
            self.index_invocations(path, invocations);
            applied += 1;
        }
        log::info!(
            "Applied workspace scan: {} file(s), {} in inclusion graph",
            applied,
            self.inclusion.len()
        );
    }

    pub fn workspace_paths(&self) -> Vec<PathBuf> {
        self.workspace_folders.iter().filter_map(uri_to_path).collect()
    }

    pub fn source_roots(&self) -> Vec<PathBuf> {
        self.config.source_roots(&self.workspace_paths())
    }

    /// Navigation markers for an open document, in document order.
    pub fn markers_for(&self, uri: &Url) -> Option<Vec<NavigationMarker>> {
        let doc = self.documents.get(uri)?;
        let path = uri_to_path(uri)?;
        let source_roots = self.source_roots();
        let root_finder: &dyn RootFinder = if self.config.resolve_root_document {
            &self.inclusion
        } else {
            &IdentityRoot
        };
        let ctx = ResolveContext {
            table: &self.commands,
            root_finder,
            source_roots: &source_roots,
            lookup: &DiskLookup,
        };
        Some(document_markers(&doc.invocations, &path, &ctx))
    }
}

/// Scanned `.tex` files from the workspace folders.
#[derive(Debug, Default)]
pub struct WorkspaceScan {
    pub files: Vec<(PathBuf, Vec<CommandInvocation>)>,
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Walk the workspace folders and scan every LaTeX source file.
///
/// Hidden directories are skipped. Unreadable files are logged and skipped.
pub fn scan_workspace(folders: &[PathBuf]) -> WorkspaceScan {
    let mut scan = WorkspaceScan::default();

    for folder in folders {
        log::info!("Scanning folder: {}", folder.display());
        let walker = WalkDir::new(folder)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !is_hidden(e));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Error walking '{}': {}", folder.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_latex_source(entry.path()) {
                continue;
            }
            match fs::read_to_string(entry.path()) {
                Ok(text) => {
                    log::trace!("Scanning file: {}", entry.path().display());
                    scan.files
                        .push((normalize_path(entry.path()), scan_commands(&text)));
                }
                Err(e) => log::warn!("Failed to read '{}': {}", entry.path().display(), e),
            }
        }
    }

    log::info!("Scanned {} workspace file(s)", scan.files.len());
    scan
}
