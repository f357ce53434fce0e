//
// navigation/inclusion.rs
//
// Inclusion graph between LaTeX documents and root-document discovery
//

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use super::contract::CommandTable;
use super::lookup::candidate_names;
use super::paths::{join_normalized, normalize_path};
use crate::latex::{declares_document_class, CommandInvocation};

/// Maps any document to the root document of its inclusion graph.
pub trait RootFinder {
    fn root_of(&self, file: &Path) -> PathBuf;
}

impl<F> RootFinder for F
where
    F: Fn(&Path) -> PathBuf,
{
    fn root_of(&self, file: &Path) -> PathBuf {
        self(file)
    }
}

/// Treats every file as its own root.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRoot;

impl RootFinder for IdentityRoot {
    fn root_of(&self, file: &Path) -> PathBuf {
        file.to_path_buf()
    }
}

/// Files that `invocations` pull in, resolved against the including file's directory.
///
/// Only commands whose contract accepts `tex` count. The first accepted
/// extension is appended when the name lacks it; targets need not exist.
pub fn inclusion_targets(
    file: &Path,
    invocations: &[CommandInvocation],
    table: &CommandTable,
) -> Vec<PathBuf> {
    let Some(dir) = file.parent() else {
        return Vec::new();
    };

    let mut targets = Vec::new();
    for invocation in invocations {
        let Some(command) = invocation.command_name() else {
            continue;
        };
        if !table.is_inclusion(command) {
            continue;
        }
        let Some(argument) = table.first_file_argument(command) else {
            continue;
        };
        let Some(param) = invocation.required.get(argument.parameter) else {
            continue;
        };
        let name = super::resolver::strip_delimiters(&param.text);
        // \includeonly takes a comma-separated list
        for part in name.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if let Some(candidate) = candidate_names(part, argument).into_iter().next() {
                targets.push(join_normalized(dir, &candidate));
            }
        }
    }
    targets
}

/// Who includes whom, plus which documents declare a document class.
#[derive(Debug, Clone)]
pub struct InclusionGraph {
    includes: HashMap<PathBuf, Vec<PathBuf>>,
    included_by: HashMap<PathBuf, BTreeSet<PathBuf>>,
    root_documents: HashSet<PathBuf>,
    max_depth: usize,
}

impl Default for InclusionGraph {
    fn default() -> Self {
        Self::new(16)
    }
}

impl InclusionGraph {
    pub fn new(max_depth: usize) -> Self {
        Self {
            includes: HashMap::new(),
            included_by: HashMap::new(),
            root_documents: HashSet::new(),
            max_depth,
        }
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Replace everything known about `file` with what `invocations` say.
    pub fn update(&mut self, file: &Path, invocations: &[CommandInvocation], table: &CommandTable) {
        let file = normalize_path(file);
        self.remove(&file);

        let targets = inclusion_targets(&file, invocations, table);
        for target in &targets {
            self.included_by
                .entry(target.clone())
                .or_default()
                .insert(file.clone());
        }
        if declares_document_class(invocations) {
            self.root_documents.insert(file.clone());
        }

        log::trace!(
            "Inclusion graph: '{}' includes {} file(s)",
            file.display(),
            targets.len()
        );
        self.includes.insert(file, targets);
    }

    /// Forget the outgoing edges and root status of `file`.
    pub fn remove(&mut self, file: &Path) {
        let file = normalize_path(file);
        if let Some(old_targets) = self.includes.remove(&file) {
            for target in old_targets {
                if let Some(parents) = self.included_by.get_mut(&target) {
                    parents.remove(&file);
                    if parents.is_empty() {
                        self.included_by.remove(&target);
                    }
                }
            }
        }
        self.root_documents.remove(&file);
    }

    pub fn contains(&self, file: &Path) -> bool {
        self.includes.contains_key(&normalize_path(file))
    }

    pub fn is_root_document(&self, file: &Path) -> bool {
        self.root_documents.contains(&normalize_path(file))
    }

    /// Files that include `file`, in path order.
    pub fn includers(&self, file: &Path) -> Vec<PathBuf> {
        self.included_by
            .get(&normalize_path(file))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn includes(&self, file: &Path) -> &[PathBuf] {
        self.includes
            .get(&normalize_path(file))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of documents in the graph.
    pub fn len(&self) -> usize {
        self.includes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty()
    }
}

impl RootFinder for InclusionGraph {
    /// Breadth-first walk up the reverse inclusion edges to the nearest root
    /// document. Falls back to `file` itself when no root is reachable.
    fn root_of(&self, file: &Path) -> PathBuf {
        let start = normalize_path(file);
        if self.root_documents.contains(&start) {
            return start;
        }

        let mut visited: HashSet<PathBuf> = HashSet::new();
        visited.insert(start.clone());
        let mut queue: VecDeque<(PathBuf, usize)> = VecDeque::new();
        queue.push_back((start.clone(), 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= self.max_depth {
                log::trace!(
                    "Root search for '{}' stopped at depth {}",
                    start.display(),
                    depth
                );
                continue;
            }
            let Some(parents) = self.included_by.get(&current) else {
                continue;
            };
            for parent in parents {
                if !visited.insert(parent.clone()) {
                    continue;
                }
                if self.root_documents.contains(parent) {
                    log::trace!(
                        "Root document of '{}' is '{}'",
                        start.display(),
                        parent.display()
                    );
                    return parent.clone();
                }
                queue.push_back((parent.clone(), depth + 1));
            }
        }

        start
    }
}
