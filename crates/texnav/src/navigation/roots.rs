//
// navigation/roots.rs
//
// Candidate root directories for file-reference lookup
//

use std::path::{Path, PathBuf};

use super::inclusion::RootFinder;

/// Directories to search, in priority order: the root document's directory
/// first, then every source root in the order given.
///
/// Duplicates are kept. Returns `None` if the root document has no parent
/// directory.
pub fn candidate_roots(
    containing_file: &Path,
    root_finder: &dyn RootFinder,
    source_roots: &[PathBuf],
) -> Option<Vec<PathBuf>> {
    let root_file = root_finder.root_of(containing_file);
    let root_dir = root_file.parent()?;

    let mut roots = Vec::with_capacity(source_roots.len() + 1);
    roots.push(root_dir.to_path_buf());
    roots.extend(source_roots.iter().cloned());
    Some(roots)
}
