//
// navigation/lookup.rs
//
// Resolving a file name plus accepted extensions against a directory
//

use std::path::{Path, PathBuf};

use super::contract::FileArgument;

/// Resolves `(directory, name, accepted extensions)` to an existing file.
pub trait FileLookup {
    fn find_file(&self, directory: &Path, name: &str, argument: &FileArgument) -> Option<PathBuf>;
}

/// Relative names to try for `name`, in order.
///
/// Each accepted extension is tried in declaration order; a name that
/// already carries the extension is used as written. The bare name comes
/// last, and only when the argument allows it.
pub fn candidate_names(name: &str, argument: &FileArgument) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::with_capacity(argument.extensions.len() + 1);

    for extension in &argument.extensions {
        let suffix = format!(".{}", extension);
        let candidate = if name.ends_with(&suffix) {
            name.to_string()
        } else {
            format!("{}{}", name, suffix)
        };
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }

    if argument.allow_bare && !candidates.iter().any(|c| c == name) {
        candidates.push(name.to_string());
    }

    candidates
}

/// Looks files up on the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskLookup;

impl FileLookup for DiskLookup {
    fn find_file(&self, directory: &Path, name: &str, argument: &FileArgument) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }

        for candidate in candidate_names(name, argument) {
            let path = directory.join(&candidate);
            if path.is_file() {
                log::trace!("Found '{}' as '{}'", name, path.display());
                return Some(path);
            }
        }

        log::trace!(
            "No file for '{}' in '{}' (extensions: {:?})",
            name,
            directory.display(),
            argument.extensions
        );
        None
    }
}
