//
// navigation/paths.rs
//
// Path normalization and URI conversion
//

use std::path::{Component, Path, PathBuf};
use tower_lsp::lsp_types::Url;

/// Normalize a path by resolving `.` and `..` components lexically.
///
/// The file system is not consulted, so symlinks are left alone.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                // Only pop Normal segments; RootDir and Prefix stay
                let last = components.last().copied();
                match last {
                    Some(Component::Normal(_)) => {
                        components.pop();
                    }
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                    _ => components.push(component),
                }
            }
            Component::CurDir => {}
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Join `relative` onto `base` and normalize the result.
pub fn join_normalized(base: &Path, relative: &str) -> PathBuf {
    normalize_path(&base.join(relative))
}

pub fn path_to_uri(path: &Path) -> Option<Url> {
    Url::from_file_path(path).ok()
}

pub fn uri_to_path(uri: &Url) -> Option<PathBuf> {
    uri.to_file_path().ok().map(|p| normalize_path(&p))
}
