//
// navigation/resolver.rs
//
// Resolving a file-referencing command to the file it points at
//

use std::path::{Path, PathBuf};

use super::contract::{CommandTable, FileArgument};
use super::inclusion::RootFinder;
use super::lookup::FileLookup;
use super::marker::NavigationMarker;
use super::roots::candidate_roots;
use crate::latex::{CommandInvocation, RequiredParam};

/// Read-only collaborators for resolution. Cheap to build per request.
pub struct ResolveContext<'a> {
    pub table: &'a CommandTable,
    pub root_finder: &'a dyn RootFinder,
    pub source_roots: &'a [PathBuf],
    pub lookup: &'a dyn FileLookup,
}

/// Strip exactly one leading and one trailing delimiter character.
///
/// No trimming or unescaping happens. Text shorter than two characters
/// yields an empty string.
pub fn strip_delimiters(text: &str) -> &str {
    let mut chars = text.chars();
    if chars.next().is_none() || chars.next_back().is_none() {
        return "";
    }
    chars.as_str()
}

/// The file argument and the parameter that carries it, if the invocation
/// references a file at all.
pub fn select_argument<'i, 't>(
    invocation: &'i CommandInvocation,
    table: &'t CommandTable,
) -> Option<(&'t FileArgument, &'i RequiredParam)> {
    let Some(command) = invocation.command_name() else {
        log::trace!("Skipping invocation without a readable name");
        return None;
    };
    let arguments = table.file_arguments(command)?;
    let Some(argument) = arguments.first() else {
        log::trace!("Command '{}' declares no file arguments", command);
        return None;
    };
    let Some(param) = invocation.required.get(argument.parameter) else {
        log::trace!(
            "Command '{}' has no required parameter {}",
            command,
            argument.parameter
        );
        return None;
    };
    Some((argument, param))
}

/// The first root, in order, where `name` resolves to an existing file.
pub fn search_roots(
    roots: &[PathBuf],
    name: &str,
    argument: &FileArgument,
    lookup: &dyn FileLookup,
) -> Option<PathBuf> {
    roots
        .iter()
        .find_map(|root| lookup.find_file(root, name, argument))
}

/// Resolve `invocation` (appearing in `containing_file`) to a file on disk.
pub fn resolve_reference(
    invocation: &CommandInvocation,
    containing_file: &Path,
    ctx: &ResolveContext<'_>,
) -> Option<PathBuf> {
    let (argument, param) = select_argument(invocation, ctx.table)?;
    resolve_argument(invocation, argument, param, containing_file, ctx)
}

fn resolve_argument(
    invocation: &CommandInvocation,
    argument: &FileArgument,
    param: &RequiredParam,
    containing_file: &Path,
    ctx: &ResolveContext<'_>,
) -> Option<PathBuf> {
    let name = strip_delimiters(&param.text);

    let roots = candidate_roots(containing_file, ctx.root_finder, ctx.source_roots)?;
    let found = search_roots(&roots, name, argument, ctx.lookup);

    match &found {
        Some(path) => log::trace!(
            "Resolved {}{} to '{}'",
            invocation.name,
            param.text,
            path.display()
        ),
        None => log::trace!(
            "No file for {}{} in {} root(s)",
            invocation.name,
            param.text,
            roots.len()
        ),
    }
    found
}

/// Append a marker for `invocation` to `result` if it references an existing file.
///
/// Every unmet precondition and every failed lookup leaves `result` untouched.
pub fn collect_navigation_markers(
    invocation: &CommandInvocation,
    containing_file: &Path,
    ctx: &ResolveContext<'_>,
    result: &mut Vec<NavigationMarker>,
) {
    let Some((argument, param)) = select_argument(invocation, ctx.table) else {
        return;
    };
    if let Some(target) = resolve_argument(invocation, argument, param, containing_file, ctx) {
        result.push(NavigationMarker::new(target, invocation, param.range));
    }
}

/// Markers for every invocation of a document, in document order.
pub fn document_markers(
    invocations: &[CommandInvocation],
    containing_file: &Path,
    ctx: &ResolveContext<'_>,
) -> Vec<NavigationMarker> {
    let mut markers = Vec::new();
    for invocation in invocations {
        collect_navigation_markers(invocation, containing_file, ctx, &mut markers);
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latex::scan_commands;
    use crate::navigation::inclusion::IdentityRoot;
    use crate::navigation::lookup::DiskLookup;
    use crate::navigation::marker::IconKey;
    use std::fs;
    use tempfile::TempDir;

    fn invocation(text: &str) -> CommandInvocation {
        scan_commands(text).remove(0)
    }

    fn markers_for(
        text: &str,
        containing_file: &Path,
        table: &CommandTable,
        root_finder: &dyn RootFinder,
        source_roots: &[PathBuf],
    ) -> Vec<NavigationMarker> {
        let ctx = ResolveContext {
            table,
            root_finder,
            source_roots,
            lookup: &DiskLookup,
        };
        let mut result = Vec::new();
        collect_navigation_markers(&invocation(text), containing_file, &ctx, &mut result);
        result
    }

    #[test]
    fn test_strip_delimiters() {
        assert_eq!(strip_delimiters("{foo}"), "foo");
        assert_eq!(strip_delimiters("{ foo }"), " foo ");
        assert_eq!(strip_delimiters("{}"), "");
        assert_eq!(strip_delimiters("{"), "");
        assert_eq!(strip_delimiters(""), "");
        assert_eq!(strip_delimiters("{é}"), "é");
    }

    #[test]
    fn test_package_name_extracted() {
        let table = CommandTable::builtin();
        let inv = invocation(r"\usepackage{foo}");
        let (argument, param) = select_argument(&inv, &table).unwrap();
        assert_eq!(strip_delimiters(&param.text), "foo");
        assert_eq!(argument.extensions, vec!["sty".to_string()]);
    }

    #[test]
    fn test_no_contract_no_marker() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Intro.tex"), "").unwrap();
        fs::write(dir.path().join("Intro.sty"), "").unwrap();

        let markers = markers_for(
            r"\section{Intro}",
            &dir.path().join("main.tex"),
            &CommandTable::builtin(),
            &IdentityRoot,
            &[],
        );
        assert!(markers.is_empty());
    }

    #[test]
    fn test_empty_contract_no_marker() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("foo.tex"), "").unwrap();

        let mut table = CommandTable::empty();
        table.insert("mycmd", Vec::new());
        let markers = markers_for(
            r"\mycmd{foo}",
            &dir.path().join("main.tex"),
            &table,
            &IdentityRoot,
            &[],
        );
        assert!(markers.is_empty());
    }

    #[test]
    fn test_no_required_parameter_no_marker() {
        let dir = TempDir::new().unwrap();
        let markers = markers_for(
            r"\usepackage[utf8]",
            &dir.path().join("main.tex"),
            &CommandTable::builtin(),
            &IdentityRoot,
            &[],
        );
        assert!(markers.is_empty());
    }

    #[test]
    fn test_search_order_respected() {
        let r1 = TempDir::new().unwrap();
        let r2 = TempDir::new().unwrap();
        let doc_dir = TempDir::new().unwrap();
        fs::write(r2.path().join("foo.sty"), "").unwrap();

        let roots = vec![r1.path().to_path_buf(), r2.path().to_path_buf()];
        let markers = markers_for(
            r"\usepackage{foo}",
            &doc_dir.path().join("main.tex"),
            &CommandTable::builtin(),
            &IdentityRoot,
            &roots,
        );
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].target, r2.path().join("foo.sty"));
        assert_eq!(markers[0].icon, IconKey::Style);
        assert_eq!(markers[0].tooltip, "Go to referenced file 'foo.sty'");
    }

    #[test]
    fn test_later_extension_found() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("foo.cls"), "").unwrap();

        let mut table = CommandTable::empty();
        table.insert("usepackage", vec![FileArgument::new("", &["sty", "cls"])]);
        let markers = markers_for(
            r"\usepackage{foo}",
            &dir.path().join("main.tex"),
            &table,
            &IdentityRoot,
            &[],
        );
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].target, dir.path().join("foo.cls"));
        assert_eq!(markers[0].icon, IconKey::Class);
    }

    #[test]
    fn test_root_document_directory_wins() {
        let project = TempDir::new().unwrap();
        let source_root = TempDir::new().unwrap();
        fs::create_dir(project.path().join("chapters")).unwrap();
        fs::write(project.path().join("foo.sty"), "root").unwrap();
        fs::write(source_root.path().join("foo.sty"), "later").unwrap();

        let main = project.path().join("main.tex");
        let finder = move |_: &Path| main.clone();
        let markers = markers_for(
            r"\usepackage{foo}",
            &project.path().join("chapters/one.tex"),
            &CommandTable::builtin(),
            &finder,
            &[source_root.path().to_path_buf()],
        );
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].target, project.path().join("foo.sty"));
    }

    #[test]
    fn test_missing_file_no_marker() {
        let r1 = TempDir::new().unwrap();
        let r2 = TempDir::new().unwrap();
        let markers = markers_for(
            r"\input{nowhere}",
            &r1.path().join("main.tex"),
            &CommandTable::builtin(),
            &IdentityRoot,
            &[r2.path().to_path_buf()],
        );
        assert!(markers.is_empty());
    }

    #[test]
    fn test_marker_ranges() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("refs.bib"), "").unwrap();

        let inv = invocation(r"\bibliography{refs}");
        let markers = markers_for(
            r"\bibliography{refs}",
            &dir.path().join("main.tex"),
            &CommandTable::builtin(),
            &IdentityRoot,
            &[],
        );
        assert_eq!(markers[0].origin, inv.range);
        assert_eq!(markers[0].argument_range, inv.required[0].range);
        assert_eq!(markers[0].icon, IconKey::Bibliography);
    }

    #[test]
    fn test_document_markers_in_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.tex"), "").unwrap();
        fs::write(dir.path().join("b.sty"), "").unwrap();

        let text = "\\input{a}\n\\section{x}\n\\usepackage{b}\n\\input{missing}";
        let table = CommandTable::builtin();
        let ctx = ResolveContext {
            table: &table,
            root_finder: &IdentityRoot,
            source_roots: &[],
            lookup: &DiskLookup,
        };
        let markers = document_markers(&scan_commands(text), &dir.path().join("main.tex"), &ctx);
        let targets: Vec<_> = markers.iter().map(|m| m.target.clone()).collect();
        assert_eq!(targets, vec![dir.path().join("a.tex"), dir.path().join("b.sty")]);
    }

    struct NeverFound;

    impl FileLookup for NeverFound {
        fn find_file(&self, _: &Path, _: &str, _: &FileArgument) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn test_custom_lookup_is_consulted() {
        let table = CommandTable::builtin();
        let ctx = ResolveContext {
            table: &table,
            root_finder: &IdentityRoot,
            source_roots: &[],
            lookup: &NeverFound,
        };
        let inv = invocation(r"\usepackage{foo}");
        assert!(resolve_reference(&inv, Path::new("/t/main.tex"), &ctx).is_none());
    }

    #[derive(Default)]
    struct CountingLookup {
        calls: std::cell::Cell<usize>,
    }

    impl FileLookup for CountingLookup {
        fn find_file(&self, _: &Path, _: &str, _: &FileArgument) -> Option<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            None
        }
    }

    #[test]
    fn test_marker_collection_searches_each_root_once() {
        let table = CommandTable::builtin();
        let lookup = CountingLookup::default();
        let source_roots = vec![PathBuf::from("/r1"), PathBuf::from("/r2")];
        let ctx = ResolveContext {
            table: &table,
            root_finder: &IdentityRoot,
            source_roots: &source_roots,
            lookup: &lookup,
        };
        let mut result = Vec::new();
        collect_navigation_markers(
            &invocation(r"\usepackage{foo}"),
            Path::new("/t/main.tex"),
            &ctx,
            &mut result,
        );
        assert!(result.is_empty());
        // Containing directory plus two source roots
        assert_eq!(lookup.calls.get(), 3);
    }
}
