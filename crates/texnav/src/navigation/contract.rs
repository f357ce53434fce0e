//
// navigation/contract.rs
//
// File-argument contracts: which parameter of a command names a file
//

use std::collections::HashMap;

/// Declares that a required parameter of a command holds a file reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArgument {
    /// Logical name of the argument (may be empty)
    pub name: String,
    /// Index into the command's required parameters
    pub parameter: usize,
    /// Accepted extensions without the leading dot, in lookup order
    pub extensions: Vec<String>,
    /// Whether the name may also be tried exactly as written
    pub allow_bare: bool,
}

impl FileArgument {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            parameter: 0,
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            allow_bare: false,
        }
    }

    pub fn with_bare(mut self) -> Self {
        self.allow_bare = true;
        self
    }

    /// Whether `extension` is one of the accepted extensions (case-insensitive).
    pub fn accepts(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

/// Lookup table from command name (without backslash) to its file arguments.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    entries: HashMap<String, Vec<FileArgument>>,
}

impl CommandTable {
    /// An empty table. Use `builtin()` for the standard LaTeX commands.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard file-referencing commands.
    ///
    /// `usepackage` and `RequirePackage` get an unnamed `sty` argument, so
    /// package commands go through the same lookup as every other entry.
    pub fn builtin() -> Self {
        let mut table = Self::empty();

        let package = FileArgument::new("", &["sty"]);
        table.insert("usepackage", vec![package.clone()]);
        table.insert("RequirePackage", vec![package]);

        let source = FileArgument::new("sourceFile", &["tex"]);
        table.insert("input", vec![source.clone().with_bare()]);
        table.insert("include", vec![source.clone()]);
        table.insert("includeonly", vec![source.clone()]);
        table.insert("subfile", vec![source.clone()]);
        table.insert("includestandalone", vec![source]);

        let class = FileArgument::new("class", &["cls"]);
        table.insert("documentclass", vec![class.clone()]);
        table.insert("LoadClass", vec![class]);

        let bibliography = FileArgument::new("bibliographyfile", &["bib"]);
        table.insert("bibliography", vec![bibliography.clone()]);
        table.insert("addbibresource", vec![bibliography.with_bare()]);

        table.insert(
            "includegraphics",
            vec![FileArgument::new("imagefile", &["pdf", "png", "jpg", "jpeg", "eps"]).with_bare()],
        );

        table
    }

    /// Register (or replace) the file arguments of `command`.
    pub fn insert(&mut self, command: &str, arguments: Vec<FileArgument>) {
        self.entries.insert(command.to_string(), arguments);
    }

    pub fn file_arguments(&self, command: &str) -> Option<&[FileArgument]> {
        self.entries.get(command).map(Vec::as_slice)
    }

    /// First declared file argument, or `None` when the command has none.
    pub fn first_file_argument(&self, command: &str) -> Option<&FileArgument> {
        self.file_arguments(command)?.first()
    }

    /// Whether `command` pulls another LaTeX source file into the document.
    pub fn is_inclusion(&self, command: &str) -> bool {
        self.first_file_argument(command)
            .is_some_and(|arg| arg.accepts("tex"))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
