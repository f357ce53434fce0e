//
// config.rs
//
// Server configuration
//

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::navigation::{CommandTable, FileArgument};

/// A user-declared file-referencing command from the `commands` setting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSetting {
    pub extensions: Vec<String>,
    #[serde(default)]
    pub allow_bare: bool,
}

/// Navigation configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexnavConfig {
    /// Extra directories searched after the workspace folders
    pub source_roots: Vec<PathBuf>,
    /// Search relative to the root document's directory (via the inclusion graph)
    pub resolve_root_document: bool,
    /// Bound on the inclusion-graph walk
    pub max_root_search_depth: usize,
    /// Whether to scan workspace folders for .tex files at startup
    pub index_workspace: bool,
    /// Extra or overriding command contracts, in settings order
    pub commands: Vec<(String, CommandSetting)>,
}

impl Default for TexnavConfig {
    fn default() -> Self {
        Self {
            source_roots: Vec::new(),
            resolve_root_document: true,
            max_root_search_depth: 16,
            index_workspace: true,
            commands: Vec::new(),
        }
    }
}

impl TexnavConfig {
    /// The built-in command table with the configured commands applied on top.
    pub fn command_table(&self) -> CommandTable {
        let mut table = CommandTable::builtin();
        for (name, setting) in &self.commands {
            let name = name.trim_start_matches('\\');
            let extensions: Vec<&str> = setting.extensions.iter().map(String::as_str).collect();
            let mut argument = FileArgument::new("", &extensions);
            argument.allow_bare = setting.allow_bare;
            table.insert(name, vec![argument]);
        }
        table
    }

    /// Workspace folders in client order, then the configured source roots.
    ///
    /// Relative source roots resolve against the first workspace folder and
    /// are dropped when there is none.
    pub fn source_roots(&self, workspace_folders: &[PathBuf]) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = workspace_folders.to_vec();
        for root in &self.source_roots {
            if root.is_absolute() {
                roots.push(root.clone());
            } else if let Some(base) = workspace_folders.first() {
                roots.push(crate::navigation::paths::normalize_path(&base.join(root)));
            } else {
                log::warn!(
                    "Ignoring relative source root '{}': no workspace folder",
                    root.display()
                );
            }
        }
        roots
    }
}

/// Parse configuration from LSP settings.
///
/// Reads the top-level `texnav` section. Only fields present in the JSON are
/// applied; absent fields keep their defaults. Returns `None` if the section
/// is missing.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// let settings = json!({
///     "texnav": {
///         "sourceRoots": ["/usr/share/texmf/tex/latex"],
///         "resolveRootDocument": false,
///         "commands": { "loadstyle": { "extensions": ["sty"] } }
///     }
/// });
/// let cfg = texnav::config::parse_config(&settings).unwrap();
/// assert!(!cfg.resolve_root_document);
/// assert_eq!(cfg.commands.len(), 1);
/// ```
pub fn parse_config(settings: &serde_json::Value) -> Option<TexnavConfig> {
    let section = settings.get("texnav")?;
    let mut config = TexnavConfig::default();

    if let Some(roots) = section.get("sourceRoots").and_then(|v| v.as_array()) {
        config.source_roots = roots
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();
    }
    if let Some(v) = section.get("resolveRootDocument").and_then(|v| v.as_bool()) {
        config.resolve_root_document = v;
    }
    if let Some(v) = section.get("maxRootSearchDepth").and_then(|v| v.as_u64()) {
        config.max_root_search_depth = v as usize;
    }
    if let Some(v) = section.get("indexWorkspace").and_then(|v| v.as_bool()) {
        config.index_workspace = v;
    }
    if let Some(commands) = section.get("commands").and_then(|v| v.as_object()) {
        for (name, value) in commands {
            match serde_json::from_value::<CommandSetting>(value.clone()) {
                Ok(setting) => config.commands.push((name.clone(), setting)),
                Err(e) => log::warn!("Ignoring invalid command setting '{}': {}", name, e),
            }
        }
    }

    log::info!("texnav configuration:");
    log::info!("  source_roots: {:?}", config.source_roots);
    log::info!("  resolve_root_document: {}", config.resolve_root_document);
    log::info!("  max_root_search_depth: {}", config.max_root_search_depth);
    log::info!("  index_workspace: {}", config.index_workspace);
    log::info!("  commands: {}", config.commands.len());

    Some(config)
}

/// Whether `path` looks like a LaTeX source file.
pub fn is_latex_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tex"))
}
