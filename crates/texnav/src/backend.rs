//
// backend.rs
//
// tower-lsp language server: document lifecycle and navigation requests
//

use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::Client;
use tower_lsp::LanguageServer;
use tower_lsp::LspService;
use tower_lsp::Server;

use crate::config::parse_config;
use crate::handlers;
use crate::state::{scan_workspace, WorldState};

pub struct Backend {
    client: Client,
    state: Arc<RwLock<WorldState>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(WorldState::default())),
        }
    }

    async fn register_file_watcher(&self) {
        let options = DidChangeWatchedFilesRegistrationOptions {
            watchers: vec![FileSystemWatcher {
                glob_pattern: GlobPattern::String("**/*.tex".to_string()),
                kind: None,
            }],
        };
        let registration = Registration {
            id: "texnav-watch-tex".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: serde_json::to_value(options).ok(),
        };
        if let Err(e) = self.client.register_capability(vec![registration]).await {
            log::warn!("Failed to register file watcher: {}", e);
        }
    }

    /// Scan the workspace folders into the inclusion graph, unless disabled.
    async fn index_workspace(&self) {
        // Copy out under a brief lock; scan without holding it
        let (folders, index_workspace) = {
            let state = self.state.read().await;
            (state.workspace_paths(), state.config.index_workspace)
        };

        if !index_workspace {
            log::info!("Workspace indexing disabled");
            return;
        }

        let scan = match tokio::task::spawn_blocking(move || scan_workspace(&folders)).await {
            Ok(scan) => scan,
            Err(e) => {
                log::warn!("Workspace scan failed: {}", e);
                return;
            }
        };

        self.state.write().await.apply_workspace_scan(scan);
        log::info!("Workspace initialization complete");
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        log::info!("Initializing texnav");

        let mut state = self.state.write().await;

        if let Some(folders) = params.workspace_folders {
            for folder in folders {
                log::info!("Adding workspace folder: {}", folder.uri);
                state.workspace_folders.push(folder.uri);
            }
        } else if let Some(root_uri) = params.root_uri {
            log::info!("Adding root URI as workspace folder: {}", root_uri);
            state.workspace_folders.push(root_uri);
        }

        if let Some(config) = params.initialization_options.as_ref().and_then(parse_config) {
            state.apply_config(config);
        }

        drop(state);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                document_link_provider: Some(DocumentLinkOptions {
                    resolve_provider: Some(false),
                    work_done_progress_options: Default::default(),
                }),
                definition_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: String::from("texnav"),
                version: Some(String::from(env!("CARGO_PKG_VERSION"))),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        log::info!("texnav initialized");

        self.register_file_watcher().await;
        self.index_workspace().await;
    }

    async fn shutdown(&self) -> Result<()> {
        log::info!("texnav shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        log::trace!("Opened {}", doc.uri);
        let mut state = self.state.write().await;
        state.open_document(doc.uri, &doc.text, Some(doc.version));
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        let mut state = self.state.write().await;
        state.change_document(&uri, params.content_changes, Some(version));
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let mut state = self.state.write().await;
        state.close_document(&params.text_document.uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        log::trace!("Configuration changed");
        match parse_config(&params.settings) {
            Some(config) => self.state.write().await.apply_config(config),
            None => log::warn!(
                "No texnav section in configuration settings, keeping existing configuration"
            ),
        }
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        log::trace!(
            "Received watched files change: {} changes",
            params.changes.len()
        );

        self.state
            .write()
            .await
            .apply_watched_changes(params.changes);
    }

    async fn document_link(&self, params: DocumentLinkParams) -> Result<Option<Vec<DocumentLink>>> {
        let state = self.state.read().await;
        Ok(handlers::document_link(&state, &params.text_document.uri))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let state = self.state.read().await;
        Ok(handlers::goto_definition(
            &state,
            &params.text_document_position_params.text_document.uri,
            params.text_document_position_params.position,
        ))
    }
}

pub async fn start_lsp() -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    use crate::navigation::paths::normalize_path;
    use crate::navigation::RootFinder;

    fn write(dir: &Path, rel: &str, text: &str) -> std::path::PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, text).unwrap();
        normalize_path(&path)
    }

    fn init_params(dir: &Path, options: Option<serde_json::Value>) -> InitializeParams {
        InitializeParams {
            workspace_folders: Some(vec![WorkspaceFolder {
                uri: Url::from_file_path(dir).unwrap(),
                name: "project".to_string(),
            }]),
            initialization_options: options,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_initialize_advertises_navigation() {
        let dir = TempDir::new().unwrap();
        let (service, _socket) = LspService::new(Backend::new);
        let backend = service.inner();

        let result = backend.initialize(init_params(dir.path(), None)).await.unwrap();
        assert_eq!(
            result.capabilities.text_document_sync,
            Some(TextDocumentSyncCapability::Kind(
                TextDocumentSyncKind::INCREMENTAL
            ))
        );
        assert_eq!(
            result.capabilities.definition_provider,
            Some(OneOf::Left(true))
        );
        assert_eq!(
            backend.state.read().await.workspace_folders,
            vec![Url::from_file_path(dir.path()).unwrap()]
        );
    }

    #[tokio::test]
    async fn test_index_workspace_builds_graph() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "main.tex", "\\documentclass{book}\\input{one}");
        let one = write(dir.path(), "one.tex", "");
        let (service, _socket) = LspService::new(Backend::new);
        let backend = service.inner();

        backend.initialize(init_params(dir.path(), None)).await.unwrap();
        backend.index_workspace().await;

        let state = backend.state.read().await;
        assert_eq!(state.inclusion.root_of(&one), main);
    }

    #[tokio::test]
    async fn test_index_workspace_disabled() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.tex", "\\documentclass{book}\\input{one}");
        let (service, _socket) = LspService::new(Backend::new);
        let backend = service.inner();

        let options = json!({ "texnav": { "indexWorkspace": false } });
        backend
            .initialize(init_params(dir.path(), Some(options)))
            .await
            .unwrap();
        backend.index_workspace().await;

        assert!(backend.state.read().await.inclusion.is_empty());
    }

    #[tokio::test]
    async fn test_configuration_without_section_keeps_config() {
        let dir = TempDir::new().unwrap();
        let (service, _socket) = LspService::new(Backend::new);
        let backend = service.inner();

        let options = json!({ "texnav": { "maxRootSearchDepth": 3 } });
        backend
            .initialize(init_params(dir.path(), Some(options)))
            .await
            .unwrap();
        backend
            .did_change_configuration(DidChangeConfigurationParams {
                settings: json!({ "editor": { "tabSize": 4 } }),
            })
            .await;

        assert_eq!(backend.state.read().await.config.max_root_search_depth, 3);
    }

    #[tokio::test]
    async fn test_watched_files_and_links() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "mystyle.sty", "");
        let chapter = write(dir.path(), "chapters/one.tex", "\\usepackage{mystyle}");
        let (service, _socket) = LspService::new(Backend::new);
        let backend = service.inner();
        backend.initialize(init_params(dir.path(), None)).await.unwrap();

        let chapter_uri = Url::from_file_path(&chapter).unwrap();
        backend
            .did_open(DidOpenTextDocumentParams {
                text_document: TextDocumentItem::new(
                    chapter_uri.clone(),
                    "latex".to_string(),
                    1,
                    "\\usepackage{mystyle}".to_string(),
                ),
            })
            .await;

        let main = write(dir.path(), "main.tex", "\\documentclass{book}\\input{chapters/one}");
        backend
            .did_change_watched_files(DidChangeWatchedFilesParams {
                changes: vec![FileEvent::new(
                    Url::from_file_path(&main).unwrap(),
                    FileChangeType::CREATED,
                )],
            })
            .await;
        assert_eq!(backend.state.read().await.inclusion.root_of(&chapter), main);

        let links = backend
            .document_link(DocumentLinkParams {
                text_document: TextDocumentIdentifier::new(chapter_uri.clone()),
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(
            links[0].target,
            Some(Url::from_file_path(dir.path().join("mystyle.sty")).unwrap())
        );

        backend
            .did_change_watched_files(DidChangeWatchedFilesParams {
                changes: vec![FileEvent::new(
                    Url::from_file_path(&main).unwrap(),
                    FileChangeType::DELETED,
                )],
            })
            .await;
        assert_eq!(
            backend.state.read().await.inclusion.root_of(&chapter),
            chapter
        );
    }

    #[tokio::test]
    async fn test_unknown_document_yields_no_links() {
        let (service, _socket) = LspService::new(Backend::new);
        let backend = service.inner();
        let response = backend
            .document_link(DocumentLinkParams {
                text_document: TextDocumentIdentifier::new(
                    Url::parse("file:///nowhere/main.tex").unwrap(),
                ),
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            })
            .await
            .unwrap();
        assert!(response.is_none());
    }
}
