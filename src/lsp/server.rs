use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

use super::capabilities::{DID_INSERT_COMMAND, server_capabilities};
use super::converters::parse_did_insert_arguments;
use super::handlers::completion::handle_completion;
use crate::completion::{CompletionConfig, CompletionEngine, EditorHandle};
use crate::language::{DEFAULT_REFRESH_DELAY, JavaTokenizer, TokenCache};
use crate::lsp::config::DotCompleteConfig;
use crate::workspace::{Workspace, document::Document};

/// Settings section looked up in `workspace/didChangeConfiguration`.
const SETTINGS_SECTION: &str = "javaDotcomplete";

pub struct Backend {
    client: Client,
    pub workspace: Arc<Workspace>,
    engine: Arc<RwLock<CompletionEngine>>,
    tokens: Arc<TokenCache>,
    pub config: RwLock<DotCompleteConfig>,
    root: RwLock<Option<PathBuf>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        let tokens = Arc::new(TokenCache::new(Arc::new(JavaTokenizer), DEFAULT_REFRESH_DELAY));
        let engine = CompletionEngine::new(tokens.clone(), CompletionConfig::default())
            .with_import_handler(|editor: &EditorHandle, class_name: &str| {
                debug!(editor = %editor, class = %class_name, "suggestion accepted, import sent as text edit");
            });

        Self {
            client,
            workspace: Arc::new(Workspace::new()),
            engine: Arc::new(RwLock::new(engine)),
            tokens,
            config: RwLock::new(DotCompleteConfig::default()),
            root: RwLock::new(None),
        }
    }

    fn is_supported(lang_id: &str) -> bool {
        lang_id == "java"
    }

    /// Populate the registry in the background (without blocking the response)
    async fn spawn_populate(&self) {
        let Some(root) = self.root.read().await.clone() else {
            warn!("no workspace root, registry stays empty");
            return;
        };
        let (classpath, workers) = {
            let config = self.config.read().await;
            (config.classpath_path(&root), config.collector_workers)
        };
        let workspace = Arc::clone(&self.workspace);
        let client = self.client.clone();

        tokio::spawn(async move {
            let token = "java-dotcomplete/registry";
            with_progress(&client, token, "Loading class descriptors", || async {
                match workspace.load_classpath(classpath.clone(), workers).await {
                    Ok(summary) => {
                        let msg = format!(
                            "✓ Registry: {} descriptor files, {} classes",
                            summary.files, summary.classes
                        );
                        client.log_message(MessageType::INFO, &msg).await;
                        Some(msg)
                    }
                    Err(e) => {
                        error!(classpath = %classpath.display(), error = %e, "registry population failed");
                        client
                            .log_message(
                                MessageType::WARNING,
                                format!("Could not load {}: {e:#}", classpath.display()),
                            )
                            .await;
                        None
                    }
                }
            })
            .await;
        });
    }

    /// Apply new settings; returns whether the registry source changed.
    pub async fn update_config(&self, params: serde_json::Value) -> bool {
        let params = match params {
            serde_json::Value::Object(mut map) if map.contains_key(SETTINGS_SECTION) => {
                map.remove(SETTINGS_SECTION).unwrap_or_default()
            }
            other => other,
        };
        let new_config = match serde_json::from_value::<DotCompleteConfig>(params) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "Failed to parse incoming config");
                return false;
            }
        };

        info!(config = ?new_config, "Config updated");
        self.engine
            .write()
            .await
            .set_config(new_config.completion_config());
        self.tokens.set_refresh_delay(new_config.token_refresh_delay());

        let mut config_guard = self.config.write().await;
        let source_changed = config_guard.classpath_file != new_config.classpath_file
            || config_guard.collector_workers != new_config.collector_workers;
        *config_guard = new_config;
        source_changed
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        info!("LSP initialize");

        if let Some(options) = params.initialization_options {
            self.update_config(options).await;
        }

        let root = params
            .root_uri
            .as_ref()
            .and_then(|u| u.to_file_path().ok())
            .or_else(|| {
                params
                    .workspace_folders
                    .iter()
                    .flatten()
                    .find_map(|folder| folder.uri.to_file_path().ok())
            });
        *self.root.write().await = root;

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "java-dotcomplete".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
            capabilities: server_capabilities(),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("LSP initialized");
        self.spawn_populate().await;
        self.client
            .log_message(MessageType::INFO, "java-dotcomplete ready")
            .await;
    }

    async fn shutdown(&self) -> LspResult<()> {
        info!("LSP shutdown");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let td = params.text_document;
        if !Self::is_supported(&td.language_id) {
            return;
        }

        info!(uri = %td.uri, "did_open");
        self.workspace
            .documents
            .open(Document::new(td.uri, td.version, td.text));
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = &params.text_document.uri;

        // Full sync: the last change holds the whole buffer
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };

        if self
            .workspace
            .documents
            .update(uri, params.text_document.version, change.text)
        {
            self.tokens.edited(&EditorHandle::new(uri.as_str()));
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let Some(text) = params.text else {
            return;
        };
        let uri = &params.text_document.uri;
        let Some(doc) = self.workspace.documents.get(uri) else {
            return;
        };
        if *doc.content != *text && self.workspace.documents.update(uri, doc.version, text) {
            self.tokens.edited(&doc.editor());
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = &params.text_document.uri;
        info!(uri = %uri, "did_close");
        self.workspace.documents.close(uri);
        self.tokens.remove(&EditorHandle::new(uri.as_str()));
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        if self.update_config(params.settings).await {
            info!("classpath settings changed, reloading registry");
            self.workspace.registry.write().await.clear();
            self.spawn_populate().await;
        }
    }

    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let response = handle_completion(
            Arc::clone(&self.workspace),
            Arc::clone(&self.engine),
            params,
        )
        .await;
        Ok(response)
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> LspResult<Option<serde_json::Value>> {
        if params.command != DID_INSERT_COMMAND {
            warn!(command = %params.command, "unknown command");
            return Ok(None);
        }
        match parse_did_insert_arguments(params.arguments) {
            Some((editor, suggestion)) => self
                .engine
                .read()
                .await
                .did_insert_suggestion(&editor, &suggestion),
            None => warn!("malformed did-insert arguments"),
        }
        Ok(None)
    }
}

/// Wrap `f` in a work-done progress; its result becomes the end message.
async fn with_progress<F, Fut>(client: &Client, token: &str, title: &str, f: F)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Option<String>>,
{
    let token = NumberOrString::String(token.to_string());
    if let Err(e) = client
        .send_request::<request::WorkDoneProgressCreate>(WorkDoneProgressCreateParams {
            token: token.clone(),
        })
        .await
    {
        debug!(error = %e, "client declined progress token");
    }

    let report = |value: WorkDoneProgress| ProgressParams {
        token: token.clone(),
        value: ProgressParamsValue::WorkDone(value),
    };

    client
        .send_notification::<notification::Progress>(report(WorkDoneProgress::Begin(
            WorkDoneProgressBegin {
                title: title.to_string(),
                cancellable: Some(false),
                message: None,
                percentage: None,
            },
        )))
        .await;

    let message = f().await;

    client
        .send_notification::<notification::Progress>(report(WorkDoneProgress::End(
            WorkDoneProgressEnd { message },
        )))
        .await;
}
