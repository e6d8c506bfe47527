use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp::lsp_types::*;
use tracing::debug;

use super::super::converters::{ImportSite, lsp_pos_to_offset, suggestion_to_lsp};
use crate::completion::{CompletionEngine, CompletionRequest, CursorPosition, EditorHandle};
use crate::workspace::Workspace;

pub async fn handle_completion(
    workspace: Arc<Workspace>,
    engine: Arc<RwLock<CompletionEngine>>,
    params: CompletionParams,
) -> Option<CompletionResponse> {
    let uri = &params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;
    let activated_manually = params
        .context
        .as_ref()
        .is_some_and(|ctx| ctx.trigger_kind == CompletionTriggerKind::INVOKED);

    let doc = workspace.documents.get(uri)?;
    let request = CompletionRequest {
        editor: EditorHandle::new(uri.as_str()),
        prefix: word_before(&doc.content, position).to_string(),
        source: Arc::clone(&doc.content),
        position: CursorPosition::new(position.line, position.character),
        activated_manually,
    };

    debug!(
        uri = %uri,
        line = position.line,
        character = position.character,
        prefix = %request.prefix,
        manual = activated_manually,
        "completion request"
    );

    let suggestions = {
        let registry = workspace.registry.read().await;
        engine.read().await.complete(&request, &registry)
    };

    if suggestions.is_empty() {
        debug!("no suggestions");
        return None;
    }

    let site = ImportSite::new(&doc.content);
    let items: Vec<CompletionItem> = suggestions
        .iter()
        .map(|s| suggestion_to_lsp(s, &site, &request.editor))
        .collect();

    debug!(count = items.len(), "returning completions");

    Some(CompletionResponse::List(CompletionList {
        is_incomplete: false,
        items,
    }))
}

/// Identifier characters directly before the cursor.
fn word_before(source: &str, position: Position) -> &str {
    let Some(offset) = lsp_pos_to_offset(source, position) else {
        return "";
    };
    let head = &source[..offset];
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_' || *c == '$')
        .last()
        .map_or(offset, |(i, _)| i);
    &head[start..]
}
