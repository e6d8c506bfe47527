use tower_lsp::lsp_types::*;

/// Command the client runs after inserting a class or constructor item.
pub const DID_INSERT_COMMAND: &str = "javaDotcomplete.didInsertSuggestion";

pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        completion_provider: Some(CompletionOptions {
            resolve_provider: Some(false),
            trigger_characters: Some(vec![".".into(), " ".into()]),
            all_commit_characters: None,
            completion_item: Some(CompletionOptionsCompletionItem {
                label_details_support: Some(true),
            }),
            work_done_progress_options: WorkDoneProgressOptions {
                work_done_progress: Some(true),
            },
        }),
        execute_command_provider: Some(ExecuteCommandOptions {
            commands: vec![DID_INSERT_COMMAND.into()],
            work_done_progress_options: WorkDoneProgressOptions::default(),
        }),
        ..Default::default()
    }
}
