use tower_lsp::{LspService, Server};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_ENV: &str = "JAVA_DOTCOMPLETE_LOG";

#[tokio::main]
async fn main() {
    if std::env::args().skip(1).any(|arg| arg == "--version" || arg == "-V") {
        println!("java-dotcomplete {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    // stdout carries the protocol, logs go to stderr
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_thread_names(true),
        )
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "java-dotcomplete starting");

    let (service, socket) = LspService::build(java_dotcomplete::lsp::Backend::new).finish();

    info!("serving completion over stdio");
    Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
        .serve(service)
        .await;
}
