//! CLI entrypoint for talkback
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use talkback_application::{
    ChatStorage, ChatTransport, ConversationLogger, NoConversationLogger, SendMessageUseCase,
    SessionStore,
};
use talkback_domain::Severity;
use talkback_infrastructure::{
    ConfigLoader, CozeHttpTransport, FileConfig, JsonFileStorage, JsonlConversationLogger,
    MemoryStorage, MockStreamTransport,
};
use talkback_presentation::{ChatRepl, Cli, ReplConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    if cli.mock {
        config.transport.mock = true;
    }

    for issue in config.validate() {
        match issue.severity {
            Severity::Error => eprintln!("config error: {}", issue.message),
            Severity::Warning => eprintln!("config warning: {}", issue.message),
        }
    }
    config.check()?;

    info!("Starting talkback");

    // === Dependency Injection ===
    let storage = build_storage(&cli, &config);
    let transport = build_transport(&config)?;
    let logger = build_logger(&config);

    let mut store = SessionStore::new(storage)
        .with_default_settings(config.api.default_settings())
        .with_stream_persistence(config.storage.stream_persistence);
    store.initialize();

    let use_case = SendMessageUseCase::new(transport)
        .with_conversation_logger(logger)
        .with_user_id(config.api.user_id.clone());

    let repl_config = ReplConfig {
        show_progress: !cli.quiet && config.repl.show_progress,
        history_file: config.repl.history_path(),
        prompt: config.repl.prompt.clone(),
    };
    let mut repl = ChatRepl::new(store, use_case).with_config(repl_config);

    // Single message mode
    if let Some(message) = cli.message {
        let output = repl.send(&message).await;
        repl.into_store().shutdown();
        if output.is_none() {
            bail!("No reply received");
        }
        return Ok(());
    }

    // Chat mode
    let result = repl.run().await;
    repl.into_store().shutdown();
    result?;

    Ok(())
}

fn build_storage(cli: &Cli, config: &FileConfig) -> Arc<dyn ChatStorage> {
    if cli.ephemeral {
        info!("Keeping chats in memory only");
        return Arc::new(MemoryStorage::new());
    }

    let dir: Option<PathBuf> = cli.data_dir.clone().or_else(|| config.storage.data_dir());
    match dir {
        Some(dir) => {
            info!("Storing chats in {}", dir.display());
            Arc::new(JsonFileStorage::new(dir))
        }
        None => {
            warn!("No data directory available, chats will not be saved");
            Arc::new(MemoryStorage::new())
        }
    }
}

fn build_transport(config: &FileConfig) -> Result<Arc<dyn ChatTransport>> {
    if config.transport.mock {
        info!("Using mock transport");
        let transport = MockStreamTransport::new()
            .with_delay(Duration::from_millis(config.transport.mock_delay_ms));
        return Ok(Arc::new(transport));
    }

    let timeout = config.api.timeout_secs.map(Duration::from_secs);
    Ok(Arc::new(CozeHttpTransport::with_timeout(timeout)?))
}

fn build_logger(config: &FileConfig) -> Arc<dyn ConversationLogger> {
    match config
        .log
        .conversation_log_path()
        .and_then(JsonlConversationLogger::open)
    {
        Some(logger) => {
            info!("Conversation log: {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoConversationLogger),
    }
}
