//! CLI command implementations
//!
//! Each command loads the configuration, opens the store, does one thing
//! and writes a single JSON response. `serve` is the only long-running one.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::config::{Config, API_KEY_ENV};
use crate::http_server::{AppState, HttpServer};
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::pipeline::EditPipeline;
use crate::render::AsciidoctorRenderer;
use crate::resolver::{ContentSource, DocumentResolver};
use crate::store::VariantStore;
use crate::upstream::{ChatTransformer, WhisperTranscriber};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Dispatch a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
        Command::List { config } => list(&config),
        Command::Show { config, name } => show(&config, &name),
        Command::Variants { config, name } => variants(&config, &name),
        Command::Revise {
            config,
            name,
            instruction,
        } => revise(&config, &name, &instruction),
    }
}

/// Create both document roots
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;

    if is_initialized(&config) {
        return Err(CliError::already_initialized());
    }

    for dir in [&config.base_dir, &config.variant_dir] {
        fs::create_dir_all(dir).map_err(|e| {
            CliError::config_error(format!("Failed to create directory {:?}: {}", dir, e))
        })?;
    }

    write_response(json!({
        "initialized": true,
        "base_dir": config.base_dir,
        "variant_dir": config.variant_dir,
    }))
}

/// Serve the HTTP API until interrupted
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    log_event(Event::BootStart);

    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    let store = open_store(&config)?;
    let settings = config.openai_settings(std::env::var(API_KEY_ENV).ok())?;
    let transformer = ChatTransformer::new(&settings, config.openai.chat_model.clone())?
        .with_max_tokens(config.openai.max_tokens);
    let transcriber = WhisperTranscriber::new(&settings, config.openai.transcription_model.clone())?;
    let renderer = AsciidoctorRenderer::new(config.renderer.command.clone(), &config.renderer.theme);

    let state = AppState::new(
        EditPipeline::with_config(store, Arc::new(transformer), config.pipeline_config()),
        Arc::new(renderer),
        Arc::new(transcriber),
    );
    let server = HttpServer::with_config(config.http.clone(), Arc::new(state));

    log_event_with_fields(Event::BootComplete, &[("addr", &server.socket_addr())]);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// List base documents
pub fn list(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    let documents = store.list_documents()?;
    write_response(json!({
        "total": documents.len(),
        "documents": documents,
    }))
}

/// Print the current content of one document
pub fn show(config_path: &Path, name: &str) -> CliResult<()> {
    let config = load_config(config_path)?;
    let resolver = DocumentResolver::new(open_store(&config)?);

    let doc = resolver.resolve(name)?;
    let variant = match &doc.source {
        ContentSource::Base => None,
        ContentSource::Variant(id) => Some(id.to_string()),
    };

    write_response(json!({
        "name": doc.name,
        "variant": variant,
        "content": String::from_utf8_lossy(&doc.content),
    }))
}

/// List the revisions of one document, oldest first
pub fn variants(config_path: &Path, name: &str) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    let variants = store.list_variants(name)?;
    let entries: Vec<_> = variants
        .iter()
        .map(|v| {
            json!({
                "id": v.id(),
                "created_at": v.created_at().format("%Y-%m-%dT%H:%M:%S").to_string(),
                "sequence": v.sequence(),
            })
        })
        .collect();

    write_response(json!({
        "name": name,
        "total": entries.len(),
        "variants": entries,
    }))
}

/// Revise one document by instruction
pub fn revise(config_path: &Path, name: &str, instruction: &str) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    let settings = config.openai_settings(std::env::var(API_KEY_ENV).ok())?;
    let transformer = ChatTransformer::new(&settings, config.openai.chat_model.clone())?
        .with_max_tokens(config.openai.max_tokens);
    let pipeline = EditPipeline::with_config(store, Arc::new(transformer), config.pipeline_config());

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to create tokio runtime: {}", e)))?;
    let id = rt.block_on(pipeline.revise(name, instruction))?;

    write_response(json!({
        "name": name,
        "variant": id,
    }))
}

fn load_config(path: &Path) -> CliResult<Config> {
    let config = Config::load(path)?;
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("path", &path.display().to_string())],
    );
    Ok(config)
}

fn is_initialized(config: &Config) -> bool {
    config.base_dir.is_dir() && config.variant_dir.is_dir()
}

/// Only the base root must exist; the store creates the revision root on open
fn open_store(config: &Config) -> CliResult<Arc<VariantStore>> {
    if !config.base_dir.is_dir() {
        return Err(CliError::not_initialized());
    }
    let store = VariantStore::open(&config.base_dir, &config.variant_dir, &config.extension)?;
    Ok(Arc::new(store))
}
