use anyhow::{Context, Result};
use rrqueue_core::backend::{Backend, Delay, PushOptions};
use rrqueue_core::store::rotation_key;
use rrqueue_core::QueueManager;
use rrqueue_types::{AppConfig, ConnectionConfig, IndexStoreConfig};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

use crate::cli::Target;

/// Parse a payload argument: JSON when it parses, a plain string otherwise.
pub fn parse_payload(raw: Option<&str>) -> Value {
    match raw {
        None => Value::String(String::new()),
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

fn parse_options(raw: Option<&str>) -> Result<PushOptions> {
    match raw {
        None => Ok(PushOptions::new()),
        Some(raw) => serde_json::from_str(raw).context("--options must be a JSON object"),
    }
}

fn resolve(manager: &QueueManager, target: &Target) -> Result<Arc<dyn Backend>> {
    Ok(manager.connection_or_default(target.connection.as_deref())?)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn handle_push(
    manager: &QueueManager,
    job: &str,
    payload: Option<&str>,
    repeat: u32,
    target: &Target,
) -> Result<()> {
    let backend = resolve(manager, target)?;
    let payload = parse_payload(payload);

    let mut results = Vec::new();
    for _ in 0..repeat {
        results.push(backend.push(job, &payload, target.queue.as_deref()).await?);
    }
    print_json(&json!({ "connection": backend.connection_name(), "results": results }))
}

pub async fn handle_push_raw(
    manager: &QueueManager,
    payload: &str,
    options: Option<&str>,
    target: &Target,
) -> Result<()> {
    let backend = resolve(manager, target)?;
    let options = parse_options(options)?;
    let result = backend.push_raw(payload, target.queue.as_deref(), &options).await?;
    print_json(&json!({ "connection": backend.connection_name(), "result": result }))
}

pub async fn handle_later(
    manager: &QueueManager,
    delay: u64,
    job: &str,
    payload: Option<&str>,
    target: &Target,
) -> Result<()> {
    let backend = resolve(manager, target)?;
    let payload = parse_payload(payload);
    let result =
        backend.later(Delay::Seconds(delay), job, &payload, target.queue.as_deref()).await?;
    print_json(&json!({ "connection": backend.connection_name(), "result": result }))
}

pub async fn handle_size(manager: &QueueManager, target: &Target) -> Result<()> {
    let backend = resolve(manager, target)?;
    let size = backend.size(target.queue.as_deref()).await?;
    print_json(&json!({ "connection": backend.connection_name(), "size": size }))
}

pub async fn handle_pop(manager: &QueueManager, target: &Target) -> Result<()> {
    let backend = resolve(manager, target)?;
    let job = backend.pop(target.queue.as_deref()).await?;
    print_json(&json!({ "connection": backend.connection_name(), "job": job }))
}

pub async fn handle_status(manager: &QueueManager, connection: Option<&str>) -> Result<()> {
    let name = connection.unwrap_or(manager.default_connection_name());
    let rr = manager.round_robin(name)?;

    let stored = manager.store().get(&rotation_key(name), 0).await?;
    let next = rr.current_backend().await?;
    print_json(&json!({
        "connection": name,
        "targets": rr.connections(),
        "queue": rr.default_queue(),
        "rotation": rr.rotation_mode().to_string(),
        "atomic": rr.rotation_is_atomic(),
        "store": rr.store_kind(),
        "stored_index": stored,
        "next": next,
    }))
}

/// Round-robin over two memory connections with a file-backed index.
pub fn example_config(config_path: &Path) -> AppConfig {
    let mut config = AppConfig::new();
    config.queue.default = "rr".to_string();
    config.queue.connections.insert("rr".into(), ConnectionConfig::round_robin(&["q1", "q2"], "default"));
    config.queue.connections.insert("q1".into(), ConnectionConfig::memory());
    config.queue.connections.insert("q2".into(), ConnectionConfig::memory());
    config.store = IndexStoreConfig::File { path: config_path.with_file_name("rotation.json") };
    config
}

pub fn handle_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", config_path.display());
    }
    rrqueue_core::config::save_config(config_path, &example_config(config_path))?;
    println!("Wrote {}", config_path.display());
    Ok(())
}
