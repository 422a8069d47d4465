//! Run FpML trade-confirmation messages through the intake pipeline.
//!
//! ```text
//! fpml-intake message1.json [message2.json ...]
//! ```
//!
//! Each argument is a JSON `IncomingMessage`. Output is one JSON line per
//! message holding the processing result and the persisted-record
//! projection. `FPML_CONFIG` names an optional YAML config file; `RUST_LOG`
//! controls log filtering and `FPML_LOG_FORMAT=json` switches logs to JSON.
use std::env;
use std::error::Error;
use std::fs;
use std::sync::Arc;

use fpml_intake::{
    IncomingMessage, InMemoryDuplicateStore, Pipeline, PipelineConfig, TradeConfirmationEntity,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let cfg = match env::var("FPML_CONFIG") {
        Ok(path) => PipelineConfig::from_file(path)?,
        Err(_) => PipelineConfig::default(),
    };

    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        return Err("usage: fpml-intake <message.json>...".into());
    }

    let mut messages = Vec::with_capacity(paths.len());
    for path in &paths {
        let raw = fs::read_to_string(path)?;
        let message: IncomingMessage = serde_json::from_str(&raw)?;
        messages.push(message);
    }

    // Shared across the batch so resubmissions within one run are caught.
    let pipeline = Pipeline::with_store(cfg, Arc::new(InMemoryDuplicateStore::new()));
    let processed = pipeline.process_batch(&messages).await;

    for (message, processed) in messages.iter().zip(&processed) {
        let entity = TradeConfirmationEntity::project(message, processed, None);
        let line = json!({ "result": processed.result, "entity": entity });
        println!("{}", serde_json::to_string(&line)?);
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if env::var("FPML_LOG_FORMAT").is_ok_and(|format| format == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
}
