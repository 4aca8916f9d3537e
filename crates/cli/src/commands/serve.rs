//! `tablechat serve`: Start the web UI and HTTP API.

use std::path::PathBuf;

use super::{CmdResult, config_file, load_config, require_generator, require_knowledge};

pub async fn run(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    knowledge: Option<PathBuf>,
) -> CmdResult<()> {
    let file = config_file(config_path.clone());
    let mut config = load_config(config_path, knowledge)?;
    if let Some(port) = port {
        config.gateway.port = port;
    }

    // Both are fatal before any request is accepted.
    let generator = require_generator(&config, &file)?;
    let blob = require_knowledge(&config)?;

    println!("💬 TableChat");
    println!("   Open:      http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.model);
    println!(
        "   Knowledge: {} ({} rows, ~{} tokens per request)",
        blob.source().display(),
        blob.row_count(),
        blob.estimated_tokens()
    );

    tablechat_gateway::serve(&config, generator, blob).await
}
