//! Subcommand implementations, plus the startup steps they share.

pub mod chat;
pub mod check;
pub mod init;
pub mod serve;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tablechat_config::{API_KEY_VARS, AppConfig};
use tablechat_core::Generator;
use tablechat_knowledge::{KnowledgeBlob, KnowledgeCache};

type CmdResult<T> = Result<T, Box<dyn std::error::Error>>;

fn config_file(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(AppConfig::config_path)
}

/// Load config (file + environment) and apply a `--knowledge` override.
pub(crate) fn load_config(
    path: Option<PathBuf>,
    knowledge: Option<PathBuf>,
) -> CmdResult<AppConfig> {
    let path = config_file(path);
    let mut config =
        AppConfig::load_with_env(&path).map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(knowledge) = knowledge {
        config.knowledge.path = knowledge;
    }
    Ok(config)
}

/// Build the generator, explaining how to configure a key when none is set.
pub(crate) fn require_generator(
    config: &AppConfig,
    config_path: &Path,
) -> CmdResult<Arc<dyn Generator>> {
    match tablechat_providers::build_from_config(config) {
        Ok(generator) => Ok(generator),
        Err(e) => {
            eprintln!();
            eprintln!("  ERROR: No API key configured!");
            eprintln!();
            eprintln!("  Set one of these environment variables (or put it in .env):");
            for var in API_KEY_VARS {
                eprintln!("    {var}=AIza...");
            }
            eprintln!();
            eprintln!("  Or add `api_key` to your config file:");
            eprintln!("    {}", config_path.display());
            eprintln!();
            Err(e.into())
        }
    }
}

/// Load the knowledge table. Failure is fatal and names the file.
pub(crate) fn require_knowledge(config: &AppConfig) -> CmdResult<Arc<KnowledgeBlob>> {
    let cache = KnowledgeCache::new(&config.knowledge.path);
    match cache.get() {
        Ok(blob) => {
            tracing::info!(
                path = %blob.source().display(),
                rows = blob.row_count(),
                estimated_tokens = blob.estimated_tokens(),
                "Knowledge table loaded"
            );
            Ok(blob)
        }
        Err(e) => {
            eprintln!();
            eprintln!("  ERROR: {e}");
            eprintln!("  Check the file name, or pass --knowledge <path>.");
            eprintln!();
            Err(e.into())
        }
    }
}
