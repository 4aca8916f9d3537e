//! `tablechat check`: Validate configuration and the knowledge table.

use std::path::PathBuf;

use super::{CmdResult, config_file, load_config};
use tablechat_config::API_KEY_VARS;
use tablechat_knowledge::KnowledgeCache;

pub async fn run(
    config_path: Option<PathBuf>,
    ping: bool,
    knowledge: Option<PathBuf>,
) -> CmdResult<()> {
    println!("🩺 TableChat Check");
    println!("==================\n");

    let mut issues = 0;

    let file = config_file(config_path.clone());
    if file.exists() {
        println!("  ✅ Config file: {}", file.display());
    } else {
        println!("  ⚠️  No config file at {} — using defaults", file.display());
    }

    let config = match load_config(config_path, knowledge) {
        Ok(config) => {
            println!("  ✅ Configuration valid (model: {})", config.model);
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            return Err("configuration is invalid".into());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ❌ No API key — set one of {}", API_KEY_VARS.join(", "));
        issues += 1;
    }

    match KnowledgeCache::new(&config.knowledge.path).get() {
        Ok(blob) => {
            println!(
                "  ✅ Knowledge table: {} ({} rows)",
                blob.source().display(),
                blob.row_count()
            );
            println!(
                "     ~{} tokens are resent with every question",
                blob.estimated_tokens()
            );
            if blob.is_empty() {
                println!("  ⚠️  No row has both User_query and Chatbot_response");
            }
        }
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    if ping {
        match tablechat_providers::build_from_config(&config) {
            Ok(generator) => match generator.health_check().await {
                Ok(true) => println!("  ✅ {} API reachable", generator.name()),
                Ok(false) => {
                    println!("  ❌ {} API answered with an error", generator.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ {} API check failed: {e}", generator.name());
                    issues += 1;
                }
            },
            Err(_) => println!("  ⚠️  Skipping API ping without an API key"),
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
        Ok(())
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
        Err(format!("{issues} issue(s) found").into())
    }
}
