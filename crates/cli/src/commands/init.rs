//! `tablechat init`: Write a default config file.

use std::path::PathBuf;

use super::{CmdResult, config_file};
use tablechat_config::AppConfig;

pub async fn run(config_path: Option<PathBuf>, force: bool) -> CmdResult<()> {
    let path = config_file(config_path);

    println!("💬 TableChat — Setup");
    println!("====================\n");

    if path.exists() && !force {
        println!("⚠️  Config already exists at: {}", path.display());
        println!("   Edit it manually, or re-run with --force to overwrite.\n");
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        }
    }

    std::fs::write(&path, AppConfig::default_toml())?;
    println!("✅ Wrote config: {}", path.display());

    println!("\nNext steps:");
    println!("  1. Put your key in .env:   GOOGLE_API_KEY=AIza...");
    println!("  2. Place your knowledge CSV (columns User_query, Chatbot_response)");
    println!("     at the `knowledge.path` set in the config.");
    println!("  3. Run `tablechat check`, then `tablechat serve`.\n");

    Ok(())
}
