// src/cli/init.rs — First-time setup: config file and API key

use std::io::IsTerminal;

use crate::auth::{self, AuthInfo, AuthStore};
use crate::infra::config::Config;
use crate::infra::paths;

/// Run the first-time setup wizard.
pub async fn run_init() -> anyhow::Result<()> {
    println!("tourney setup");
    println!();

    // 1. Create directories
    eprint!("  Creating directories... ");
    paths::ensure_dirs().await?;
    eprintln!("done");

    // 2. Default config
    let config_path = paths::config_file_path();
    let config = if config_path.exists() {
        println!("  Config: {} (already exists)", config_path.display());
        Config::load_from(&config_path)?
    } else {
        eprint!("  Writing default config... ");
        tokio::fs::write(&config_path, default_config_toml()?).await?;
        eprintln!("done");
        Config::default()
    };

    // 3. API key
    let provider = &config.oracle.provider;
    let env_var = auth::env_var_for(provider);
    if auth::resolve_api_key(provider).is_some() {
        println!("  API key for '{provider}': found");
    } else if std::io::stdin().is_terminal() {
        match inquire::Password::new(&format!("Paste your {provider} API key:"))
            .with_display_mode(inquire::PasswordDisplayMode::Masked)
            .without_confirmation()
            .with_help_message("Press Esc to skip")
            .prompt_skippable()
        {
            Ok(Some(key)) if !key.trim().is_empty() => {
                let mut store = AuthStore::load()?;
                store.set_and_save(provider, AuthInfo::api_key(key.trim()))?;
                println!("  Saved to {}", paths::auth_file_path().display());
            }
            Ok(_) => {
                println!("  Skipped. Set it later with:");
                println!("    export {env_var}=sk-...");
            }
            Err(e) => anyhow::bail!("Input cancelled: {e}"),
        }
    } else {
        println!("  No API key for '{provider}'. Set one with:");
        println!("    export {env_var}=sk-...");
    }

    println!();
    println!("Setup complete!");
    println!();
    println!("Tips:");
    println!("  tourney 8 sci-fi movies           Run a tournament");
    println!("  tourney --seed 42 16 poems        Reproducible bracket");
    println!("  tourney --json 4 board games      Full bracket as JSON");
    println!("  tourney cache                     Show cached decisions");

    Ok(())
}

/// The default config, as written by `tourney init`.
pub fn default_config_toml() -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(&Config::default())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses_back() {
        let text = default_config_toml().unwrap();
        assert!(text.contains("[oracle]"));
        assert!(text.contains("[tournament]"));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.oracle.model, Config::default().oracle.model);
        assert_eq!(parsed.tournament.criterion, "notable");
        assert_eq!(parsed.oracle.retry.max_retries, 3);
    }
}
