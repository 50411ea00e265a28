use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use routine_core::config::{Config, WarnLevel};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        return print_json(&config);
    }

    let s = &config.stats;
    let c = &config.coach;
    println!("stats:");
    println!("  window_days:    {}", s.window_days);
    println!("  recent_window:  {}", s.recent_window);
    println!("  trend_weeks:    {}", s.trend_weeks);
    println!("  series_days:    {}", s.series_days);
    println!("coach:");
    println!("  base_url:       {}", c.base_url);
    println!("  model:          {}", c.model);
    println!("  timeout_secs:   {}", c.timeout_secs);
    println!("  key_failure_threshold: {}", c.key_failure_threshold);
    println!(
        "  chat:       temperature {} · max tokens {}",
        c.chat.temperature, c.chat.max_output_tokens
    );
    println!(
        "  reflection: temperature {} · max tokens {}",
        c.reflection.temperature, c.reflection.max_output_tokens
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}
