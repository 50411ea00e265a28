use super::Ctx;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use routine_core::coach::{self, KeyFailureTracker};
use routine_core::store::{keys, KeyValueStore};

#[derive(Subcommand)]
pub enum KeySubcommand {
    /// Store the coach API key (checked against the API first)
    Set {
        key: String,
        /// Store without the test request
        #[arg(long)]
        no_verify: bool,
    },

    /// Remove the stored key
    Clear,

    /// Show whether a key is stored and how many recent calls it failed
    Status,
}

pub fn run(ctx: &Ctx, subcmd: KeySubcommand) -> anyhow::Result<()> {
    match subcmd {
        KeySubcommand::Set { key, no_verify } => set(ctx, &key, no_verify),
        KeySubcommand::Clear => clear(ctx),
        KeySubcommand::Status => status(ctx),
    }
}

fn set(ctx: &Ctx, key: &str, no_verify: bool) -> anyhow::Result<()> {
    let mut store = ctx.store()?;
    let key = key.trim();
    if no_verify {
        coach::check_key_format(key)?;
    } else {
        let config = ctx.config()?;
        config
            .coach
            .client()
            .validate_api_key(key)
            .context("API key check failed")?;
    }

    store.set(keys::API_KEY, key)?;
    KeyFailureTracker::clear(&mut store)?;

    if ctx.json {
        print_json(&serde_json::json!({ "stored": true }))?;
    } else {
        println!("API key saved.");
    }
    Ok(())
}

fn clear(ctx: &Ctx) -> anyhow::Result<()> {
    let mut store = ctx.store()?;
    store.remove(keys::API_KEY)?;
    KeyFailureTracker::clear(&mut store)?;
    if ctx.json {
        print_json(&serde_json::json!({ "stored": false }))?;
    } else {
        println!("API key removed.");
    }
    Ok(())
}

fn mask(key: &str) -> String {
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{tail}")
}

fn status(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let config = ctx.config()?;
    let key = coach::stored_api_key(&store);
    let tracker = KeyFailureTracker::load(&store, config.coach.key_failure_threshold);

    if ctx.json {
        return print_json(&serde_json::json!({
            "stored": key.is_some(),
            "consecutive_failures": tracker.consecutive(),
            "threshold": config.coach.key_failure_threshold,
        }));
    }
    match key {
        Some(k) => println!("API key: {}", mask(&k)),
        None => println!("No API key stored. Chat uses offline replies."),
    }
    if tracker.consecutive() > 0 {
        println!(
            "recent key failures: {}/{}",
            tracker.consecutive(),
            config.coach.key_failure_threshold
        );
    }
    Ok(())
}
