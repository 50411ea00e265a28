pub mod calendar;
pub mod chat;
pub mod config;
pub mod failures;
pub mod goal;
pub mod init;
pub mod key;
pub mod mark;
pub mod reflect;
pub mod routine;
pub mod serve;
pub mod stats;
pub mod weekly;

use anyhow::Context;
use chrono::NaiveDate;
use routine_core::config::Config;
use routine_core::goal::Goal;
use routine_core::paths;
use routine_core::store::FileStore;
use std::path::Path;

/// Global flags shared by every project command.
pub struct Ctx<'a> {
    pub root: &'a Path,
    pub json: bool,
    pub routine: Option<u64>,
    pub date: Option<&'a str>,
}

impl Ctx<'_> {
    pub fn today(&self) -> anyhow::Result<NaiveDate> {
        match self.date {
            Some(d) => Ok(paths::parse_date(d)?),
            None => Ok(chrono::Local::now().date_naive()),
        }
    }

    pub fn store(&self) -> anyhow::Result<FileStore> {
        FileStore::open(self.root).context("failed to open store")
    }

    pub fn config(&self) -> anyhow::Result<Config> {
        Config::load(self.root).context("failed to load config")
    }

    /// The goal or routine selected by `--routine`.
    pub fn goal(&self, store: &FileStore) -> anyhow::Result<Goal> {
        Ok(routine_core::goal::resolve(store, self.routine)?)
    }
}
