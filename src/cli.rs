//! Command line arguments and command dispatch.

use crate::error::{ErrorKind, Result};
use clap::{Args, Parser, Subcommand};
use exn::ResultExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trove_config::Config;
use trove_library::{
    Browser, CatalogHandle, FlashLevel, ListingQuery, MemoryCatalog, RequestContext, SaveForm, User,
};
use trove_records::{Database, RecordId, Repository, SeriesId, UserId};
use trove_storage::backend::LocalBackend;

#[derive(Debug, Parser)]
#[command(name = "trove", version, about = "Browse a media archive and annotate its directories")]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show a file, or list a directory with its record and series
    Browse {
        /// Path inside the archive
        #[arg(default_value = "/")]
        path: String,
        /// Sort key: name, size, date or kind
        #[arg(long)]
        order: Option<String>,
        /// Sort direction: asc or desc
        #[arg(long)]
        dir: Option<String>,
        #[command(flatten)]
        user: UserArgs,
    },
    /// Update the details of a path record
    Save {
        #[arg(long)]
        record: RecordId,
        /// Unlink the series
        #[arg(long)]
        delete: bool,
        /// Refresh the linked series from its source
        #[arg(long)]
        update: bool,
        /// Link the series with this external id
        #[arg(long = "mu-id")]
        mu_id: Option<String>,
        #[arg(long)]
        incomplete: bool,
        /// Lock the record (elevated users only)
        #[arg(long)]
        locked: bool,
        #[arg(long)]
        comment: Option<String>,
        #[command(flatten)]
        user: UserArgs,
    },
    /// Report a path record as wrong
    Report {
        #[arg(long)]
        record: RecordId,
        #[arg(long)]
        reason: String,
        #[command(flatten)]
        user: UserArgs,
    },
    /// Remove the open report on a path record
    ClearReport {
        #[arg(long)]
        record: RecordId,
    },
}

/// Who is running the command. Anonymous when `--user` is absent.
#[derive(Debug, Default, Args)]
pub struct UserArgs {
    #[arg(long)]
    user: Option<UserId>,
    /// Act as a privileged user
    #[arg(long, requires = "user")]
    elevated: bool,
    /// Series the user is watching
    #[arg(long, requires = "user")]
    watching: Vec<SeriesId>,
}
impl UserArgs {
    fn context(&self) -> RequestContext {
        let Some(id) = self.user else {
            return RequestContext::anonymous();
        };
        let mut user = User::new(id).watching(self.watching.iter().copied());
        if self.elevated {
            user = user.elevated();
        }
        RequestContext::authenticated(Arc::new(user))
    }
}

/// Load the config from `--config`, the default location or the environment.
pub fn load_config(file: Option<&Path>) -> Result<Config> {
    Config::load(file).or_raise(|| ErrorKind::Config)
}

/// Open the archive, record store and catalog described by the config.
async fn open(config: &Config) -> Result<(Browser, Database)> {
    let backend = LocalBackend::new(&config.library.name, &config.library.root).or_raise(|| ErrorKind::Startup)?;

    let db = Database::connect(&config.database.path).await.or_raise(|| ErrorKind::Startup)?;

    let catalog: CatalogHandle = match &config.catalog.path {
        Some(path) => Arc::new(MemoryCatalog::load(path).await.or_raise(|| ErrorKind::Startup)?),
        None => Arc::new(MemoryCatalog::default()),
    };
    let browser = Browser::new(Arc::new(backend), Repository::from(&db), catalog);
    Ok((browser, db))
}

pub async fn run(command: Command, config: &Config) -> Result<()> {
    let (browser, db) = open(config).await?;
    let result = dispatch(&browser, command).await;
    db.close().await;
    print_json(&result?)
}

async fn dispatch(browser: &Browser, command: Command) -> Result<serde_json::Value> {
    let mut ctx;
    let outcome = match command {
        Command::Browse { path, order, dir, user } => {
            ctx = user.context();
            let query = ListingQuery { order, dir };
            browser.browse(&ctx, &path, &query).await.map(to_json)
        },
        Command::Save { record, delete, update, mu_id, incomplete, locked, comment, user } => {
            ctx = user.context();
            let form = SaveForm { delete, update, external_id: mu_id, incomplete, locked, comment };
            browser.save(&mut ctx, record, form).await.map(to_json)
        },
        Command::Report { record, reason, user } => {
            ctx = user.context();
            browser.report(&mut ctx, record, &reason).await.map(to_json)
        },
        Command::ClearReport { record } => {
            ctx = RequestContext::anonymous();
            browser
                .clear_report(record)
                .await
                .map(|cleared| Ok(serde_json::json!({ "record": record, "cleared": cleared })))
        },
    };
    // Flashes are shown whether or not the command succeeded.
    for flash in ctx.take_flashes() {
        let level = match flash.level {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        };
        eprintln!("[{level}] {}", flash.message);
    }
    match outcome {
        Ok(value) => value.or_raise(|| ErrorKind::Output),
        Err(e) => Err(e).or_raise(|| ErrorKind::Command),
    }
}

fn to_json(value: impl Serialize) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(value)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).or_raise(|| ErrorKind::Output)?;
    println!("{rendered}");
    Ok(())
}
