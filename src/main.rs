mod catalog;
mod commands;
mod config;
mod discovery;
mod error;
mod launcher;
mod matcher;
mod model;
mod remote;
mod state;
mod ui;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::Result;
use clap::{Parser, Subcommand};
use crate::catalog::CatalogStore;
use crate::config::load_config;
use crate::model::DetailsPatch;

#[derive(Parser, Debug)]
#[command(author, version, about = "Catalog and launch locally installed games", long_about = None)]
struct Args {
    /// Catalog document to use instead of the configured one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Config file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List installed games, optionally fuzzy-filtered
    List {
        query: Option<String>,
    },
    /// Add the game installed in DIR
    Add {
        dir: PathBuf,
        /// File to launch, relative to DIR; asked for when omitted
        #[arg(short, long)]
        file: Option<String>,
        /// Display name; defaults to the directory name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Start a game
    Launch {
        name: String,
    },
    /// Show a game's details, or update them with the given fields
    Details {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        developer: Option<String>,
        #[arg(long)]
        game_version: Option<String>,
    },
}

fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let catalog_path = args.catalog.clone().unwrap_or_else(|| config.general.catalog_path.clone());
    let mut store = CatalogStore::load(catalog_path)?;
    log::debug!("Using catalog {:?}", store.path());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.command {
        None => ui::run(config, store),
        Some(Command::List { query }) => commands::list(&store, query.as_deref(), &mut out),
        Some(Command::Add { dir, file, name }) => {
            commands::add(&mut store, &config, &dir, file.as_deref(), name.as_deref(), commands::prompt_main_file, &mut out)
                .map(|_| ())
        }
        Some(Command::Launch { name }) => commands::launch(&store, &config, &name, &mut out),
        Some(Command::Details { name, description, developer, game_version }) => {
            let patch = DetailsPatch { description, developer, version: game_version };
            commands::details(&mut store, &name, &patch, &mut out)
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("chokz: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
