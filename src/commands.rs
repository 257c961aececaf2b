//! Command-line front end over the catalog and launcher.

use std::io::Write;
use std::path::Path;
use anyhow::{bail, Result};
use inquire::{Select, error::InquireError};
use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::discovery;
use crate::error::Error;
use crate::launcher;
use crate::matcher::FuzzyMatcher;
use crate::model::DetailsPatch;

pub fn list(store: &CatalogStore, query: Option<&str>, out: &mut impl Write) -> Result<()> {
    if store.catalog().is_empty() {
        writeln!(out, "No games installed. Add one with: chokz add <directory>")?;
        return Ok(());
    }

    let games = store.list();
    let names: Vec<&str> = games.iter().map(|(n, _)| n.as_str()).collect();
    let ranked = FuzzyMatcher::new().rank(query.unwrap_or(""), &names);
    for idx in ranked {
        let (name, entry) = &games[idx];
        writeln!(out, "{}\t{}\t{}", name, entry.directory.display(), entry.main_file)?;
    }
    Ok(())
}

/// The add-game workflow: pick the main file, then store the entry.
///
/// `choose` is only asked when discovery finds more than one candidate.
pub fn add(
    store: &mut CatalogStore,
    config: &Config,
    directory: &Path,
    file: Option<&str>,
    name: Option<&str>,
    choose: impl FnOnce(Vec<String>) -> Result<String>,
    out: &mut impl Write,
) -> Result<String> {
    let main_file = match file {
        Some(f) => f.to_string(),
        None => pick_main_file(directory, config, choose)?,
    };
    let name = store.add_from_directory(directory, &main_file, name)?;
    writeln!(out, "Added {} ({})", name, main_file)?;
    Ok(name)
}

fn pick_main_file(
    directory: &Path,
    config: &Config,
    choose: impl FnOnce(Vec<String>) -> Result<String>,
) -> Result<String> {
    let mut candidates = discovery::runnable_files(directory, &config.discovery)?;
    match candidates.len() {
        0 => Err(Error::NoRunnableFiles { path: directory.to_path_buf() }.into()),
        1 => Ok(candidates.remove(0)),
        _ => choose(candidates),
    }
}

/// Asks on the terminal which of several files starts the game.
pub fn prompt_main_file(candidates: Vec<String>) -> Result<String> {
    match Select::new("Select the file to launch", candidates).prompt() {
        Ok(choice) => Ok(choice),
        Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => {
            Err(Error::PromptCanceled.into())
        }
        Err(error) => Err(Error::PromptFailed { message: error.to_string() }.into()),
    }
}

pub fn launch(store: &CatalogStore, config: &Config, name: &str, out: &mut impl Write) -> Result<()> {
    let entry = store.get(name).ok_or_else(|| Error::NotFound { name: name.to_string() })?;
    let pid = launcher::launch(entry, &config.launch).map_err(Error::from)?;
    writeln!(out, "Started {} (pid {})", name, pid)?;
    Ok(())
}

/// Shows a game's details, merging `patch` in first when it sets anything.
pub fn details(store: &mut CatalogStore, name: &str, patch: &DetailsPatch, out: &mut impl Write) -> Result<()> {
    let details = if patch.is_empty() {
        store.view_details(name)?
    } else {
        store.set_details(name, patch)?;
        match store.get(name).and_then(|e| e.details.clone()) {
            Some(d) => d,
            None => bail!("details of '{}' missing after update", name),
        }
    };
    writeln!(out, "{}", name)?;
    writeln!(out, "  Description: {}", details.description)?;
    writeln!(out, "  Developer:   {}", details.developer)?;
    writeln!(out, "  Version:     {}", details.version)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use crate::model::GameEntry;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> CatalogStore {
        CatalogStore::load(dir.path().join("installed_games.json")).unwrap()
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    fn never_asked(_: Vec<String>) -> Result<String> {
        panic!("no choice should be needed");
    }

    #[test]
    fn list_filters_by_query() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.upsert("Snake", GameEntry::new("/games/snake", "main.py")).unwrap();
        store.upsert("Tetris", GameEntry::new("/games/tetris", "tetris.py")).unwrap();

        let mut out = Vec::new();
        list(&store, None, &mut out).unwrap();
        assert_eq!(output(out), "Snake\t/games/snake\tmain.py\nTetris\t/games/tetris\ttetris.py\n");

        let mut out = Vec::new();
        list(&store, Some("tet"), &mut out).unwrap();
        assert_eq!(output(out), "Tetris\t/games/tetris\ttetris.py\n");
    }

    #[test]
    fn list_of_empty_catalog_hints_at_add() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        list(&store_in(&dir), None, &mut out).unwrap();
        assert!(output(out).contains("chokz add"));
    }

    #[test]
    fn add_takes_the_only_candidate() {
        let dir = TempDir::new().unwrap();
        let game = dir.path().join("Snake");
        fs::create_dir(&game).unwrap();
        fs::write(game.join("main.py"), "").unwrap();
        let mut store = store_in(&dir);

        let mut out = Vec::new();
        let name = add(&mut store, &Config::default(), &game, None, None, never_asked, &mut out).unwrap();
        assert_eq!(name, "Snake");
        assert_eq!(store.get("Snake").unwrap().main_file, "main.py");
    }

    #[test]
    fn add_asks_when_several_candidates() {
        let dir = TempDir::new().unwrap();
        let game = dir.path().join("Arcade");
        fs::create_dir(&game).unwrap();
        fs::write(game.join("a.py"), "").unwrap();
        fs::write(game.join("b.py"), "").unwrap();
        let mut store = store_in(&dir);

        let mut offered = Vec::new();
        add(&mut store, &Config::default(), &game, None, None, |candidates| {
            offered = candidates.clone();
            Ok(candidates[1].clone())
        }, &mut Vec::<u8>::new()).unwrap();
        assert_eq!(offered, vec!["a.py", "b.py"]);
        assert_eq!(store.get("Arcade").unwrap().main_file, "b.py");
    }

    #[test]
    fn canceled_choice_stores_nothing() {
        let dir = TempDir::new().unwrap();
        let game = dir.path().join("Arcade");
        fs::create_dir(&game).unwrap();
        fs::write(game.join("a.py"), "").unwrap();
        fs::write(game.join("b.py"), "").unwrap();
        let mut store = store_in(&dir);

        let err = add(&mut store, &Config::default(), &game, None, Some("Other"),
            |_| Err(Error::PromptCanceled.into()), &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::PromptCanceled)));
        assert!(store.catalog().is_empty());
    }

    #[test]
    fn add_without_candidates_fails() {
        let dir = TempDir::new().unwrap();
        let game = dir.path().join("Empty");
        fs::create_dir(&game).unwrap();
        let mut store = store_in(&dir);

        let err = add(&mut store, &Config::default(), &game, None, None, never_asked, &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NoRunnableFiles { .. })));
        assert!(store.catalog().is_empty());
    }

    #[test]
    fn add_with_explicit_file_skips_discovery() {
        let dir = TempDir::new().unwrap();
        let game = dir.path().join("Empty");
        fs::create_dir(&game).unwrap();
        let mut store = store_in(&dir);

        add(&mut store, &Config::default(), &game, Some("later.py"), Some("Later"), never_asked, &mut Vec::<u8>::new()).unwrap();
        assert_eq!(store.get("Later").unwrap().main_file, "later.py");
    }

    #[test]
    fn launch_of_unknown_game_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = launch(&store_in(&dir), &Config::default(), "Ghost", &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotFound { .. })));
    }

    #[test]
    fn launch_of_missing_file_reports_launch_error() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.upsert("Snake", GameEntry::new(dir.path(), "main.py")).unwrap();
        let err = launch(&store, &Config::default(), "Snake", &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Launch(_))));
    }

    #[test]
    fn details_show_defaults_then_updates() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.upsert("A", GameEntry::new("/a", "a.py")).unwrap();
        store.upsert("B", GameEntry::new("/b", "b.py")).unwrap();

        let mut out = Vec::new();
        details(&mut store, "A", &DetailsPatch::default(), &mut out).unwrap();
        assert!(output(out).contains("Developer:   Unknown developer"));

        let patch = DetailsPatch { description: Some("x".into()), ..Default::default() };
        let mut out = Vec::new();
        details(&mut store, "A", &patch, &mut out).unwrap();
        assert!(output(out).contains("Description: x"));

        let list = store.list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].1.details.as_ref().unwrap().description, "x");
        assert!(list[1].1.details.is_none());
    }
}
