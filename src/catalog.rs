//! The installed-games catalog and its on-disk document.
//!
//! The document is a JSON object mapping each game name to its record. Every
//! mutation goes through [`CatalogStore`], which writes the whole document back
//! before returning; if that write fails the mutation is undone in memory too.

use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use crate::error::{Error, PersistenceError, Result};
use crate::model::{DetailsPatch, GameDetails, GameEntry};

/// Name-keyed game records in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    games: Vec<(String, GameEntry)>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&GameEntry> {
        self.games.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut GameEntry> {
        self.games.iter_mut().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    /// Inserts or replaces, returning the replaced record. A replaced entry keeps its position.
    pub fn insert(&mut self, name: String, entry: GameEntry) -> Option<GameEntry> {
        match self.get_mut(&name) {
            Some(slot) => Some(std::mem::replace(slot, entry)),
            None => {
                self.games.push((name, entry));
                None
            }
        }
    }

    fn remove(&mut self, name: &str) -> Option<GameEntry> {
        let pos = self.games.iter().position(|(n, _)| n == name)?;
        Some(self.games.remove(pos).1)
    }

    fn from_json(path: &Path, content: &str) -> std::result::Result<Self, PersistenceError> {
        let parse_err = |source| PersistenceError::Parse { path: path.to_path_buf(), source };
        let raw: Map<String, Value> = serde_json::from_str(content).map_err(parse_err)?;
        let mut catalog = Catalog::default();
        for (name, value) in raw {
            let entry: GameEntry = serde_json::from_value(value).map_err(parse_err)?;
            catalog.insert(name, entry);
        }
        Ok(catalog)
    }

    fn to_json(&self) -> std::result::Result<String, PersistenceError> {
        let mut raw = Map::new();
        for (name, entry) in &self.games {
            let value = serde_json::to_value(entry).map_err(PersistenceError::Serialize)?;
            raw.insert(name.clone(), value);
        }
        serde_json::to_string_pretty(&raw).map_err(PersistenceError::Serialize)
    }
}

/// Owns the catalog and keeps it in step with its document.
pub struct CatalogStore {
    path: PathBuf,
    catalog: Catalog,
}

impl CatalogStore {
    /// Loads the document at `path`. A missing document is an empty catalog;
    /// unreadable or malformed content is an error and the file is left alone.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let catalog = match fs::read_to_string(&path) {
            Ok(content) => Catalog::from_json(&path, &content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Catalog {:?} does not exist yet, starting empty", path);
                Catalog::default()
            }
            Err(source) => return Err(PersistenceError::Read { path, source }.into()),
        };
        info!("CatalogStore: loaded {} games from {:?}", catalog.len(), path);
        Ok(Self { path, catalog })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn get(&self, name: &str) -> Option<&GameEntry> {
        self.catalog.get(name)
    }

    /// Snapshot for rendering, in insertion order.
    pub fn list(&self) -> Vec<(String, GameEntry)> {
        self.catalog.games.clone()
    }

    /// Writes the whole catalog through a temp file renamed over the document.
    pub fn save(&self) -> Result<()> {
        let content = self.catalog.to_json()?;
        write_atomic(&self.path, content.as_bytes())
            .map_err(|source| PersistenceError::Write { path: self.path.clone(), source })?;
        debug!("CatalogStore: saved {} games to {:?}", self.catalog.len(), self.path);
        Ok(())
    }

    pub fn upsert(&mut self, name: &str, entry: GameEntry) -> Result<&Catalog> {
        let previous = self.catalog.insert(name.to_string(), entry);
        if let Err(e) = self.save() {
            warn!("Save failed, reverting upsert of '{}'", name);
            match previous {
                Some(old) => { self.catalog.insert(name.to_string(), old); }
                None => { self.catalog.remove(name); }
            }
            return Err(e);
        }
        info!("CatalogStore: stored '{}'", name);
        Ok(&self.catalog)
    }

    /// Merges `patch` over the game's details, or over the defaults if it has none.
    pub fn set_details(&mut self, name: &str, patch: &DetailsPatch) -> Result<&Catalog> {
        let entry = self.catalog.get_mut(name)
            .ok_or_else(|| Error::NotFound { name: name.to_string() })?;
        let previous = entry.details.clone();
        patch.apply(entry.details.get_or_insert_with(GameDetails::default));

        if let Err(e) = self.save() {
            warn!("Save failed, reverting details of '{}'", name);
            if let Some(entry) = self.catalog.get_mut(name) {
                entry.details = previous;
            }
            return Err(e);
        }
        info!("CatalogStore: updated details of '{}'", name);
        Ok(&self.catalog)
    }

    /// Returns the game's details, filling in and persisting the defaults on first view.
    pub fn view_details(&mut self, name: &str) -> Result<GameDetails> {
        let entry = self.catalog.get(name)
            .ok_or_else(|| Error::NotFound { name: name.to_string() })?;
        if let Some(details) = &entry.details {
            return Ok(details.clone());
        }
        self.set_details(name, &DetailsPatch::default())?;
        Ok(GameDetails::default())
    }

    /// Adds `main_file` inside `directory`, named after the directory unless `name` is given.
    ///
    /// The directory is stored as its canonical absolute path so the record
    /// resolves regardless of the working directory it is launched from.
    pub fn add_from_directory(
        &mut self,
        directory: &Path,
        main_file: &str,
        name: Option<&str>,
    ) -> Result<String> {
        let invalid = || Error::InvalidDirectory { path: directory.to_path_buf() };
        let resolved = fs::canonicalize(directory).map_err(|_| invalid())?;
        if !resolved.is_dir() {
            return Err(invalid());
        }
        let name = match name {
            Some(n) => n.to_string(),
            None => resolved.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(invalid)?,
        };
        self.upsert(&name, GameEntry::new(resolved, main_file))?;
        Ok(name)
    }
}

/// Replaces `path` with `content` through a temp file in the same directory,
/// then syncs the directory so the rename itself survives a crash.
fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    File::open(parent)?.sync_all()
}
