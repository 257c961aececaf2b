use crate::catalog::CatalogStore;
use crate::config::{Config, ThemeConfig};
use crate::error::Result;
use crate::launcher;
use crate::matcher::FuzzyMatcher;
use crate::model::{DetailsPatch, GameDetails, GameEntry};

/// What the grid window shows and how the user moves through it.
///
/// `games` is a snapshot of the store taken on [`AppState::refresh`]; every change
/// to the catalog goes through the store itself.
pub struct AppState {
    pub config: Config,
    store: CatalogStore,
    pub games: Vec<(String, GameEntry)>,
    pub filtered_indices: Vec<usize>,
    pub selected_index: usize,
    pub query: String,
    pub columns: usize,
    pub status: Option<String>,
    pub details: Option<DetailsView>,
    matcher: FuzzyMatcher,
}

/// The open details panel: one game's details and the description being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailsView {
    pub name: String,
    pub details: GameDetails,
    pub draft: String,
}

pub fn grid_columns(width: u32, theme: &ThemeConfig) -> usize {
    let usable = width as f32 - 2.0 * theme.padding + theme.spacing;
    let per_card = theme.card_width as f32 + theme.spacing;
    ((usable / per_card).floor() as usize).max(1)
}

impl AppState {
    pub fn new(config: Config, store: CatalogStore) -> Self {
        let columns = grid_columns(config.theme.width, &config.theme);
        let mut state = Self {
            config,
            store,
            games: Vec::new(),
            filtered_indices: Vec::new(),
            selected_index: 0,
            query: String::new(),
            columns,
            status: None,
            details: None,
            matcher: FuzzyMatcher::new(),
        };
        state.refresh();
        state
    }

    pub fn refresh(&mut self) {
        self.games = self.store.list();
        self.update_filter();
    }

    pub fn set_width(&mut self, width: u32) {
        self.columns = grid_columns(width, &self.config.theme);
    }

    pub fn push_query(&mut self, text: &str) {
        self.query.push_str(text);
        self.update_filter();
    }

    pub fn pop_query(&mut self) {
        self.query.pop();
        self.update_filter();
    }

    pub fn update_filter(&mut self) {
        let names: Vec<&str> = self.games.iter().map(|(n, _)| n.as_str()).collect();
        self.filtered_indices = self.matcher.rank(&self.query, &names);
        log::debug!("AppState: query='{}', filtered_count={}", self.query, self.filtered_indices.len());
        self.selected_index = 0;
    }

    /// Moves the selection across the grid, wrapping at the edges.
    pub fn move_selection(&mut self, dx: i32, dy: i32) {
        let len = self.filtered_indices.len();
        if len == 0 {
            self.selected_index = 0;
            return;
        }
        let cols = self.columns.max(1);
        let mut index = self.selected_index.min(len - 1);

        if dx != 0 {
            index = (index as i64 + dx as i64).rem_euclid(len as i64) as usize;
        }
        for _ in 0..dy.unsigned_abs() {
            index = if dy > 0 {
                if index + cols < len { index + cols } else { index % cols }
            } else if index >= cols {
                index - cols
            } else {
                // Bottom-most card in the same column.
                let column = index % cols;
                column + ((len - 1 - column) / cols) * cols
            };
        }
        self.selected_index = index;
    }

    pub fn get_selected(&self) -> Option<(&str, &GameEntry)> {
        self.filtered_indices.get(self.selected_index)
            .map(|&idx| {
                let (name, entry) = &self.games[idx];
                (name.as_str(), entry)
            })
    }

    /// Launches the selected game. Failures are kept in `status` for the window to show.
    pub fn launch_selected(&mut self) -> Result<()> {
        let Some((name, entry)) = self.get_selected() else {
            return Ok(());
        };
        let name = name.to_string();
        match launcher::launch(entry, &self.config.launch) {
            Ok(_) => {
                self.status = None;
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to launch '{}': {}", name, e);
                self.status = Some(format!("Could not start {}: {}", name, e));
                Err(e.into())
            }
        }
    }

    /// Opens the details panel for the selected game, filling in defaults on first view.
    pub fn open_details(&mut self) -> Result<()> {
        let Some((name, _)) = self.get_selected() else {
            return Ok(());
        };
        let name = name.to_string();
        match self.store.view_details(&name) {
            Ok(details) => {
                self.sync_entry(&name);
                self.details = Some(DetailsView { draft: details.description.clone(), name, details });
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to load details of '{}': {}", name, e);
                self.status = Some(format!("Could not load details of {}: {}", name, e));
                Err(e)
            }
        }
    }

    pub fn close_details(&mut self) {
        self.details = None;
    }

    pub fn push_description(&mut self, text: &str) {
        if let Some(view) = &mut self.details {
            view.draft.push_str(text);
        }
    }

    pub fn pop_description(&mut self) {
        if let Some(view) = &mut self.details {
            view.draft.pop();
        }
    }

    /// Stores the edited description and closes the panel. On failure the panel stays open.
    pub fn save_details(&mut self) -> Result<()> {
        let Some(view) = &self.details else {
            return Ok(());
        };
        let name = view.name.clone();
        let patch = DetailsPatch { description: Some(view.draft.clone()), ..Default::default() };

        let saved = self.store.set_details(&name, &patch).map(|_| ());
        match saved {
            Ok(()) => {
                self.sync_entry(&name);
                self.details = None;
                self.status = None;
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to save details of '{}': {}", name, e);
                self.status = Some(format!("Could not save details of {}: {}", name, e));
                Err(e)
            }
        }
    }

    // Copies one record from the store into the snapshot without touching the filter.
    fn sync_entry(&mut self, name: &str) {
        let Some(entry) = self.store.get(name) else { return; };
        if let Some((_, slot)) = self.games.iter_mut().find(|(n, _)| n == name) {
            *slot = entry.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, LaunchError};
    use tempfile::TempDir;

    fn state_with(dir: &TempDir, names: &[&str]) -> AppState {
        let mut store = CatalogStore::load(dir.path().join("installed_games.json")).unwrap();
        for name in names {
            store.upsert(name, GameEntry::new(dir.path().join(name), "main.py")).unwrap();
        }
        AppState::new(Config::default(), store)
    }

    fn ten_games(dir: &TempDir, columns: usize) -> AppState {
        let names: Vec<String> = (0..10).map(|i| format!("game{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut state = state_with(dir, &refs);
        state.columns = columns;
        state
    }

    #[test]
    fn columns_follow_width() {
        let theme = ThemeConfig::default();
        // 1200 wide, 20 padding, 200 cards, 20 spacing
        assert_eq!(grid_columns(1200, &theme), 5);
        assert_eq!(grid_columns(100, &theme), 1);
        assert_eq!(grid_columns(0, &theme), 1);
    }

    #[test]
    fn snapshot_keeps_catalog_order() {
        let dir = TempDir::new().unwrap();
        let state = state_with(&dir, &["Snake", "Tetris"]);
        assert_eq!(state.filtered_indices, vec![0, 1]);
        assert_eq!(state.get_selected().map(|(n, _)| n), Some("Snake"));
    }

    #[test]
    fn horizontal_moves_wrap_around_the_list() {
        let dir = TempDir::new().unwrap();
        let mut state = ten_games(&dir, 4);
        state.move_selection(-1, 0);
        assert_eq!(state.selected_index, 9);
        state.move_selection(1, 0);
        assert_eq!(state.selected_index, 0);
    }

    #[test]
    fn vertical_moves_stay_in_column() {
        let dir = TempDir::new().unwrap();
        // rows: 0-3, 4-7, 8-9
        let mut state = ten_games(&dir, 4);
        state.move_selection(0, 1);
        assert_eq!(state.selected_index, 4);
        state.move_selection(0, 1);
        assert_eq!(state.selected_index, 8);
        state.move_selection(0, 1);
        assert_eq!(state.selected_index, 0);

        state.selected_index = 3;
        state.move_selection(0, -1);
        assert_eq!(state.selected_index, 7);
        state.move_selection(0, 1);
        assert_eq!(state.selected_index, 3);
    }

    #[test]
    fn moving_in_empty_grid_is_harmless() {
        let dir = TempDir::new().unwrap();
        let mut state = state_with(&dir, &[]);
        state.move_selection(1, 1);
        assert_eq!(state.selected_index, 0);
        assert!(state.get_selected().is_none());
        assert!(state.launch_selected().is_ok());
    }

    #[test]
    fn typing_filters_and_resets_selection() {
        let dir = TempDir::new().unwrap();
        let mut state = state_with(&dir, &["Snake", "Tetris", "Space Invaders"]);
        state.move_selection(1, 0);
        state.push_query("tet");
        assert_eq!(state.filtered_indices, vec![1]);
        assert_eq!(state.selected_index, 0);
        state.query.clear();
        state.update_filter();
        assert_eq!(state.filtered_indices.len(), 3);
        state.push_query("x");
        state.pop_query();
        assert_eq!(state.filtered_indices.len(), 3);
    }

    #[test]
    fn failed_launch_sets_status_and_keeps_state() {
        let dir = TempDir::new().unwrap();
        let mut state = state_with(&dir, &["Snake"]);

        let err = state.launch_selected().unwrap_err();
        assert!(matches!(err, Error::Launch(LaunchError::MissingFile { .. })));
        assert!(state.status.as_deref().unwrap().contains("Snake"));
        assert_eq!(state.games.len(), 1);
    }

    #[test]
    fn details_panel_shows_defaults_and_saves_description() {
        let dir = TempDir::new().unwrap();
        let mut state = state_with(&dir, &["Snake", "Tetris"]);
        state.move_selection(1, 0);

        state.open_details().unwrap();
        let view = state.details.clone().unwrap();
        assert_eq!(view.name, "Tetris");
        assert_eq!(view.details, GameDetails::default());
        assert_eq!(view.draft, "No description available");
        assert_eq!(state.games[1].1.details, Some(GameDetails::default()));

        state.details.as_mut().unwrap().draft.clear();
        state.push_description("Falling blocksx");
        state.pop_description();
        state.save_details().unwrap();

        assert!(state.details.is_none());
        assert_eq!(state.selected_index, 1);
        assert_eq!(state.games[1].1.details.as_ref().unwrap().description, "Falling blocks");
        let reloaded = CatalogStore::load(dir.path().join("installed_games.json")).unwrap();
        assert_eq!(reloaded.get("Tetris").unwrap().details.as_ref().unwrap().description, "Falling blocks");
        assert!(reloaded.get("Snake").unwrap().details.is_none());
    }

    #[test]
    fn closing_details_discards_the_draft() {
        let dir = TempDir::new().unwrap();
        let mut state = state_with(&dir, &["Snake"]);
        state.open_details().unwrap();
        state.push_description(" edited");
        state.close_details();

        assert!(state.details.is_none());
        assert_eq!(state.store.get("Snake").unwrap().details, Some(GameDetails::default()));
    }

    #[test]
    fn details_of_empty_grid_stay_closed() {
        let dir = TempDir::new().unwrap();
        let mut state = state_with(&dir, &[]);
        assert!(state.open_details().is_ok());
        assert!(state.details.is_none());
        assert!(state.save_details().is_ok());
    }

    #[test]
    fn refresh_picks_up_store_changes() {
        let dir = TempDir::new().unwrap();
        let mut state = state_with(&dir, &["Snake"]);
        state.store.upsert("Tetris", GameEntry::new("/t", "t.py")).unwrap();
        assert_eq!(state.games.len(), 1);
        state.refresh();
        assert_eq!(state.games.len(), 2);
    }
}
