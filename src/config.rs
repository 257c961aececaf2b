use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use anyhow::{Context, Result};
use std::fs;
use tiny_skia::Color;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[allow(dead_code)]
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    #[serde(default = "default_true")]
    pub close_on_launch: bool,
}

fn default_catalog_path() -> PathBuf { PathBuf::from("installed_games.json") }
fn default_true() -> bool { true }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            close_on_launch: true,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct LaunchConfig {
    /// File extension (without the dot) to interpreter command line.
    #[serde(default = "default_interpreters")]
    pub interpreters: HashMap<String, String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_interpreters() -> HashMap<String, String> {
    HashMap::from([("py".to_string(), "python3".to_string())])
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            interpreters: default_interpreters(),
            env: HashMap::new(),
        }
    }
}

impl LaunchConfig {
    pub fn interpreter_for(&self, file: &Path) -> Option<&str> {
        let ext = file.extension()?.to_str()?;
        self.interpreters.get(ext).map(String::as_str)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct DiscoveryConfig {
    /// Regexes matched against file names offered by the add-game picker.
    #[serde(default = "default_runnable_patterns")]
    pub runnable_patterns: Vec<String>,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_runnable_patterns() -> Vec<String> { vec![r"\.py$".to_string()] }
fn default_max_depth() -> usize { 1 }

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            runnable_patterns: default_runnable_patterns(),
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RemoteConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_endpoint() -> String { "https://api.chokz-games.com/games".to_string() }

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { endpoint: default_endpoint() }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ThemeConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_padding")]
    pub padding: f32,
    #[serde(default = "default_spacing")]
    pub spacing: f32,
    #[serde(default = "default_border_radius")]
    pub border_radius: f32,
    #[serde(default = "default_card_width")]
    pub card_width: u32,
    #[serde(default = "default_thumbnail_height")]
    pub thumbnail_height: u32,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_header")]
    pub header: String,
    #[serde(default = "default_card")]
    pub card: String,
    #[serde(default = "default_border_color")]
    pub border_color: String,
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_selection_background")]
    pub selection_background: String,
    #[serde(default = "default_error_text")]
    pub error_text: String,
}

fn default_width() -> u32 { 1200 }
fn default_height() -> u32 { 800 }
fn default_padding() -> f32 { 20.0 }
fn default_spacing() -> f32 { 20.0 }
fn default_border_radius() -> f32 { 8.0 }
fn default_card_width() -> u32 { 200 }
fn default_thumbnail_height() -> u32 { 300 }
fn default_background() -> String { "1b2838ff".to_string() }
fn default_header() -> String { "171a21ff".to_string() }
fn default_card() -> String { "2a475eff".to_string() }
fn default_border_color() -> String { "3c3c50ff".to_string() }
fn default_text() -> String { "ffffffff".to_string() }
fn default_selection_background() -> String { "66c0f4ff".to_string() }
fn default_error_text() -> String { "e06c6cff".to_string() }

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            padding: default_padding(),
            spacing: default_spacing(),
            border_radius: default_border_radius(),
            card_width: default_card_width(),
            thumbnail_height: default_thumbnail_height(),
            background: default_background(),
            header: default_header(),
            card: default_card(),
            border_color: default_border_color(),
            text: default_text(),
            selection_background: default_selection_background(),
            error_text: default_error_text(),
        }
    }
}

impl ThemeConfig {
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 8 || !hex.is_ascii() {
            return Color::BLACK;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
        let a = u8::from_str_radix(&hex[6..8], 16).unwrap_or(255);

        Color::from_rgba8(r, g, b, a)
    }
}

pub fn default_config_path() -> PathBuf {
    match ProjectDirs::from("org", "chokz", "chokz") {
        Some(dirs) => dirs.config_dir().join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

/// Loads the config from `path`, or the platform default location. A missing file yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if !config_path.exists() {
        log::debug!("No config at {:?}, using defaults", config_path);
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("reading config {}", config_path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("parsing config {}", config_path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.general.catalog_path, PathBuf::from("installed_games.json"));
        assert!(config.general.close_on_launch);
        assert_eq!(config.launch.interpreters.get("py").map(String::as_str), Some("python3"));
        assert_eq!(config.theme.card_width, 200);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[general]\ncatalog_path = \"/tmp/games.json\"\n\n[launch.interpreters]\nlua = \"love\"\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.general.catalog_path, PathBuf::from("/tmp/games.json"));
        assert!(config.general.close_on_launch);
        // An explicit table replaces the default map.
        assert_eq!(config.launch.interpreters.len(), 1);
        assert_eq!(config.launch.interpreter_for(Path::new("main.lua")), Some("love"));
        assert_eq!(config.discovery.max_depth, 1);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[general\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn interpreter_lookup_uses_extension() {
        let launch = LaunchConfig::default();
        assert_eq!(launch.interpreter_for(Path::new("game/main.py")), Some("python3"));
        assert_eq!(launch.interpreter_for(Path::new("run.sh")), None);
        assert_eq!(launch.interpreter_for(Path::new("game")), None);
    }

    #[test]
    fn parses_hex_colors() {
        let c = ThemeConfig::parse_color("#ff000080");
        assert_eq!(c.to_color_u8().red(), 255);
        assert_eq!(c.to_color_u8().alpha(), 128);
        assert_eq!(ThemeConfig::parse_color("nope"), Color::BLACK);
    }
}
