use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// A cataloged game. The display name is the catalog key and lives outside the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEntry {
    #[serde(rename = "path", alias = "directory")]
    pub directory: PathBuf,
    #[serde(alias = "mainFile")]
    pub main_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<GameDetails>,
    // Fields written by other tools, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GameEntry {
    pub fn new(directory: impl Into<PathBuf>, main_file: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            main_file: main_file.into(),
            details: None,
            extra: Map::new(),
        }
    }

    pub fn executable_path(&self) -> PathBuf {
        self.directory.join(&self.main_file)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDetails {
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_developer")]
    pub developer: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_description() -> String { "No description available".to_string() }
fn default_developer() -> String { "Unknown developer".to_string() }
fn default_version() -> String { "1.0".to_string() }

impl Default for GameDetails {
    fn default() -> Self {
        Self {
            description: default_description(),
            developer: default_developer(),
            version: default_version(),
            extra: Map::new(),
        }
    }
}

/// A partial update to [`GameDetails`]. `None` fields leave the current value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailsPatch {
    pub description: Option<String>,
    pub developer: Option<String>,
    pub version: Option<String>,
}

impl DetailsPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.developer.is_none() && self.version.is_none()
    }

    pub fn apply(&self, details: &mut GameDetails) {
        if let Some(description) = &self.description {
            details.description = description.clone();
        }
        if let Some(developer) = &self.developer {
            details.developer = developer.clone();
        }
        if let Some(version) = &self.version {
            details.version = version.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_historical_field_names() {
        let entry: GameEntry =
            serde_json::from_str(r#"{"path": "/games/snake", "main_file": "main.py"}"#).unwrap();
        assert_eq!(entry.directory, PathBuf::from("/games/snake"));
        assert_eq!(entry.main_file, "main.py");
        assert!(entry.details.is_none());
    }

    #[test]
    fn accepts_camel_case_aliases() {
        let entry: GameEntry =
            serde_json::from_str(r#"{"directory": "snake", "mainFile": "run.sh"}"#).unwrap();
        assert_eq!(entry.executable_path(), PathBuf::from("snake/run.sh"));
    }

    #[test]
    fn unknown_fields_survive_serialization() {
        let raw = r#"{"path":"/g","main_file":"a.py","playtime":42,"details":{"description":"d","rating":5}}"#;
        let entry: GameEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.extra.get("playtime"), Some(&Value::from(42)));

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["playtime"], 42);
        assert_eq!(value["details"]["rating"], 5);
        assert_eq!(value["details"]["developer"], "Unknown developer");
    }

    #[test]
    fn absent_details_are_not_written() {
        let value = serde_json::to_value(GameEntry::new("/g", "a.py")).unwrap();
        assert!(value.get("details").is_none());
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut details = GameDetails::default();
        DetailsPatch { description: Some("x".into()), ..Default::default() }.apply(&mut details);
        assert_eq!(details.description, "x");
        assert_eq!(details.developer, "Unknown developer");
        assert_eq!(details.version, "1.0");
    }
}
