use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use log::{debug, info, warn};
use regex::Regex;
use walkdir::WalkDir;
use crate::config::DiscoveryConfig;
use crate::error::{Error, Result};

/// Lists files under `dir` a game could be started from, as paths relative to `dir`.
///
/// A file qualifies if its name matches one of the runnable patterns or it has an
/// executable bit. Hidden entries are skipped.
pub fn runnable_files(dir: &Path, config: &DiscoveryConfig) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(Error::InvalidDirectory { path: dir.to_path_buf() });
    }

    let patterns: Vec<Regex> = config.runnable_patterns.iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Ignoring invalid runnable pattern {:?}: {}", p, e);
                None
            }
        })
        .collect();

    debug!("Scanning {:?} for runnable files", dir);
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(config.max_depth.max(1))
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker.flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        let executable = entry.metadata()
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false);
        if !executable && !patterns.iter().any(|re| re.is_match(&file_name)) {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(dir) {
            files.push(relative.to_string_lossy().into_owned());
        }
    }

    files.sort();
    info!("Discovery: {} runnable files in {:?}", files.len(), dir);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, mode: u32) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn finds_python_files_and_executables() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.py", 0o644);
        touch(dir.path(), "menu.py", 0o644);
        touch(dir.path(), "start", 0o755);
        touch(dir.path(), "README.md", 0o644);
        touch(dir.path(), ".hidden.py", 0o644);

        let files = runnable_files(dir.path(), &DiscoveryConfig::default()).unwrap();
        assert_eq!(files, vec!["main.py", "menu.py", "start"]);
    }

    #[test]
    fn depth_limits_the_walk() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.py", 0o644);
        touch(dir.path(), "bin/game.py", 0o644);

        let shallow = runnable_files(dir.path(), &DiscoveryConfig::default()).unwrap();
        assert_eq!(shallow, vec!["main.py"]);

        let config = DiscoveryConfig { max_depth: 2, ..DiscoveryConfig::default() };
        let deep = runnable_files(dir.path(), &config).unwrap();
        assert_eq!(deep, vec!["bin/game.py", "main.py"]);
    }

    #[test]
    fn custom_patterns_replace_defaults() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.py", 0o644);
        touch(dir.path(), "game.love", 0o644);

        let config = DiscoveryConfig {
            runnable_patterns: vec![r"\.love$".to_string(), "([".to_string()],
            ..DiscoveryConfig::default()
        };
        assert_eq!(runnable_files(dir.path(), &config).unwrap(), vec!["game.love"]);
    }

    #[test]
    fn empty_directory_has_no_candidates() {
        let dir = TempDir::new().unwrap();
        assert!(runnable_files(dir.path(), &DiscoveryConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = runnable_files(&dir.path().join("nope"), &DiscoveryConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidDirectory { .. }));
    }
}
