use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use log::info;
use crate::config::LaunchConfig;
use crate::error::LaunchError;
use crate::model::GameEntry;

/// Starts the game's main file as a detached process running in the game directory.
///
/// The child gets its own session and null stdio and is never waited on.
pub fn launch(entry: &GameEntry, config: &LaunchConfig) -> Result<u32, LaunchError> {
    let path = entry.executable_path();
    let metadata = fs::metadata(&path)
        .map_err(|_| LaunchError::MissingFile { path: path.clone() })?;
    if !metadata.is_file() {
        return Err(LaunchError::MissingFile { path });
    }
    // A relative program path would be resolved against the wrong directory once cwd changes.
    let path = fs::canonicalize(&path).unwrap_or(path);

    let mut command = match config.interpreter_for(&path) {
        Some(interpreter) => {
            let mut parts = interpreter.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(LaunchError::NotExecutable { path });
            };
            let mut command = Command::new(program);
            command.args(parts).arg(&path);
            command
        }
        None => {
            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(LaunchError::NotExecutable { path });
            }
            Command::new(&path)
        }
    };

    command.current_dir(&entry.directory)
        .envs(&config.env)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    // A new session drops the controlling terminal, so a game started from a shell
    // survives that terminal hanging up, which a new process group alone would not.
    // SAFETY: setsid is async-signal-safe and touches no parent state.
    unsafe {
        command.pre_exec(|| {
            nix::unistd::setsid().map(|_| ()).map_err(io::Error::from)
        });
    }

    let child = command.spawn()
        .map_err(|source| LaunchError::Spawn { path: path.clone(), source })?;
    info!("Launched {:?} (pid {})", path, child.id());
    Ok(child.id())
}
