//! Per-display session directories
//!
//! Each session lives in `<root>/<prefix>-<display>`, where the prefix keeps
//! remote (`C`) and local (`S`) sessions in disjoint namespaces. A directory
//! holds the supervised process id, the options blob and the output logs.
//! Every file is rewritten wholesale, never patched.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::options::SessionOptions;
use crate::types::{DisplayId, Role};

/// Process id of the supervised child
pub const PID_FILE_NAME: &str = "pid";
/// Options blob consumed by the agent or proxy
pub const OPTIONS_FILE_NAME: &str = "options";
/// Combined output of the supervised child
pub const SESSION_LOG_NAME: &str = "session";
/// Output of the startup action (remote role only)
pub const STARTUP_LOG_NAME: &str = "x_session";

/// Read a PID from a PID file
///
/// Returns `Ok(Some(pid))` if the file exists and contains a valid PID,
/// `Ok(None)` if the file doesn't exist, or an error if the file is malformed.
pub fn read_pid_file(path: &Path) -> io::Result<Option<u32>> {
    match fs::File::open(path) {
        Ok(mut file) => {
            let mut contents = String::new();
            file.read_to_string(&mut contents)?;
            let pid = contents
                .trim()
                .parse::<u32>()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            Ok(Some(pid))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write a PID to a PID file
///
/// Creates parent directories if they don't exist.
pub fn write_pid_file(path: &Path, pid: u32) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(path)?;
    writeln!(file, "{}", pid)?;
    Ok(())
}

/// A session directory found under the store root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredSession {
    pub role: Role,
    pub display: DisplayId,
}

/// Session directories keyed by `(role, display)`
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of all sessions
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one session
    pub fn session_dir(&self, role: Role, display: DisplayId) -> PathBuf {
        self.root.join(format!("{}-{}", role.prefix(), display))
    }

    pub fn pid_path(&self, role: Role, display: DisplayId) -> PathBuf {
        self.session_dir(role, display).join(PID_FILE_NAME)
    }

    pub fn options_path(&self, role: Role, display: DisplayId) -> PathBuf {
        self.session_dir(role, display).join(OPTIONS_FILE_NAME)
    }

    pub fn session_log_path(&self, role: Role, display: DisplayId) -> PathBuf {
        self.session_dir(role, display).join(SESSION_LOG_NAME)
    }

    pub fn startup_log_path(&self, role: Role, display: DisplayId) -> PathBuf {
        self.session_dir(role, display).join(STARTUP_LOG_NAME)
    }

    /// Recorded process id, if any
    ///
    /// A malformed pid file is treated as no record: it can only be left
    /// behind by an interrupted writer.
    pub fn read_pid(&self, role: Role, display: DisplayId) -> io::Result<Option<u32>> {
        let path = self.pid_path(role, display);
        match read_pid_file(&path) {
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!("Ignoring malformed pid file {:?}: {}", path, e);
                Ok(None)
            }
            other => other,
        }
    }

    /// Record the supervised process id
    pub fn write_pid(&self, role: Role, display: DisplayId, pid: u32) -> io::Result<()> {
        write_pid_file(&self.pid_path(role, display), pid)
    }

    /// Discard everything from a previous incarnation and start empty
    pub fn recreate(&self, role: Role, display: DisplayId) -> io::Result<PathBuf> {
        let dir = self.session_dir(role, display);
        match fs::remove_dir_all(&dir) {
            Ok(()) => tracing::debug!("Removed previous session directory {:?}", dir),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        fs::create_dir_all(&dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o700))?;
        }

        Ok(dir)
    }

    /// Write the options blob, readable only by the owner
    pub fn write_options(
        &self,
        role: Role,
        display: DisplayId,
        options: &SessionOptions,
    ) -> io::Result<PathBuf> {
        let path = self.options_path(role, display);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, options.render())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(path)
    }

    /// Read back the options blob, if one was written
    pub fn read_options(
        &self,
        role: Role,
        display: DisplayId,
    ) -> io::Result<Option<SessionOptions>> {
        match fs::read_to_string(self.options_path(role, display)) {
            Ok(contents) => Ok(SessionOptions::parse(&contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// All session directories under the root, sorted by role then display
    pub fn list(&self) -> io::Result<Vec<StoredSession>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut sessions: Vec<StoredSession> = entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name();
                let (prefix, display) = name.to_str()?.split_once('-')?;
                Some(StoredSession {
                    role: Role::from_prefix(prefix)?,
                    display: display.parse().ok()?,
                })
            })
            .collect();

        sessions.sort_by_key(|s| (s.role.prefix(), s.display));
        Ok(sessions)
    }
}
