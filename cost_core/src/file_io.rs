//! # File I/O Module
//!
//! Project file operations:
//! - **Atomic saves**: write to `.tmp`, sync, rename over the target
//! - **File locking**: keep two people from editing the same shared project
//! - **Version validation**: refuse files from an incompatible schema
//!
//! ## File Format
//!
//! Projects are saved as `.sct` (Sectio) files containing JSON. Lock files
//! use the `.sct.lock` extension and record who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cost_core::file_io::{save_project, load_project, FileLock};
//! use cost_core::project::Project;
//! use std::path::Path;
//!
//! let project = Project::new("Atelier", "");
//! let path = Path::new("atelier.sct");
//!
//! let lock = FileLock::acquire(path, "comptable@example.com").unwrap();
//! save_project(&project, path).unwrap();
//! drop(lock);
//!
//! let loaded = load_project(path).unwrap();
//! assert_eq!(loaded.meta.name, "Atelier");
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::definition::ProjectDefinition;
use crate::errors::{CalcError, CalcResult};
use crate::project::{Project, SCHEMA_VERSION};

/// Extension of project files
pub const PROJECT_EXTENSION: &str = "sct";

/// Locks older than this are taken over regardless of their owner.
const STALE_LOCK_HOURS: i64 = 24;

/// Lock file metadata stored in .sct.lock files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// `user (machine)`, as shown in a [`CalcError::FileLocked`].
    pub fn holder(&self) -> String {
        format!("{} ({})", self.user_id, self.machine)
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// Exclusive lock on a project file, released on drop.
///
/// Combines an OS-level lock (fs2) with a `.lock` sidecar that tells other
/// users who holds the file.
#[derive(Debug)]
pub struct FileLock {
    project_path: PathBuf,
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a project file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - lock acquired
    /// * `Err(CalcError::FileLocked)` - someone else holds a live lock
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if let Some(existing) = FileLock::check(path) {
            return Err(CalcError::file_locked(
                path.display().to_string(),
                existing.holder(),
                existing.locked_at.to_rfc3339(),
            ));
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| CalcError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            CalcError::file_locked(
                path.display().to_string(),
                "another process".to_string(),
                "unknown".to_string(),
            )
        })?;

        let lock_json = serde_json::to_string_pretty(&info)?;
        lock_file
            .write_all(lock_json.as_bytes())
            .and_then(|_| lock_file.sync_all())
            .map_err(|e| CalcError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;

        tracing::debug!(path = %path.display(), user = %info.user_id, "lock acquired");

        Ok(FileLock {
            project_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Live lock on `path`, if any. Stale or unreadable lock files count as
    /// no lock.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if !lock_path.exists() {
            return None;
        }
        read_lock_info(&lock_path).ok().filter(|info| !is_lock_stale(info))
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `project.sct` -> `project.sct.lock`
fn lock_path_for(project_path: &Path) -> PathBuf {
    let mut lock_path = project_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

fn read_lock_info(lock_path: &Path) -> CalcResult<LockInfo> {
    let contents = fs::read_to_string(lock_path)
        .map_err(|e| CalcError::file_error("read lock", lock_path.display().to_string(), e.to_string()))?;
    Ok(serde_json::from_str(&contents)?)
}

/// A lock is stale when its process is gone (same machine only) or when it
/// is older than a day.
fn is_lock_stale(info: &LockInfo) -> bool {
    if hostname().is_some_and(|ours| ours == info.machine) && !process_alive(info.pid) {
        return true;
    }
    (Utc::now() - info.locked_at).num_hours() > STALE_LOCK_HOURS
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(windows)]
fn process_alive(pid: u32) -> bool {
    use std::process::Command;
    Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).contains(&pid.to_string()))
        .unwrap_or(true)
}

#[cfg(not(any(unix, windows)))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Save a project with atomic write semantics.
///
/// The JSON goes to a `.tmp` sibling first, is synced to disk, then renamed
/// over `path`, so an interrupted save never leaves a truncated project.
pub fn save_project(project: &Project, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(project)?;
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;

    tmp_file
        .write_all(json.as_bytes())
        .and_then(|_| tmp_file.sync_all())
        .map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
        })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    tracing::info!(
        path = %path.display(),
        sections = project.definition.centers.len(),
        "project saved"
    );
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let extension = path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    path.with_extension(extension)
}

/// Load a project from a file.
///
/// # Returns
///
/// * `Ok(Project)` - loaded project
/// * `Err(CalcError::VersionMismatch)` - file written by an incompatible schema
/// * `Err(CalcError::SerializationError)` - invalid JSON
/// * `Err(CalcError::FileError)` - I/O error
pub fn load_project(path: &Path) -> CalcResult<Project> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

    let project = parse_project(&contents).map_err(|e| match e {
        CalcError::SerializationError { reason } => CalcError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), reason),
        },
        other => other,
    })?;

    tracing::info!(
        path = %path.display(),
        name = %project.meta.name,
        sections = project.definition.centers.len(),
        "project loaded"
    );
    Ok(project)
}

/// Load only the definition part of a file, ignoring metadata and settings.
pub fn load_definition(path: &Path) -> CalcResult<ProjectDefinition> {
    load_project(path).map(|project| project.definition)
}

/// Parse project JSON and check its schema version.
///
/// A bare definition (no `projet` header) is accepted and stamped with the
/// current schema version.
pub fn parse_project(json: &str) -> CalcResult<Project> {
    let project: Project = serde_json::from_str(json)?;
    validate_version(&project.meta.version)?;
    Ok(project)
}

/// Load a project, also reporting whether someone else holds its lock.
///
/// # Returns
///
/// * `Ok((Project, None))` - no lock
/// * `Ok((Project, Some(LockInfo)))` - loaded, but another user has the lock
pub fn load_project_with_lock_check(path: &Path) -> CalcResult<(Project, Option<LockInfo>)> {
    let project = load_project(path)?;
    let lock_info = FileLock::check(path);
    Ok((project, lock_info))
}

/// Check that a file version is compatible with [`SCHEMA_VERSION`].
///
/// Major versions must match; while on 0.x, a newer minor is refused too.
pub fn validate_version(file_version: &str) -> CalcResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);

    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    match (file_parts.as_slice(), current_parts.as_slice()) {
        ([file_major, ..], [current_major, ..]) if file_major != current_major => Err(mismatch()),
        ([0, file_minor, ..], [0, current_minor, ..]) if file_minor > current_minor => Err(mismatch()),
        ([_, ..], [_, ..]) => Ok(()),
        _ => Err(mismatch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples;
    use tempfile::TempDir;

    fn project_path(dir: &TempDir, name: &str) -> PathBuf {
        dir.path().join(format!("{}.{}", name, PROJECT_EXTENSION))
    }

    #[test]
    fn test_lock_path_generation() {
        let lock_path = lock_path_for(Path::new("/data/atelier.sct"));
        assert_eq!(lock_path, Path::new("/data/atelier.sct.lock"));
        assert_eq!(tmp_path_for(Path::new("/data/atelier.sct")), Path::new("/data/atelier.sct.tmp"));
    }

    #[test]
    fn test_lock_info_creation() {
        let info = LockInfo::new("comptable@example.com");
        assert_eq!(info.user_id, "comptable@example.com");
        assert!(info.pid > 0);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = project_path(&dir, "roundtrip");

        let project = Project::new("Atelier", "Exercice").with_definition(samples::workshop());
        save_project(&project, &path).unwrap();

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.meta.name, "Atelier");
        assert_eq!(loaded.definition, samples::workshop());
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn test_bare_definition_file_loads() {
        let dir = TempDir::new().unwrap();
        let path = project_path(&dir, "bare");
        fs::write(&path, serde_json::to_string(&samples::tutorial()).unwrap()).unwrap();

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.meta.version, SCHEMA_VERSION);
        assert_eq!(loaded.definition.centers.len(), 3);
        assert_eq!(load_definition(&path).unwrap(), samples::tutorial());
    }

    #[test]
    fn test_invalid_json_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = project_path(&dir, "broken");
        fs::write(&path, "{ not json").unwrap();

        match load_project(&path) {
            Err(CalcError::SerializationError { reason }) => assert!(reason.contains("broken.sct")),
            other => panic!("expected SerializationError, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_file_error() {
        let dir = TempDir::new().unwrap();
        let err = load_project(&project_path(&dir, "absent")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_file_lock_acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let path = project_path(&dir, "locked");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "comptable@example.com").unwrap();
        assert_eq!(lock.info.user_id, "comptable@example.com");
        assert_eq!(lock.project_path(), path.as_path());

        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());
        assert!(FileLock::check(&path).is_some());

        drop(lock);
        assert!(!lock_path.exists());
        assert!(FileLock::check(&path).is_none());
    }

    #[test]
    fn test_second_acquire_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = project_path(&dir, "contended");

        let _held = FileLock::acquire(&path, "alice").unwrap();
        let err = FileLock::acquire(&path, "bob").unwrap_err();
        assert_eq!(err.error_code(), "FILE_LOCKED");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_old_lock_is_stale() {
        let mut info = LockInfo::new("alice");
        info.machine = "another-host".to_string();
        assert!(!is_lock_stale(&info));

        info.locked_at = Utc::now() - chrono::Duration::hours(STALE_LOCK_HOURS + 1);
        assert!(is_lock_stale(&info));
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_newer_schema_is_refused_on_parse() {
        let json = r#"{ "projet": { "version": "0.9.0", "nom": "Futur" } }"#;
        assert!(matches!(parse_project(json), Err(CalcError::VersionMismatch { .. })));
    }

    #[test]
    fn test_load_with_lock_check() {
        let dir = TempDir::new().unwrap();
        let path = project_path(&dir, "lock_check");
        save_project(&Project::new("Atelier", ""), &path).unwrap();

        let (loaded, lock_info) = load_project_with_lock_check(&path).unwrap();
        assert_eq!(loaded.meta.name, "Atelier");
        assert!(lock_info.is_none());
    }
}
