//! Single-instance enforcement for the daemon.
//!
//! One lock file per user, held with an exclusive advisory `flock` for the
//! daemon's lifetime and carrying its pid. The kernel releases the lock when
//! the process dies, so a crashed daemon never leaves a stale lock behind.
//! `status` probes the same file non-destructively.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another clipd daemon is already running{}", fmt_pid(.pid))]
    AlreadyHeld { pid: Option<u32> },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn fmt_pid(pid: &Option<u32>) -> String {
    match pid {
        Some(pid) => format!(" (pid {pid})"),
        None => String::new(),
    }
}

/// Result of a non-destructive lock probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Free,
    Held { pid: Option<u32> },
}

/// Exclusive daemon lock, released on drop or process exit.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Acquire the lock, failing fast when another daemon holds it.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        match try_flock(&file) {
            FlockOutcome::Acquired => {}
            FlockOutcome::Held => {
                return Err(LockError::AlreadyHeld {
                    pid: read_pid(path),
                })
            }
            FlockOutcome::Failed(e) => return Err(e.into()),
        }

        file.set_len(0)?;
        file.write_all(std::process::id().to_string().as_bytes())?;
        file.flush()?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Check whether a daemon currently holds the lock, without disturbing
    /// it. A missing lock file means no daemon ever ran.
    pub fn probe(path: &Path) -> Result<LockState, LockError> {
        if !path.exists() {
            return Ok(LockState::Free);
        }
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        match try_flock(&file) {
            FlockOutcome::Acquired => {
                // We got the lock, so no daemon is running; release it again
                // by letting `file` drop.
                unflock(&file);
                Ok(LockState::Free)
            }
            FlockOutcome::Held => Ok(LockState::Held {
                pid: read_pid(path),
            }),
            FlockOutcome::Failed(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        unflock(&self.file);
    }
}

fn read_pid(path: &Path) -> Option<u32> {
    let mut raw = String::new();
    File::open(path).ok()?.read_to_string(&mut raw).ok()?;
    raw.trim().parse().ok()
}

enum FlockOutcome {
    Acquired,
    Held,
    Failed(std::io::Error),
}

#[cfg(unix)]
fn try_flock(file: &File) -> FlockOutcome {
    use std::os::unix::io::AsRawFd;

    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return FlockOutcome::Acquired;
    }
    let err = std::io::Error::last_os_error();
    if err.kind() == std::io::ErrorKind::WouldBlock {
        FlockOutcome::Held
    } else {
        FlockOutcome::Failed(err)
    }
}

#[cfg(unix)]
fn unflock(file: &File) {
    use std::os::unix::io::AsRawFd;

    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

// Advisory file locks are not portable; elsewhere the lock degrades to a
// pid marker file and every acquire succeeds.
#[cfg(not(unix))]
fn try_flock(_file: &File) -> FlockOutcome {
    FlockOutcome::Acquired
}

#[cfg(not(unix))]
fn unflock(_file: &File) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn acquire_writes_pid_and_probe_sees_it_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.lock");

        let lock = InstanceLock::acquire(&path).unwrap();
        assert_eq!(read_pid(&path), Some(std::process::id()));

        // flock is per open-file-description, so probing from this same
        // process with a fresh descriptor sees the lock as held.
        match InstanceLock::probe(&path).unwrap() {
            LockState::Held { pid } => assert_eq!(pid, Some(std::process::id())),
            LockState::Free => panic!("expected lock to be held"),
        }

        drop(lock);
        assert_eq!(InstanceLock::probe(&path).unwrap(), LockState::Free);
    }

    #[test]
    fn probe_on_missing_file_is_free() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.lock");
        assert_eq!(InstanceLock::probe(&path).unwrap(), LockState::Free);
    }

    #[test]
    fn second_acquire_fails_with_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.lock");

        let _lock = InstanceLock::acquire(&path).unwrap();
        match InstanceLock::acquire(&path) {
            Err(LockError::AlreadyHeld { .. }) => {}
            other => panic!("expected AlreadyHeld, got {other:?}"),
        }
    }
}
