use std::process::ExitCode;

use anyhow::Result;

use clipd_core::config::RuntimeConfig;
use clipd_platform::{InstanceLock, LockState};

/// Probe the daemon lock. Exit 0 when a daemon is running, 1 otherwise, so
/// scripts can branch on the status without parsing output.
pub fn run(config: &RuntimeConfig) -> Result<ExitCode> {
    match InstanceLock::probe(&config.lock_file)? {
        LockState::Held { pid: Some(pid) } => {
            println!("clipd daemon is running (pid {pid})");
            Ok(ExitCode::SUCCESS)
        }
        LockState::Held { pid: None } => {
            println!("clipd daemon is running");
            Ok(ExitCode::SUCCESS)
        }
        LockState::Free => {
            println!("clipd daemon is not running");
            Ok(ExitCode::from(1))
        }
    }
}
