//! Platform integration for clipd: reading and writing the OS clipboard,
//! the two change-detection drivers (event-pushed and polled), best-effort
//! source-application identification, and the daemon's single-instance lock.

pub mod clipboard;
pub mod lock;
pub mod source_app;
pub mod watch;

pub use clipboard::SystemClipboard;
pub use lock::{InstanceLock, LockError, LockState};
pub use watch::{BackendKind, ClipboardBackend};
