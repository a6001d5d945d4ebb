//! Core domain model for clipd.
//!
//! This crate is platform- and storage-agnostic: it defines what a clipboard
//! entry *is*, how raw captures are classified, and the policies (blacklist,
//! single-line escaping, content fingerprinting) that the store and the
//! backends share. Anything that touches sqlite lives in `clipd-infra`;
//! anything that touches the OS clipboard lives in `clipd-platform`.

pub mod classify;
pub mod config;
pub mod entry;
pub mod escape;
pub mod hash;
pub mod paths;
pub mod policy;
pub mod snapshot;

pub use config::Settings;
pub use entry::{ClipEntry, ContentType};
pub use snapshot::{RawContent, Snapshot};
