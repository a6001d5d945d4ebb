//! Clipboard change detection.
//!
//! Two drivers feed one mpsc channel of [`Snapshot`]s:
//!
//! - the **event driver** subscribes to the platform's clipboard-changed
//!   notification stream and reads a snapshot per notification;
//! - the **poll driver** reads the clipboard on a fixed interval and emits
//!   only when the content fingerprint changed.
//!
//! Both run on a dedicated thread (the underlying clipboard context is not
//! `Send`) and block there, so the daemon's async loop just awaits the
//! channel. A failed read is logged and skipped, never fatal; after two
//! consecutive unreadable or empty reads the clipboard is considered empty
//! and further misses are quiet until content reappears.

use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clipboard_rs::{ClipboardHandler, ClipboardWatcher, ClipboardWatcherContext};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use clipd_core::config::{Settings, WatchMode};
use clipd_core::hash::fingerprint;
use clipd_core::snapshot::Snapshot;

use crate::clipboard::SystemClipboard;
use crate::source_app;

const CHANNEL_CAPACITY: usize = 64;

/// Reads give up on the clipboard after this many consecutive misses.
const EMPTY_READ_LIMIT: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Event,
    Poll,
}

/// Handle to a running change-detection driver.
pub struct ClipboardBackend {
    rx: mpsc::Receiver<Snapshot>,
    kind: BackendKind,
}

impl ClipboardBackend {
    /// Start the driver selected by `watch_mode`. `Auto` prefers the event
    /// driver and falls back to polling when change notifications cannot be
    /// set up on this platform.
    pub fn spawn(settings: &Settings) -> Result<Self> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let poll_interval = Duration::from_millis(settings.poll_interval_ms.max(100));

        let kind = match settings.watch_mode {
            WatchMode::Event => {
                spawn_event_driver(tx)?;
                BackendKind::Event
            }
            WatchMode::Poll => {
                spawn_poll_driver(tx, poll_interval)?;
                BackendKind::Poll
            }
            WatchMode::Auto => match spawn_event_driver(tx.clone()) {
                Ok(()) => BackendKind::Event,
                Err(e) => {
                    info!(error = %e, "clipboard change notifications unavailable, polling instead");
                    spawn_poll_driver(tx, poll_interval)?;
                    BackendKind::Poll
                }
            },
        };

        Ok(Self { rx, kind })
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Next detected clipboard change. `None` means the driver thread died.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }
}

/// Tracks consecutive unreadable/empty reads so the log stays quiet while
/// the clipboard simply has nothing for us.
struct EmptyReads(u32);

impl EmptyReads {
    fn new() -> Self {
        Self(0)
    }

    fn hit(&mut self) {
        self.0 += 1;
        if self.0 == EMPTY_READ_LIMIT {
            debug!("no readable clipboard content");
        }
    }

    fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Event-driver callback: one snapshot read per change notification.
struct ChangeForwarder {
    clipboard: SystemClipboard,
    tx: mpsc::Sender<Snapshot>,
    empty_reads: EmptyReads,
}

impl ClipboardHandler for ChangeForwarder {
    fn on_clipboard_change(&mut self) {
        match self.clipboard.read_raw() {
            Ok(Some(content)) => {
                self.empty_reads.reset();
                let snapshot = Snapshot {
                    content,
                    source_app: source_app::detect(),
                };
                if self.tx.blocking_send(snapshot).is_err() {
                    warn!("snapshot channel closed, dropping clipboard change");
                }
            }
            Ok(None) => self.empty_reads.hit(),
            Err(e) => {
                warn!(error = %e, "failed to read clipboard snapshot");
                self.empty_reads.hit();
            }
        }
    }
}

/// Start the event driver; returns once the watcher is subscribed so `Auto`
/// mode can fall back to polling on failure.
fn spawn_event_driver(tx: mpsc::Sender<Snapshot>) -> Result<()> {
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();

    thread::Builder::new()
        .name("clipd-watch-event".into())
        .spawn(move || {
            let clipboard = match SystemClipboard::new() {
                Ok(clipboard) => clipboard,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let handler = ChangeForwarder {
                clipboard,
                tx,
                empty_reads: EmptyReads::new(),
            };

            let mut watcher = match ClipboardWatcherContext::new() {
                Ok(watcher) => watcher,
                Err(e) => {
                    let _ = ready_tx.send(Err(anyhow!(e)));
                    return;
                }
            };
            watcher.add_handler(handler);
            let _ = ready_tx.send(Ok(()));

            // Blocks for the life of the daemon.
            watcher.start_watch();
        })
        .context("spawning clipboard watcher thread")?;

    ready_rx
        .recv()
        .context("clipboard watcher thread exited during startup")?
}

/// Start the poll driver: fixed-interval reads, fingerprint-compared.
fn spawn_poll_driver(tx: mpsc::Sender<Snapshot>, interval: Duration) -> Result<()> {
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();

    thread::Builder::new()
        .name("clipd-watch-poll".into())
        .spawn(move || {
            let mut clipboard = match SystemClipboard::new() {
                Ok(clipboard) => clipboard,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));

            let mut last_fingerprint: Option<String> = None;
            let mut empty_reads = EmptyReads::new();

            loop {
                match clipboard.read_raw() {
                    Ok(Some(content)) => {
                        empty_reads.reset();
                        let fp = fingerprint(&content);
                        if last_fingerprint.as_deref() != Some(fp.as_str()) {
                            last_fingerprint = Some(fp);
                            let snapshot = Snapshot {
                                content,
                                source_app: source_app::detect(),
                            };
                            if tx.blocking_send(snapshot).is_err() {
                                // Daemon went away; stop polling.
                                return;
                            }
                        }
                    }
                    Ok(None) => empty_reads.hit(),
                    Err(e) => {
                        warn!(error = %e, "clipboard read failed, skipping poll tick");
                        empty_reads.hit();
                    }
                }

                thread::sleep(interval);
            }
        })
        .context("spawning clipboard poll thread")?;

    ready_rx
        .recv()
        .context("clipboard poll thread exited during startup")?
}
