//! Live tail of a single log file.
//!
//! Each [`TailSubscription`] owns one background task. The task holds the open
//! file handle, the byte cursor and the bytes of a not yet terminated line,
//! polls on a fixed interval and pushes [`TailEvent`]s through a bounded
//! channel. Subscriptions never share a cursor.
//!
//! - The cursor starts at end-of-file, so content written before subscribing
//!   is never delivered.
//! - Truncation (size below the cursor) or replacement (different inode on
//!   unix) reopens the file, moves the cursor to the new end-of-file and emits
//!   `Reset`. Lines written between the truncation and the next poll are
//!   skipped.
//! - I/O errors are retried with exponential backoff; once `max_retries` is
//!   exceeded the task emits `Error` and ends.
//! - A run without newline longer than `MAX_PARTIAL_BYTES` is delivered as
//!   several `Line` events instead of being buffered indefinitely.
//! - Dropping the subscription cancels the task, which drops the file handle.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{decode_line, resolve_log_path};
use crate::config::ViewerConfig;
use crate::error::AppResult;
use crate::types::TailEvent;

/// Upper bound on bytes consumed per poll so one burst cannot stall the loop.
const MAX_READ_BYTES_PER_TICK: usize = 64 * 1024;
const MAX_BACKOFF_MS: u64 = 5_000;
/// Longest run of bytes held while waiting for a newline. Longer runs are
/// delivered in chunks of this size.
pub(crate) const MAX_PARTIAL_BYTES: usize = 32 * 1024;

#[derive(Debug, Clone)]
pub struct TailOptions {
    pub poll_interval: Duration,
    pub channel_capacity: usize,
    /// End the subscription after this long without new lines.
    pub idle_timeout: Option<Duration>,
    pub max_retries: u32,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            channel_capacity: 256,
            idle_timeout: None,
            max_retries: 5,
        }
    }
}

impl From<&ViewerConfig> for TailOptions {
    fn from(cfg: &ViewerConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(cfg.tail_poll_interval_ms),
            channel_capacity: cfg.tail_channel_capacity,
            idle_timeout: (cfg.tail_idle_timeout_secs > 0)
                .then(|| Duration::from_secs(cfg.tail_idle_timeout_secs)),
            max_retries: cfg.tail_max_retries,
        }
    }
}

/// A live subscription to lines appended to one log file.
pub struct TailSubscription {
    rx: mpsc::Receiver<TailEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    path: PathBuf,
    start_offset: u64,
}

impl TailSubscription {
    /// Opens `filename` inside `logs_dir` and starts following it from its
    /// current end.
    pub async fn open(logs_dir: &Path, filename: &str, options: TailOptions) -> AppResult<Self> {
        let path = resolve_log_path(logs_dir, filename).await?;
        let file = File::open(&path).await?;
        let meta = file.metadata().await?;
        let offset = meta.len();

        let (tx, rx) = mpsc::channel(options.channel_capacity.max(1));
        let cancel = CancellationToken::new();
        let cursor = Cursor {
            path: path.clone(),
            file,
            identity: file_identity(&meta),
            offset,
            partial: Vec::new(),
        };
        let task = tokio::spawn(run_tail(cursor, tx, cancel.clone(), options));

        debug!(file = %path.display(), offset, "Tail subscription opened");
        Ok(Self { rx, cancel, task: Some(task), path, start_offset: offset })
    }

    /// Waits for the next event. `None` once the subscription has ended.
    pub async fn next_event(&mut self) -> Option<TailEvent> {
        self.rx.recv().await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset the subscription started reading from.
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// Stops the background task and waits for it to release the file.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TailSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Cursor {
    path: PathBuf,
    file: File,
    identity: Option<(u64, u64)>,
    /// Byte position of the next unread byte.
    offset: u64,
    /// Bytes after the last newline seen so far, below `MAX_PARTIAL_BYTES`
    /// between polls.
    partial: Vec<u8>,
}

#[cfg(unix)]
fn file_identity(meta: &std::fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn file_identity(_meta: &std::fs::Metadata) -> Option<(u64, u64)> {
    None
}

impl Cursor {
    async fn poll(&mut self) -> std::io::Result<Vec<TailEvent>> {
        let meta = tokio::fs::metadata(&self.path).await?;
        let replaced = matches!(
            (file_identity(&meta), self.identity),
            (Some(current), Some(opened)) if current != opened
        );

        if replaced || meta.len() < self.offset {
            self.file = File::open(&self.path).await?;
            let fresh = self.file.metadata().await?;
            info!(
                file = %self.path.display(),
                old_offset = self.offset,
                new_offset = fresh.len(),
                replaced,
                "Tail: file truncated or rotated, moving to new end"
            );
            self.identity = file_identity(&fresh);
            self.offset = fresh.len();
            self.partial.clear();
            return Ok(vec![TailEvent::Reset { offset: self.offset }]);
        }

        if meta.len() == self.offset {
            return Ok(Vec::new());
        }

        let limit = (meta.len() - self.offset).min(MAX_READ_BYTES_PER_TICK as u64) as usize;
        self.file.seek(SeekFrom::Start(self.offset)).await?;
        let mut buf = vec![0u8; limit];
        let n = self.file.read(&mut buf).await?;
        buf.truncate(n);
        self.offset += n as u64;
        self.partial.extend_from_slice(&buf);

        let mut events = Vec::new();
        while let Some(pos) = self.partial.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=pos).collect();
            events.push(TailEvent::Line { line: decode_line(&raw) });
        }
        if self.partial.len() >= MAX_PARTIAL_BYTES {
            warn!(
                file = %self.path.display(),
                pending = self.partial.len(),
                "Tail: line exceeds buffer limit, delivering in chunks"
            );
            while self.partial.len() >= MAX_PARTIAL_BYTES {
                let raw: Vec<u8> = self.partial.drain(..MAX_PARTIAL_BYTES).collect();
                events.push(TailEvent::Line { line: String::from_utf8_lossy(&raw).into_owned() });
            }
        }
        Ok(events)
    }
}

/// Exponential backoff starting at `base`, capped at five seconds.
pub(crate) fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let factor = 2u64.saturating_pow(attempt - 1);
    let delay_ms = (base.as_millis() as u64).saturating_mul(factor).min(MAX_BACKOFF_MS);
    Duration::from_millis(delay_ms)
}

/// Sends `event` unless the subscription is cancelled first. Returns false
/// when the task should stop.
async fn deliver(tx: &mpsc::Sender<TailEvent>, cancel: &CancellationToken, event: TailEvent) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        sent = tx.send(event) => sent.is_ok(),
    }
}

async fn run_tail(
    mut cursor: Cursor,
    tx: mpsc::Sender<TailEvent>,
    cancel: CancellationToken,
    options: TailOptions,
) {
    let mut ticker = tokio::time::interval(options.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failures: u32 = 0;
    let mut last_activity = Instant::now();

    'outer: loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match cursor.poll().await {
            Ok(events) => {
                failures = 0;
                if !events.is_empty() {
                    last_activity = Instant::now();
                }
                for event in events {
                    if !deliver(&tx, &cancel, event).await {
                        break 'outer;
                    }
                }
            }
            Err(e) => {
                failures += 1;
                if failures > options.max_retries {
                    warn!(file = %cursor.path.display(), error = %e, "Tail: giving up after repeated I/O errors");
                    let message = format!("tail of {} failed: {}", cursor.path.display(), e);
                    deliver(&tx, &cancel, TailEvent::Error { message }).await;
                    break;
                }
                let delay = backoff_delay(failures, options.poll_interval);
                warn!(
                    file = %cursor.path.display(),
                    error = %e,
                    attempt = failures,
                    delay_ms = delay.as_millis() as u64,
                    "Tail: I/O error, retrying"
                );
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
                continue;
            }
        }

        if let Some(idle) = options.idle_timeout {
            if last_activity.elapsed() >= idle {
                debug!(file = %cursor.path.display(), "Tail: idle timeout reached");
                break;
            }
        }
    }

    debug!(file = %cursor.path.display(), offset = cursor.offset, "Tail subscription closed");
}
