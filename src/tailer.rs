//! Following a growing log file
//!
//! [`tail_lines`] optionally replays the tail end of the file, then polls for
//! appended data. Truncation restarts reading from the beginning and, on unix,
//! a replaced file (log rotation) is detected by inode and reopened.

use crate::types::{BacklogLines, ChannelCapacity};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Lines longer than this are dropped
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Average access log line length used to size the backfill read
const ESTIMATED_LINE_BYTES: u64 = 150;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TailError {
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{0}' is not a regular file")]
    NotAFile(PathBuf),
}

/// How a file is tailed
#[derive(Debug, Clone, Copy)]
pub struct TailOptions {
    /// Lines replayed from the end of the file before following
    pub backfill_lines: BacklogLines,
    /// Skip the replay and only report new lines
    pub from_end: bool,
    pub poll_interval: Duration,
    pub channel_capacity: ChannelCapacity,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            backfill_lines: BacklogLines::default(),
            from_end: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            channel_capacity: ChannelCapacity::default(),
        }
    }
}

/// Start tailing `path`
///
/// The file is opened before returning so a missing or unreadable path is
/// reported to the caller. The returned channel closes when `shutdown` fires,
/// when the receiver is dropped, or on an unrecoverable read error.
pub async fn tail_lines(
    path: impl Into<PathBuf>,
    options: TailOptions,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<mpsc::Receiver<String>, TailError> {
    let path = path.into();
    let file = File::open(&path).await.map_err(|source| TailError::Open {
        path: path.clone(),
        source,
    })?;
    let metadata = file.metadata().await.map_err(|source| TailError::Open {
        path: path.clone(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(TailError::NotAFile(path));
    }

    let (tx, rx) = mpsc::channel(options.channel_capacity.get());
    let end = metadata.len();

    tokio::spawn(async move {
        if !options.from_end {
            match backfill(&path, end, options.backfill_lines.get(), &tx).await {
                Ok(sent) => debug!("Replayed {} lines from {}", sent, path.display()),
                Err(e) if tx.is_closed() => {
                    debug!("Backfill stopped: {}", e);
                    return;
                }
                Err(e) => warn!("Failed to replay {}: {}", path.display(), e),
            }
        }

        let mut follower = match Follower::start(path, file, end).await {
            Ok(follower) => follower,
            Err(e) => {
                warn!("Failed to follow log file: {}", e);
                return;
            }
        };
        info!("Following {}", follower.path.display());

        let mut interval = tokio::time::interval(options.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("Tailer received shutdown signal");
                    break;
                }
                _ = interval.tick() => {
                    match follower.poll(&tx).await {
                        Ok(true) => {}
                        Ok(false) => {
                            debug!("Line receiver dropped, stopping tailer");
                            break;
                        }
                        Err(e) => {
                            warn!("Error reading {}: {}", follower.path.display(), e);
                            break;
                        }
                    }
                }
            }
        }
    });

    Ok(rx)
}

/// Send up to `lines` complete lines that end at or before `end`
async fn backfill(
    path: &Path,
    end: u64,
    lines: usize,
    tx: &mpsc::Sender<String>,
) -> std::io::Result<usize> {
    let wanted = (lines as u64).saturating_mul(ESTIMATED_LINE_BYTES);
    let start = end.saturating_sub(wanted);
    // One extra byte tells whether `start` sits on a line boundary
    let read_from = start.saturating_sub(1);

    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(read_from)).await?;
    let mut buf = Vec::with_capacity(usize::try_from(end - read_from).unwrap_or(0));
    file.take(end - read_from).read_to_end(&mut buf).await?;

    let mut segments: Vec<&[u8]> = buf.split(|&b| b == b'\n').collect();
    // Trailing segment has no newline yet; the follower picks it up
    segments.pop();
    if start > 0 && !segments.is_empty() {
        segments.remove(0);
    }

    let skip = segments.len().saturating_sub(lines);
    let mut sent = 0;
    for segment in segments.into_iter().skip(skip) {
        if segment.len() > MAX_LINE_BYTES {
            debug!("Dropping {} byte line during backfill", segment.len());
            continue;
        }
        if tx.send(decode_line(segment)).await.is_err() {
            return Err(std::io::Error::other("line receiver closed"));
        }
        sent += 1;
    }
    Ok(sent)
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(unix)]
fn file_id(metadata: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

#[cfg(not(unix))]
fn file_id(_metadata: &std::fs::Metadata) -> u64 {
    0
}

struct Follower {
    path: PathBuf,
    reader: BufReader<File>,
    position: u64,
    file_id: u64,
    /// Bytes of a line whose newline has not been written yet
    partial: Vec<u8>,
    /// Set while skipping the remainder of an over-long line
    oversized: bool,
}

impl Follower {
    async fn start(path: PathBuf, mut file: File, position: u64) -> std::io::Result<Self> {
        let file_id = file_id(&file.metadata().await?);
        file.seek(SeekFrom::Start(position)).await?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
            position,
            file_id,
            partial: Vec::new(),
            oversized: false,
        })
    }

    /// Read whatever was appended since the last poll
    ///
    /// Returns `Ok(false)` once the receiver is gone.
    async fn poll(&mut self, tx: &mpsc::Sender<String>) -> std::io::Result<bool> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            // Rotated away and not recreated yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return self.read_available(tx).await;
            }
            Err(e) => return Err(e),
        };

        if file_id(&metadata) != self.file_id {
            if !self.read_available(tx).await? {
                return Ok(false);
            }
            info!("{} was rotated, reopening", self.path.display());
            let file = File::open(&self.path).await?;
            self.file_id = file_id(&file.metadata().await?);
            self.reader = BufReader::new(file);
            self.reset();
        } else if metadata.len() < self.position {
            info!("{} was truncated, reading from start", self.path.display());
            self.reader.seek(SeekFrom::Start(0)).await?;
            self.reset();
        }

        self.read_available(tx).await
    }

    fn reset(&mut self) {
        self.position = 0;
        self.partial.clear();
        self.oversized = false;
    }

    async fn read_available(&mut self, tx: &mpsc::Sender<String>) -> std::io::Result<bool> {
        loop {
            let read = self.reader.read_until(b'\n', &mut self.partial).await?;
            if read == 0 {
                return Ok(true);
            }
            self.position += read as u64;

            if self.partial.last() != Some(&b'\n') {
                if self.partial.len() > MAX_LINE_BYTES {
                    self.partial.clear();
                    self.oversized = true;
                }
                continue;
            }

            let complete = std::mem::take(&mut self.partial);
            if std::mem::take(&mut self.oversized) || complete.len() > MAX_LINE_BYTES + 1 {
                debug!("Dropping over-long line");
                continue;
            }
            if tx.send(decode_line(&complete[..complete.len() - 1])).await.is_err() {
                return Ok(false);
            }
        }
    }
}
