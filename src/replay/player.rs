//! Paced tag replay
//!
//! Re-reads raw tags from the source by byte range and writes them to an
//! async sink: the metadata tag once, then one video tag per tick.

use std::future::Future;
use std::io::SeekFrom;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{interval, MissedTickBehavior};

use super::config::ReplayConfig;
use super::index::{ReplayIndex, TagRange};
use crate::error::Result;

/// Random-access reader for indexed tags
#[derive(Debug)]
pub struct ReplaySource<R> {
    inner: R,
}

impl<R: AsyncRead + AsyncSeek + Unpin> ReplaySource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the full tag bytes of `range`
    pub async fn read_range(&mut self, range: &TagRange) -> std::io::Result<Bytes> {
        self.inner.seek(SeekFrom::Start(range.offset)).await?;
        let mut buf = BytesMut::zeroed(range.size as usize);
        self.inner.read_exact(&mut buf).await?;
        Ok(buf.freeze())
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Replay statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Tags written, metadata included
    pub tags_sent: u64,
    pub bytes_sent: u64,
    /// Completed passes over the video tags
    pub passes: u32,
    /// Stopped by the shutdown future
    pub interrupted: bool,
}

/// Replay `index` from `source` into `sink` until done or `shutdown` resolves
///
/// Shutdown is observed between tags, so the sink never receives a partial
/// tag.
pub async fn replay<R, W, F>(
    source: &mut ReplaySource<R>,
    index: &ReplayIndex,
    sink: &mut W,
    config: &ReplayConfig,
    shutdown: F,
) -> Result<ReplayStats>
where
    R: AsyncRead + AsyncSeek + Unpin,
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    let mut stats = ReplayStats::default();

    if index.is_empty() {
        tracing::warn!("No video tags to replay");
        return Ok(stats);
    }

    if config.send_metadata {
        if let Some(metadata) = index.metadata() {
            send(source, sink, metadata, &mut stats).await?;
            tracing::debug!(size = metadata.size, "Sent metadata tag");
        }
    }

    tokio::pin!(shutdown);
    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    'passes: loop {
        for range in index.videos() {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received");
                    stats.interrupted = true;
                    break 'passes;
                }
                _ = ticker.tick() => {}
            }
            send(source, sink, range, &mut stats).await?;
        }

        stats.passes += 1;
        let limit_reached = config.max_passes.is_some_and(|max| stats.passes >= max);
        if !config.loop_playback || limit_reached {
            break;
        }
        tracing::debug!(passes = stats.passes, "Looping back to first video tag");
    }

    sink.flush().await?;

    tracing::info!(
        tags = stats.tags_sent,
        bytes = stats.bytes_sent,
        passes = stats.passes,
        interrupted = stats.interrupted,
        "Replay finished"
    );

    Ok(stats)
}

async fn send<R, W>(
    source: &mut ReplaySource<R>,
    sink: &mut W,
    range: &TagRange,
    stats: &mut ReplayStats,
) -> Result<()>
where
    R: AsyncRead + AsyncSeek + Unpin,
    W: AsyncWrite + Unpin,
{
    let data = source.read_range(range).await?;
    sink.write_all(&data).await?;
    stats.tags_sent += 1;
    stats.bytes_sent += data.len() as u64;
    tracing::trace!(
        kind = range.kind.name(),
        offset = range.offset,
        size = range.size,
        timestamp = range.timestamp,
        "Sent tag"
    );
    Ok(())
}
