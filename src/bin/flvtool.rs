//! flvtool - inspect FLV files, extract H.264, replay tags over TCP
//!
//! ```text
//! flvtool info input.flv
//! flvtool extract input.flv -o out.h264
//! flvtool replay input.flv 127.0.0.1:9000 --interval-ms 20
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tokio::net::TcpStream;
use tokio::sync::watch;

use flv_rs::demux::ScanOutcome;
use flv_rs::media::annexb::AnnexBWriter;
use flv_rs::media::flv::{TagKind, VideoBody};
use flv_rs::{FlvError, FlvScanner, ReplayConfig, ReplayIndex, ReplaySource, ScanConfig, ScriptData};

/// FLV demuxer and H.264 extractor
#[derive(Parser)]
#[command(name = "flvtool")]
#[command(version, about)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print header, tag counts, metadata and codec configuration
    Info {
        input: PathBuf,

        /// Stop after this many tags
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Write the H.264 stream in Annex B framing
    Extract {
        input: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "out.h264")]
        output: PathBuf,
    },

    /// Replay metadata and video tags to a TCP peer
    Replay {
        input: PathBuf,

        /// Peer address, e.g. 127.0.0.1:9000
        addr: String,

        /// Milliseconds between video tags
        #[arg(long, default_value_t = 20)]
        interval_ms: u64,

        /// Play the video tags once instead of looping
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let (cancel, interrupt) = spawn_interrupt_handler();

    match cli.command {
        Commands::Info { input, limit } => {
            let mut config = ScanConfig::default();
            if let Some(limit) = limit {
                config = config.max_tags(limit);
            }
            tokio::task::spawn_blocking(move || info(&input, config, &cancel)).await??;
        }
        Commands::Extract { input, output } => {
            tokio::task::spawn_blocking(move || extract(&input, &output, &cancel)).await??;
        }
        Commands::Replay {
            input,
            addr,
            interval_ms,
            once,
        } => {
            let mut config = ReplayConfig::default().interval(Duration::from_millis(interval_ms));
            if once {
                config = config.once();
            }
            replay(input, &addr, config, cancel, interrupt).await?;
        }
    }

    Ok(())
}

/// Raise the cancel flag and notify watchers on Ctrl-C
fn spawn_interrupt_handler() -> (Arc<AtomicBool>, watch::Receiver<bool>) {
    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = watch::channel(false);
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupted");
                flag.store(true, Ordering::Relaxed);
                tx.send_replace(true);
            }
            Err(e) => tracing::error!(error = %e, "Unable to listen for Ctrl-C"),
        }
    });
    (cancel, rx)
}

/// Resolves once an interrupt has been raised, including one raised before
/// the call; never resolves if the handler is gone without raising one
async fn interrupted(mut interrupt: watch::Receiver<bool>) {
    if interrupt.wait_for(|raised| *raised).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Scan a file; a failed scan keeps the tags decoded before the failure
fn scan_file(
    path: &Path,
    config: ScanConfig,
    cancel: &AtomicBool,
) -> Result<(FlvScanner<BufReader<File>>, Option<FlvError>)> {
    let mut scanner = FlvScanner::open_path(path, config)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let failure = match scanner.scan_until(cancel) {
        Ok(summary) => {
            if summary.outcome == ScanOutcome::Cancelled {
                tracing::warn!(tags = summary.tags, "Scan cancelled");
            }
            None
        }
        Err(e) => Some(e),
    };

    Ok((scanner, failure))
}

fn info(path: &Path, config: ScanConfig, cancel: &AtomicBool) -> Result<()> {
    let (scanner, failure) = scan_file(path, config, cancel)?;
    let header = scanner.header();
    let store = scanner.store();

    tracing::info!(
        signature = %String::from_utf8_lossy(&header.signature),
        version = header.version,
        has_audio = header.has_audio(),
        has_video = header.has_video(),
        data_offset = header.data_offset,
        "Header"
    );

    let counts = store.kind_counts();
    tracing::info!(
        total = counts.total(),
        audio = counts.audio,
        video = counts.video,
        script_data = counts.script_data,
        keyframes = store.iter().filter(|t| t.is_keyframe()).count(),
        "Tags"
    );

    for tag in store.iter_kind(TagKind::ScriptData) {
        let Some(data) = tag.script_data() else {
            continue;
        };
        match ScriptData::decode(data) {
            Ok(script) => {
                tracing::info!(name = %script.name, offset = tag.byte_offset, "Script data");
                if script.is_metadata() {
                    let meta = &script.value;
                    tracing::info!(
                        duration = meta.get_number("duration"),
                        width = meta.get_number("width"),
                        height = meta.get_number("height"),
                        framerate = meta.get_number("framerate"),
                        encoder = meta.get_string("encoder"),
                        "Metadata"
                    );
                }
                for line in script.describe() {
                    tracing::info!("  {line}");
                }
            }
            Err(e) => tracing::warn!(error = %e, offset = tag.byte_offset, "Undecodable script data"),
        }
    }

    let config = store
        .iter()
        .filter_map(|t| t.video())
        .find_map(|v| match &v.body {
            VideoBody::Avc(packet) => packet.config(),
            VideoBody::Opaque(_) => None,
        });
    if let Some(config) = config {
        tracing::info!(
            profile = config.profile_name(),
            level = %config.level_string(),
            nalu_length_size = config.nalu_length_size(),
            sps_len = config.sps.len(),
            pps_len = config.pps.len(),
            "AVC configuration"
        );
    }

    match failure {
        Some(e) => Err(e).context("scan stopped early"),
        None => Ok(()),
    }
}

fn extract(input: &Path, output: &Path, cancel: &AtomicBool) -> Result<()> {
    let (scanner, failure) = scan_file(input, ScanConfig::default(), cancel)?;

    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = AnnexBWriter::new(BufWriter::new(file));
    let stats = writer.write_store(scanner.store())?;
    writer.finish()?;

    tracing::info!(
        output = %output.display(),
        bytes = stats.bytes_written,
        nal_units = stats.nal_units,
        "Wrote Annex B stream"
    );

    match failure {
        Some(e) => Err(e).context("scan stopped early; output holds the tags decoded so far"),
        None => Ok(()),
    }
}

async fn replay(
    input: PathBuf,
    addr: &str,
    config: ReplayConfig,
    cancel: Arc<AtomicBool>,
    interrupt: watch::Receiver<bool>,
) -> Result<()> {
    let index = {
        let input = input.clone();
        let cancel = Arc::clone(&cancel);
        tokio::task::spawn_blocking(move || -> Result<ReplayIndex> {
            let (scanner, failure) = scan_file(&input, ScanConfig::default(), &cancel)?;
            if let Some(e) = failure {
                tracing::warn!(error = %e, "Replaying tags decoded before the failure");
            }
            Ok(ReplayIndex::from_store(scanner.store()))
        })
        .await??
    };
    if cancel.load(Ordering::Relaxed) {
        tracing::info!("Interrupted while indexing, not replaying");
        return Ok(());
    }

    let file = tokio::fs::File::open(&input)
        .await
        .with_context(|| format!("failed to open {}", input.display()))?;
    let mut source = ReplaySource::new(file);

    let mut stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;
    stream.set_nodelay(true)?;
    tracing::info!(addr, videos = index.video_count(), "Connected, replaying");

    flv_rs::replay(&mut source, &index, &mut stream, &config, interrupted(interrupt)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const WAIT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_interrupted_raised_before_wait() {
        let (tx, rx) = watch::channel(false);
        tx.send_replace(true);
        drop(tx);
        assert!(tokio::time::timeout(WAIT, interrupted(rx)).await.is_ok());
    }

    #[tokio::test]
    async fn test_interrupted_raised_while_waiting() {
        let (tx, rx) = watch::channel(false);
        let wait = tokio::spawn(interrupted(rx));
        tokio::task::yield_now().await;
        tx.send_replace(true);
        assert!(tokio::time::timeout(WAIT, wait).await.is_ok());
    }

    #[tokio::test]
    async fn test_interrupted_pending_without_signal() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        assert!(tokio::time::timeout(WAIT, interrupted(rx)).await.is_err());
    }

    #[tokio::test]
    async fn test_replay_skipped_after_interrupt_during_indexing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'F', b'L', b'V', 0x01, 0x01, 0x00, 0x00, 0x00, 0x09, 0, 0, 0, 0])
            .unwrap();
        file.flush().unwrap();

        let cancel = Arc::new(AtomicBool::new(true));
        let (_tx, rx) = watch::channel(true);
        // The address is never dialed once the interrupt is seen
        let result = replay(
            file.path().to_path_buf(),
            "invalid address",
            ReplayConfig::default(),
            cancel,
            rx,
        )
        .await;
        assert!(result.is_ok());
    }
}
