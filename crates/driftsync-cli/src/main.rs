//! driftsync CLI
//!
//! Resumable chunked file transfer and content-hash directory diffing.

mod config;
mod progress;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use clap::{Parser, Subcommand};
use console::style;

use driftsync_transfer::{Receiver, Sender, TransferOutcome};
use driftsync_watch::{DiffReport, DirWatcher, IndexStore, WatchEngine, build_snapshot, diff};

use config::Config;
use progress::{TransferProgress, format_bytes, format_speed};

/// driftsync - resumable file transfer with directory diffing
#[derive(Parser)]
#[command(name = "driftsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a file to a receiving peer
    Send {
        /// File to send
        #[arg(required = true)]
        file: String,

        /// Peer address (host or host:port)
        #[arg(required = true)]
        peer: String,
    },

    /// Receive a single file from a peer
    Receive {
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Listen address
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Compare a directory against its persisted index and refresh it
    Scan {
        /// Directory to scan
        root: Option<PathBuf>,
    },

    /// Scan, then keep the live snapshot current until Ctrl-C
    Watch {
        /// Directory to watch
        root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            "debug"
        } else {
            config.logging.level.as_str()
        })
        .init();

    match cli.command {
        Commands::Send { file, peer } => {
            send_file(&file, &peer, &config).await?;
        }
        Commands::Receive { output, bind } => {
            receive_file(output, bind, &config).await?;
        }
        Commands::Scan { root } => {
            let root = resolve_root(root, &config)?;
            scan_tree(&root)?;
        }
        Commands::Watch { root } => {
            let root = resolve_root(root, &config)?;
            watch_tree(root).await?;
        }
    }

    Ok(())
}

/// Send a file to a peer
async fn send_file(file: &str, peer: &str, config: &Config) -> anyhow::Result<()> {
    let path = normalize_path(file);
    if !path.is_file() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let peer = resolve_peer_addr(peer, config.network.default_port)?;
    let size = std::fs::metadata(&path)?.len();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    println!("File: {}", path.display());
    println!("Size: {}", format_bytes(size));
    println!("Peer: {peer}");

    let bar = TransferProgress::new(size, name);
    let mut sized = false;

    let sender = Sender::new(peer);
    let result = sender
        .send_file_with(&path, |sent, total| {
            if !sized {
                bar.set_length(total);
                sized = true;
            }
            bar.update(sent);
        })
        .await;

    match result {
        Ok(report) => {
            let rate = report.bytes as f64 / report.elapsed.as_secs_f64().max(f64::EPSILON);
            bar.finish_with_message(format!(
                "Sent {} chunks, {} ({})",
                report.chunks,
                format_bytes(report.bytes),
                format_speed(rate)
            ));
            Ok(())
        }
        Err(err) => {
            bar.abandon();
            Err(err.into())
        }
    }
}

/// Receive one file, then exit
async fn receive_file(
    output: Option<PathBuf>,
    bind: Option<String>,
    config: &Config,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| config.transfer.output_dir.clone());
    if !output.exists() {
        std::fs::create_dir_all(&output)?;
    }

    let bind: SocketAddr = match bind {
        Some(addr) => addr.parse()?,
        None => config.parse_listen_addr()?,
    };

    let receiver = Receiver::bind(bind, output.clone()).await?;
    println!("Output directory: {}", output.display());
    println!("Listening on: {}", receiver.local_addr()?);

    match receiver.serve_once().await? {
        TransferOutcome::Complete { bytes, elapsed } => {
            let rate = bytes as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
            println!(
                "Transfer complete: {} in {:.2}s ({})",
                format_bytes(bytes),
                elapsed.as_secs_f64(),
                format_speed(rate)
            );
        }
        TransferOutcome::Aborted { missing } => {
            println!("Transfer interrupted: {missing} chunks still missing, progress saved");
            println!("Re-run receive with the same output directory to resume");
        }
        TransferOutcome::Rejected => {
            println!("Transfer rejected: target file already exists");
        }
    }

    Ok(())
}

/// Load the index, walk the tree, report divergence, refresh the index.
/// Returns the fresh snapshot for callers that keep working with it.
fn scan_tree(root: &Path) -> anyhow::Result<driftsync_watch::Snapshot> {
    let store = IndexStore::new(root);
    let previous = store.load_or_empty();

    let started = Instant::now();
    let fresh = build_snapshot(root)?;
    tracing::info!(
        files = fresh.len(),
        elapsed_s = format!("{:.2}", started.elapsed().as_secs_f64()),
        "tree walk finished"
    );

    let report = diff(&previous, &fresh);
    print_report(root, &report);

    store.save(&fresh)?;
    Ok(fresh)
}

/// Scan, then keep the live snapshot current until Ctrl-C
async fn watch_tree(root: PathBuf) -> anyhow::Result<()> {
    let fresh = scan_tree(&root)?;

    let watcher = DirWatcher::watch(&root)?;
    let engine = Arc::new(WatchEngine::new(root.clone(), fresh));
    let stop = Arc::new(AtomicBool::new(false));

    let loop_engine = engine.clone();
    let loop_stop = stop.clone();
    let handle =
        tokio::task::spawn_blocking(move || loop_engine.run(&watcher, &loop_stop));

    println!("Watching {} (Ctrl-C to stop)...", root.display());
    tokio::signal::ctrl_c().await?;
    println!("\nShutting down...");

    stop.store(true, Ordering::Relaxed);
    handle.await?;

    println!("Stopped with {} files tracked", engine.file_count());
    Ok(())
}

/// Print a divergence report in section order: created, renamed,
/// modified, deleted
fn print_report(root: &Path, report: &DiffReport) {
    println!(
        "{} {}",
        style("Divergence for").bold(),
        style(root.display()).bold()
    );

    if report.is_empty() {
        println!("  index and tree are in sync");
        return;
    }

    println!("{} ({}):", style("CREATED").green(), report.created.len());
    for (path, entry) in &report.created {
        println!("  |- {} ({})", path.display(), format_bytes(entry.stat.size));
    }

    println!("{} ({}):", style("RENAMED").cyan(), report.renamed.len());
    for (from, to, _) in &report.renamed {
        println!("  |- {} -> {}", from.display(), to.display());
    }

    println!("{} ({}):", style("MODIFIED").yellow(), report.modified.len());
    for (path, entry) in &report.modified {
        println!("  |- {} ({})", path.display(), format_bytes(entry.stat.size));
    }

    println!("{} ({}):", style("DELETED").red(), report.deleted.len());
    for (path, _) in &report.deleted {
        println!("  |- {}", path.display());
    }
}

/// Expand a leading `~` and normalize the path
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(trimmed)
}

/// Resolve the watched root from argument or config, as an absolute path
fn resolve_root(root: Option<PathBuf>, config: &Config) -> anyhow::Result<PathBuf> {
    let root = root.unwrap_or_else(|| config.watch.root.clone());
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }
    Ok(root.canonicalize()?)
}

/// Parse a peer argument, appending the default port when absent
fn resolve_peer_addr(peer: &str, default_port: u16) -> anyhow::Result<SocketAddr> {
    let addr = if peer.contains(':') {
        peer.to_string()
    } else {
        format!("{peer}:{default_port}")
    };
    addr.parse()
        .map_err(|_| anyhow::anyhow!("Invalid peer address: {peer}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_peer_addr_appends_default_port() {
        let addr = resolve_peer_addr("192.168.1.20", 8000).unwrap();
        assert_eq!(addr, "192.168.1.20:8000".parse().unwrap());

        let addr = resolve_peer_addr("192.168.1.20:9001", 8000).unwrap();
        assert_eq!(addr, "192.168.1.20:9001".parse().unwrap());
    }

    #[test]
    fn test_resolve_peer_addr_rejects_garbage() {
        assert!(resolve_peer_addr("not an address", 8000).is_err());
    }

    #[test]
    fn test_normalize_path_passthrough() {
        assert_eq!(
            normalize_path(" /tmp/file.bin "),
            PathBuf::from("/tmp/file.bin")
        );
    }
}
