//! Receiving side of a transfer.
//!
//! The receiver serves exactly one peer per run. After decoding the
//! metadata announcement it picks one of three paths:
//!
//! - target exists, no progress record → reject, terminal
//! - progress record exists → resume, reply with the sorted missing list
//! - otherwise → new transfer, preallocate and track every position
//!
//! The receive loop then consumes length-prefixed frames until the
//! missing set drains or the peer disconnects. Corrupt frames are logged
//! and skipped; their positions stay missing and will be requested on the
//! next resume. There is no retransmission request within a run.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use driftsync_core::reply::ALREADY_EXISTS;
use driftsync_core::{CONTROL_BUFFER_SIZE, ControlReply, FRAME_LEN_SIZE, Metadata, Packet};
use driftsync_files::{ChunkWriter, ProgressStore};

use crate::error::TransferError;

/// How a receiver run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Every chunk landed; the progress record was removed
    Complete {
        /// Bytes written to the target
        bytes: u64,
        /// Wall-clock duration of the receive loop
        elapsed: Duration,
    },
    /// Peer disconnected early; the missing set was persisted for resume
    Aborted {
        /// Chunk positions still missing
        missing: u64,
    },
    /// Target already exists with no resume state; nothing was written
    Rejected,
}

/// Single-peer file receiver
pub struct Receiver {
    listener: TcpListener,
    output_dir: PathBuf,
}

impl Receiver {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails.
    pub async fn bind(addr: SocketAddr, output_dir: PathBuf) -> Result<Self, TransferError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            output_dir,
        })
    }

    /// Address the receiver is listening on.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, TransferError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept one connection and run the transfer to a terminal state.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed metadata or filesystem failures.
    /// A dropped connection is not an error; it yields
    /// [`TransferOutcome::Aborted`] with the progress record persisted.
    pub async fn serve_once(&self) -> Result<TransferOutcome, TransferError> {
        info!(addr = %self.local_addr()?, "waiting for connection");
        let (stream, peer) = self.listener.accept().await?;
        info!(%peer, "peer connected");
        self.receive(stream).await
    }

    async fn receive(&self, mut stream: TcpStream) -> Result<TransferOutcome, TransferError> {
        let mut control = vec![0u8; CONTROL_BUFFER_SIZE];
        let n = stream.read(&mut control).await?;
        if n == 0 {
            return Err(TransferError::ConnectionClosed);
        }
        let metadata = Metadata::decode(&control[..n])?;
        info!(
            name = %metadata.name,
            size = metadata.size,
            chunks = metadata.total_chunks,
            "received transfer announcement"
        );

        let target = self.output_dir.join(&metadata.name);
        let progress = ProgressStore::for_target(&target);

        if target.exists() && !progress.exists() {
            warn!(target = %target.display(), "target exists with no resume state, rejecting");
            stream
                .write_all(&ControlReply::Error(ALREADY_EXISTS.to_string()).encode())
                .await?;
            return Ok(TransferOutcome::Rejected);
        }

        let (mut missing, mut writer) = if progress.exists() {
            let missing = progress.load()?;
            info!(missing = missing.len(), "resuming interrupted transfer");
            stream
                .write_all(&ControlReply::MissingPackets(missing.iter().copied().collect()).encode())
                .await?;
            (missing, ChunkWriter::open_existing(&target)?)
        } else {
            info!("starting new transfer");
            stream.write_all(&ControlReply::StartNew.encode()).await?;
            let missing = progress.init_full(metadata.total_chunks)?;
            (missing, ChunkWriter::create(&target, metadata.size)?)
        };

        let started = Instant::now();
        self.receive_chunks(&mut stream, &metadata, &mut missing, &mut writer)
            .await?;

        if missing.is_empty() {
            writer.sync()?;
            progress.clear()?;
            let elapsed = started.elapsed();
            let rate = metadata.size as f64 / elapsed.as_secs_f64().max(f64::EPSILON) / (1024.0 * 1024.0);
            info!(
                target = %target.display(),
                elapsed_s = format!("{:.2}", elapsed.as_secs_f64()),
                mib_per_s = format!("{rate:.2}"),
                "transfer complete"
            );
            Ok(TransferOutcome::Complete {
                bytes: metadata.size,
                elapsed,
            })
        } else {
            progress.save(&missing)?;
            warn!(
                missing = missing.len(),
                "connection closed before completion, progress persisted"
            );
            Ok(TransferOutcome::Aborted {
                missing: missing.len() as u64,
            })
        }
    }

    /// Drain frames until every position has landed or the peer hangs up
    async fn receive_chunks(
        &self,
        stream: &mut TcpStream,
        metadata: &Metadata,
        missing: &mut BTreeSet<u64>,
        writer: &mut ChunkWriter,
    ) -> Result<(), TransferError> {
        while !missing.is_empty() {
            let mut len_buf = [0u8; FRAME_LEN_SIZE];
            if read_or_eof(stream, &mut len_buf).await? {
                break;
            }
            let frame_len = u32::from_be_bytes(len_buf) as usize;

            let mut blob = vec![0u8; frame_len];
            if read_or_eof(stream, &mut blob).await? {
                break;
            }

            match Packet::decode(&blob) {
                Ok(packet) if packet.position < metadata.total_chunks => {
                    writer.write_chunk(packet.position, &packet.payload)?;
                    missing.remove(&packet.position);
                    debug!(
                        position = packet.position,
                        remaining = missing.len(),
                        "chunk written"
                    );
                }
                Ok(packet) => {
                    warn!(
                        position = packet.position,
                        total = metadata.total_chunks,
                        "dropping chunk with out-of-range position"
                    );
                }
                Err(err) => {
                    // Position stays in the missing set; a later resume
                    // will request it again.
                    warn!(%err, "skipping corrupt packet frame");
                }
            }
        }
        Ok(())
    }
}

/// Fill `buf` exactly, reporting a clean EOF as `true`
async fn read_or_eof(stream: &mut TcpStream, buf: &mut [u8]) -> Result<bool, TransferError> {
    match stream.read_exact(buf).await {
        Ok(_) => Ok(false),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(true),
        Err(e) => Err(e.into()),
    }
}
