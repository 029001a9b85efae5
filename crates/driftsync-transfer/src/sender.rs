//! Sending side of a transfer.
//!
//! The sender is a one-directional push: announce metadata, obey the
//! receiver's single reply, then stream the needed chunks in ascending
//! position order. No acknowledgment is awaited per packet; completion is
//! implicit when the iteration ends and the connection is shut down.

use std::net::SocketAddr;
use std::path::Path;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use driftsync_core::{CONTROL_BUFFER_SIZE, ControlReply, FILE_IDENTIFIER, Metadata, Packet};
use driftsync_files::ChunkReader;

use crate::error::TransferError;

/// Summary of a completed send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    /// Chunks pushed to the peer
    pub chunks: u64,
    /// Raw (uncompressed) payload bytes pushed
    pub bytes: u64,
    /// Wall-clock duration of the chunk loop
    pub elapsed: Duration,
}

/// Single-connection file sender
pub struct Sender {
    peer: SocketAddr,
}

impl Sender {
    /// Sender targeting the given receiver address
    #[must_use]
    pub fn new(peer: SocketAddr) -> Self {
        Self { peer }
    }

    /// Send a file, streaming every chunk the receiver asks for.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::SourceMissing`] if the file does not
    /// exist, [`TransferError::Rejected`] if the receiver refuses the
    /// transfer, or I/O and protocol errors from the exchange.
    pub async fn send_file(&self, path: &Path) -> Result<SendReport, TransferError> {
        self.send_file_with(path, |_, _| {}).await
    }

    /// Send a file, invoking `on_progress(sent_bytes, total_bytes)` after
    /// each pushed chunk.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Sender::send_file`].
    pub async fn send_file_with(
        &self,
        path: &Path,
        mut on_progress: impl FnMut(u64, u64),
    ) -> Result<SendReport, TransferError> {
        if !path.is_file() {
            return Err(TransferError::SourceMissing(path.to_path_buf()));
        }

        let mut reader = ChunkReader::open(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| TransferError::SourceMissing(path.to_path_buf()))?;
        let metadata = Metadata::new(name, reader.size())?;

        let mut stream = TcpStream::connect(self.peer).await?;
        info!(peer = %self.peer, name = %metadata.name, size = metadata.size, "connected, announcing transfer");
        stream.write_all(&metadata.encode()?).await?;

        let mut control = vec![0u8; CONTROL_BUFFER_SIZE];
        let n = stream.read(&mut control).await?;
        if n == 0 {
            return Err(TransferError::ConnectionClosed);
        }

        let positions = match ControlReply::decode(&control[..n])? {
            ControlReply::Error(message) => {
                return Err(TransferError::Rejected(message));
            }
            ControlReply::MissingPackets(mut positions) => {
                positions.sort_unstable();
                info!(missing = positions.len(), "receiver requested resume");
                positions
            }
            ControlReply::StartNew => {
                info!(chunks = metadata.total_chunks, "receiver accepted new transfer");
                (0..metadata.total_chunks).collect()
            }
        };

        let total_bytes: u64 = positions.iter().map(|&p| metadata.chunk_len(p)).sum();
        let started = Instant::now();
        let mut sent_bytes = 0u64;
        let mut sent_chunks = 0u64;

        for position in positions {
            let chunk = reader.read_chunk(position)?;
            sent_bytes += chunk.len() as u64;
            let packet = Packet::new(FILE_IDENTIFIER, position, chunk)?;
            stream.write_all(&packet.encode()?).await?;
            sent_chunks += 1;
            debug!(position, "chunk pushed");
            on_progress(sent_bytes, total_bytes);
        }

        // End-of-stream is signaled by closing the write side.
        stream.shutdown().await?;

        let report = SendReport {
            chunks: sent_chunks,
            bytes: sent_bytes,
            elapsed: started.elapsed(),
        };
        info!(chunks = report.chunks, bytes = report.bytes, "send finished");
        Ok(report)
    }
}
