// src/server/handler.rs
use crate::server::ACK;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{info, warn};

/// Serve one accepted TCP connection until the peer closes or errors out.
///
/// The wire format is newline-delimited plaintext: every received line is
/// logged with its source address and answered with the acknowledgement.
/// Owning the stream here means the socket is closed on every exit path.
pub async fn handle_connection(stream: TcpStream, peer: SocketAddr) {
    info!("[TCP] New connection from {}", peer);

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    let ack = format!("{ACK}\n");

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!("[TCP] Connection closed: {}", peer);
                break;
            }
            Ok(_) => {
                info!("[TCP] Data from {}:\n    {}", peer, line.trim());
                if let Err(err) = write_half.write_all(ack.as_bytes()).await {
                    warn!("[TCP] Write to {} failed: {}", peer, err);
                    break;
                }
            }
            Err(err) => {
                info!("[TCP] Connection closed: {} ({})", peer, err);
                break;
            }
        }
    }
}
