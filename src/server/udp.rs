// src/server/udp.rs
use crate::server::ACK;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{info, warn};

/// Receive buffer size. Datagrams larger than this are truncated by the
/// socket; the remainder is dropped.
pub const RECV_BUFFER_SIZE: usize = 1024;

/// Stateless datagram loop: log each payload with its source address,
/// answer with the acknowledgement, and keep going on errors. Only the
/// shutdown channel ends the loop.
pub async fn receive_loop(socket: UdpSocket, mut shutdown: watch::Receiver<bool>) {
    let mut buf = [0u8; RECV_BUFFER_SIZE];

    loop {
        let received = tokio::select! {
            received = socket.recv_from(&mut buf) => received,
            _ = shutdown.wait_for(|stop| *stop) => break,
        };

        match received {
            Ok((len, peer)) => {
                let payload = String::from_utf8_lossy(&buf[..len]);
                info!("[UDP] Datagram from {}:\n    {}", peer, payload.trim());

                if let Err(err) = socket.send_to(ACK.as_bytes(), peer).await {
                    warn!("[UDP] Reply to {} failed: {}", peer, err);
                }
            }
            Err(err) => {
                warn!("[UDP] Error: {}", err);
            }
        }
    }
}
