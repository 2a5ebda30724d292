//! demos/udp_probe.rs
//! Run: cargo run --example udp_probe -- <port> [message]
//!
//! Sends one datagram to a running listener and prints the acknowledgement.

use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port: u16 = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "8080".into())
        .parse()?;
    let message = std::env::args().nth(2).unwrap_or_else(|| "ping".into());

    let socket = UdpSocket::bind("127.0.0.1:0").await?;
    socket.send_to(message.as_bytes(), ("127.0.0.1", port)).await?;

    let mut buf = [0u8; 2048];
    let (len, from) = timeout(Duration::from_secs(3), socket.recv_from(&mut buf)).await??;
    println!("{} replied: {}", from, String::from_utf8_lossy(&buf[..len]));

    Ok(())
}
