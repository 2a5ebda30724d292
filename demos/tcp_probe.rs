//! demos/tcp_probe.rs
//! Run: cargo run --example tcp_probe -- <port> [message]
//!
//! Sends one newline-terminated message to a running listener and prints
//! the acknowledgement.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port: u16 = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "8080".into())
        .parse()?;
    let message = std::env::args().nth(2).unwrap_or_else(|| "hello".into());

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await?;
    stream.write_all(format!("{message}\n").as_bytes()).await?;

    let mut reader = BufReader::new(stream);
    let mut reply = String::new();
    reader.read_line(&mut reply).await?;
    print!("{reply}");

    Ok(())
}
