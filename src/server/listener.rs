// ────────────────────────────────
// src/server/listener.rs
// Low‑level bind plus the per‑(port, stack) listener pair.
// ────────────────────────────────
use crate::config::IpStack;
use crate::server::{handler, udp};
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// One (port, stack) pair the supervisor wants served. Each target owns a
/// TCP listening socket and a UDP socket, bound independently.
#[derive(Debug, Clone, Copy)]
pub struct ListenTarget {
    pub port: u16,
    pub stack: IpStack,
    pub bind_address: Option<IpAddr>,
}

impl ListenTarget {
    pub fn socket_addr(&self) -> SocketAddr {
        let ip = self.bind_address.unwrap_or_else(|| self.stack.wildcard());
        SocketAddr::new(ip, self.port)
    }
}

pub async fn bind_tcp(addr: SocketAddr) -> io::Result<TcpListener> {
    TcpListener::bind(addr).await
}

pub async fn bind_udp(addr: SocketAddr) -> io::Result<UdpSocket> {
    UdpSocket::bind(addr).await
}

/// Spawn the TCP and UDP sides of one target. Both sides bind and run on
/// their own task; a failed bind is logged and leaves only that side dark,
/// never the sibling protocol or any other port.
pub fn spawn_pair(target: ListenTarget, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
    let tcp_shutdown = shutdown.clone();
    vec![
        tokio::spawn(async move { run_tcp(target, tcp_shutdown).await }),
        tokio::spawn(async move { run_udp(target, shutdown).await }),
    ]
}

async fn run_tcp(target: ListenTarget, mut shutdown: watch::Receiver<bool>) {
    let addr = target.socket_addr();
    let listener = match bind_tcp(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            warn!("[TCP] Failed to listen on {} {}: {}", target.stack, addr, err);
            return;
        }
    };

    info!("[TCP] Listening on {} {}", target.stack, addr);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    // One task per connection; a slow peer never blocks the
                    // accept loop or its siblings.
                    tokio::spawn(handler::handle_connection(stream, peer));
                }
                Err(err) => {
                    warn!("[TCP] Accept error on {}: {}", addr, err);
                }
            },
            _ = shutdown.wait_for(|stop| *stop) => break,
        }
    }
}

async fn run_udp(target: ListenTarget, shutdown: watch::Receiver<bool>) {
    let addr = target.socket_addr();
    let socket = match bind_udp(addr).await {
        Ok(socket) => socket,
        Err(err) => {
            warn!("[UDP] Failed to listen on {} {}: {}", target.stack, addr, err);
            return;
        }
    };

    info!("[UDP] Listening on {} {}", target.stack, addr);
    udp::receive_loop(socket, shutdown).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_addr_follows_stack() {
        let target = ListenTarget {
            port: 8080,
            stack: IpStack::V4,
            bind_address: None,
        };
        assert_eq!(target.socket_addr().to_string(), "0.0.0.0:8080");

        let target = ListenTarget {
            port: 8080,
            stack: IpStack::V6,
            bind_address: None,
        };
        assert_eq!(target.socket_addr().to_string(), "[::]:8080");
    }

    #[test]
    fn explicit_bind_address_wins() {
        let target = ListenTarget {
            port: 9000,
            stack: IpStack::V4,
            bind_address: Some("127.0.0.1".parse().unwrap()),
        };
        assert_eq!(target.socket_addr().to_string(), "127.0.0.1:9000");
    }
}
