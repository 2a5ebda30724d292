// tests/listener_tests.rs
// End-to-end tests against a supervisor bound to localhost.

use rust_port_listener::config::{AddressFamily, Config};
use rust_port_listener::ports;
use rust_port_listener::server::{Supervisor, SupervisorHandle, ACK};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinHandle;
use tokio::time::timeout;

fn localhost_config(port_spec: &str) -> Config {
    Config {
        ports: port_spec.to_string(),
        bind_address: Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        family: AddressFamily::V4,
        auto_close_minutes: 0,
    }
}

fn spawn_supervisor(config: Config) -> (SupervisorHandle, JoinHandle<anyhow::Result<()>>) {
    let port_set = ports::resolve(&config.ports).unwrap();
    let mut supervisor = Supervisor::new(config, port_set);
    supervisor.start();
    let handle = supervisor.handle();
    (handle, tokio::spawn(supervisor.run()))
}

/// Binding port 0 borrows a free port from the OS; dropping the socket
/// frees it for the supervisor under test.
async fn free_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Listener startup is fire-and-forget, so connecting needs a grace period.
async fn connect_with_retry(port: u16) -> TcpStream {
    for _ in 0..50 {
        if let Ok(stream) = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("listener on port {port} never came up");
}

async fn udp_request(port: u16, payload: &[u8]) -> Vec<u8> {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let mut buf = [0u8; 2048];

    // Datagrams sent before the listener is up vanish; resend until a
    // reply arrives.
    for _ in 0..50 {
        socket
            .send_to(payload, (Ipv4Addr::LOCALHOST, port))
            .await
            .unwrap();
        if let Ok(Ok((len, _))) =
            timeout(Duration::from_millis(100), socket.recv_from(&mut buf)).await
        {
            return buf[..len].to_vec();
        }
    }
    panic!("no UDP reply from port {port}");
}

async fn expect_clean_exit(run: JoinHandle<anyhow::Result<()>>) {
    timeout(Duration::from_secs(5), run)
        .await
        .expect("supervisor did not stop in time")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn tcp_line_is_acknowledged() {
    let port = free_port().await;
    let (handle, run) = spawn_supervisor(localhost_config(&port.to_string()));

    let mut stream = connect_with_retry(port).await;
    stream.write_all(b"hello\n").await.unwrap();

    let mut reader = BufReader::new(stream);
    let mut reply = String::new();
    reader.read_line(&mut reply).await.unwrap();
    assert_eq!(reply, format!("{ACK}\n"));

    handle.shutdown();
    expect_clean_exit(run).await;
}

#[tokio::test]
async fn tcp_acknowledges_every_line_in_order() {
    let port = free_port().await;
    let (handle, run) = spawn_supervisor(localhost_config(&port.to_string()));

    let mut stream = connect_with_retry(port).await;
    stream.write_all(b"first\nsecond\n").await.unwrap();

    let mut reader = BufReader::new(stream);
    for _ in 0..2 {
        let mut reply = String::new();
        reader.read_line(&mut reply).await.unwrap();
        assert_eq!(reply, format!("{ACK}\n"));
    }

    handle.shutdown();
    expect_clean_exit(run).await;
}

#[tokio::test]
async fn concurrent_connections_do_not_block_each_other() {
    let port = free_port().await;
    let (handle, run) = spawn_supervisor(localhost_config(&port.to_string()));

    // The idle connection sends nothing while the busy one talks.
    let idle = connect_with_retry(port).await;
    let mut busy = connect_with_retry(port).await;

    busy.write_all(b"ping\n").await.unwrap();
    let mut busy_reader = BufReader::new(busy);
    let mut reply = String::new();
    busy_reader.read_line(&mut reply).await.unwrap();
    assert_eq!(reply, format!("{ACK}\n"));

    let mut idle = idle;
    idle.write_all(b"late\n").await.unwrap();
    let mut idle_reader = BufReader::new(idle);
    let mut reply = String::new();
    idle_reader.read_line(&mut reply).await.unwrap();
    assert_eq!(reply, format!("{ACK}\n"));

    handle.shutdown();
    expect_clean_exit(run).await;
}

#[tokio::test]
async fn udp_datagram_is_acknowledged() {
    let port = free_port().await;
    let (handle, run) = spawn_supervisor(localhost_config(&port.to_string()));

    let reply = udp_request(port, b"ping").await;
    assert_eq!(reply, ACK.as_bytes());

    handle.shutdown();
    expect_clean_exit(run).await;
}

#[tokio::test]
async fn oversized_datagram_is_truncated_not_fatal() {
    let port = free_port().await;
    let (handle, run) = spawn_supervisor(localhost_config(&port.to_string()));

    // Larger than the 1024-byte receive buffer; the listener truncates and
    // must keep serving.
    let reply = udp_request(port, &[b'x'; 4096]).await;
    assert_eq!(reply, ACK.as_bytes());

    let reply = udp_request(port, b"still alive").await;
    assert_eq!(reply, ACK.as_bytes());

    handle.shutdown();
    expect_clean_exit(run).await;
}

#[tokio::test]
async fn occupied_port_fails_alone_leaving_others_serving() {
    let occupier = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let busy_port = occupier.local_addr().unwrap().port();
    let open_port = free_port().await;

    let (handle, run) =
        spawn_supervisor(localhost_config(&format!("{busy_port},{open_port}")));

    // The free port serves normally despite the sibling bind failure.
    let mut stream = connect_with_retry(open_port).await;
    stream.write_all(b"hello\n").await.unwrap();
    let mut reader = BufReader::new(stream);
    let mut reply = String::new();
    reader.read_line(&mut reply).await.unwrap();
    assert_eq!(reply, format!("{ACK}\n"));

    // The occupier still owns the busy port: a new connection lands on it.
    let client = TcpStream::connect((Ipv4Addr::LOCALHOST, busy_port))
        .await
        .unwrap();
    timeout(Duration::from_secs(2), occupier.accept())
        .await
        .expect("original listener stopped accepting")
        .unwrap();
    drop(client);

    handle.shutdown();
    expect_clean_exit(run).await;
}

#[tokio::test]
async fn auto_close_terminates_run() {
    let port = free_port().await;
    let config = localhost_config(&port.to_string());
    let port_set = ports::resolve(&config.ports).unwrap();

    let mut supervisor = Supervisor::new(config, port_set)
        .with_auto_close(Some(Duration::from_millis(200)));
    supervisor.start();

    expect_clean_exit(tokio::spawn(supervisor.run())).await;
}

#[tokio::test]
async fn shutdown_handle_stops_run_promptly() {
    let port = free_port().await;
    let (handle, run) = spawn_supervisor(localhost_config(&port.to_string()));

    // Make sure listeners actually came up before cancelling.
    drop(connect_with_retry(port).await);

    handle.shutdown();
    expect_clean_exit(run).await;
}
