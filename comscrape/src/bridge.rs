//! Serial-over-TCP bridge.
//!
//! Shares one serial console with any number of TCP clients, so a driver
//! on another host can reach the switch with [`DriverBuilder::tcp`].
//! Everything the serial port produces goes to every connected client.
//! Everything any client sends is written to the serial port.
//!
//! There is no client side that turns the bridge back into a local serial
//! device. Remote hosts connect with [`DriverBuilder::tcp`] instead, and a
//! dropped connection is not retried.
//!
//! [`DriverBuilder::tcp`]: crate::DriverBuilder::tcp

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use log::{debug, info, trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;

use crate::error::{Result, TransportError};
use crate::transport::config::DEFAULT_BRIDGE_PORT;
use crate::transport::{SerialConfig, open_serial_stream};

const READ_CHUNK: usize = 4096;

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Serial port to share.
    pub serial: SerialConfig,

    /// Address to accept clients on.
    pub listen: SocketAddr,

    /// Chunks buffered per direction before slow parties lose data
    /// (serial → clients) or apply backpressure (clients → serial).
    pub channel_capacity: usize,
}

impl BridgeConfig {
    /// Share `serial` on all interfaces, port 4000.
    pub fn new(serial: SerialConfig) -> Self {
        Self {
            serial,
            listen: SocketAddr::from(([0, 0, 0, 0], DEFAULT_BRIDGE_PORT)),
            channel_capacity: 256,
        }
    }
}

/// Open the serial port and bridge it until Ctrl-C.
pub async fn run(config: BridgeConfig) -> Result<()> {
    let serial = open_serial_stream(&config.serial)?;
    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(TransportError::Io)?;

    info!(
        "Bridging {} to tcp {}",
        config.serial.path,
        listener.local_addr().map_err(TransportError::Io)?
    );

    serve(
        serial,
        listener,
        config.channel_capacity,
        until_signal(tokio::signal::ctrl_c()),
    )
    .await
}

/// Complete when `signal` fires. If the handler could not be installed,
/// never complete, leaving the serial side as the only way to stop.
async fn until_signal<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!("Ctrl-C handler unavailable, bridge runs until the serial port closes: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Bridge `serial` to clients accepted on `listener` until `shutdown`
/// completes or the serial side fails.
pub async fn serve<T, F>(
    serial: T,
    listener: TcpListener,
    capacity: usize,
    shutdown: F,
) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
    F: Future,
{
    let (serial_rx, serial_tx) = tokio::io::split(serial);
    let (to_clients, _) = broadcast::channel::<Bytes>(capacity);
    let (to_serial, from_clients) = mpsc::channel::<Bytes>(capacity);

    let mut pumps = JoinSet::new();
    pumps.spawn(pump_serial_to_clients(serial_rx, to_clients.clone()));
    pumps.spawn(pump_clients_to_serial(serial_tx, from_clients));

    let mut clients = JoinSet::new();
    tokio::pin!(shutdown);

    let result = loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Bridge shutting down");
                break Ok(());
            }
            Some(finished) = pumps.join_next() => {
                break match finished {
                    Ok(result) => result,
                    Err(e) => Err(TransportError::Io(io::Error::other(e)).into()),
                };
            }
            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    info!("Client {} connected", peer);
                    // Subscribe before spawning so the client sees every
                    // chunk read after it was accepted
                    let from_serial = to_clients.subscribe();
                    if let Err(e) = socket.set_nodelay(true) {
                        debug!("set_nodelay for {} failed: {}", peer, e);
                    }
                    clients.spawn(serve_client(socket, peer, from_serial, to_serial.clone()));
                }
                Err(e) => warn!("Accept failed: {}", e),
            },
            Some(_) = clients.join_next(), if !clients.is_empty() => {}
        }
    };

    clients.shutdown().await;
    pumps.shutdown().await;
    result
}

async fn pump_serial_to_clients<R>(
    mut serial: R,
    to_clients: broadcast::Sender<Bytes>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    loop {
        buf.reserve(READ_CHUNK);
        let n = serial.read_buf(&mut buf).await.map_err(TransportError::Io)?;
        if n == 0 {
            return Err(TransportError::Disconnected.into());
        }
        trace!("serial >> {} bytes", n);
        // No receivers just means nobody is connected right now
        let _ = to_clients.send(buf.split().freeze());
    }
}

async fn pump_clients_to_serial<W>(
    mut serial: W,
    mut from_clients: mpsc::Receiver<Bytes>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(chunk) = from_clients.recv().await {
        trace!("serial << {:?}", String::from_utf8_lossy(&chunk));
        serial.write_all(&chunk).await.map_err(TransportError::Io)?;
        serial.flush().await.map_err(TransportError::Io)?;
    }
    Ok(())
}

/// Relay between one client and the serial pumps until either side hangs up.
async fn serve_client<C>(
    socket: C,
    peer: SocketAddr,
    mut from_serial: broadcast::Receiver<Bytes>,
    to_serial: mpsc::Sender<Bytes>,
) where
    C: AsyncRead + AsyncWrite,
{
    let (mut reader, mut writer) = tokio::io::split(socket);
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        tokio::select! {
            chunk = from_serial.recv() => match chunk {
                Ok(data) => {
                    if let Err(e) = writer.write_all(&data).await {
                        warn!("Dropping client {}: {}", peer, e);
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Client {} too slow, skipped {} chunks", peer, skipped);
                }
                Err(RecvError::Closed) => break,
            },
            read = reader.read(&mut buf) => match read {
                Ok(0) => {
                    info!("Client {} disconnected", peer);
                    break;
                }
                Ok(n) => {
                    if to_serial.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Client {} read failed: {}", peer, e);
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;
    use tokio_test::io::Builder;

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_client_relay() {
        let (client, bridge_side) = tokio::io::duplex(1024);
        let (to_clients, _) = broadcast::channel(16);
        let (to_serial, mut from_clients) = mpsc::channel(16);

        let task = tokio::spawn(serve_client(
            bridge_side,
            peer(),
            to_clients.subscribe(),
            to_serial,
        ));

        let (mut client_rx, mut client_tx) = tokio::io::split(client);

        to_clients.send(Bytes::from_static(b"<H3C>")).unwrap();
        let mut got = [0u8; 5];
        client_rx.read_exact(&mut got).await.unwrap();
        assert_eq!(&got, b"<H3C>");

        client_tx.write_all(b"display device\r\n").await.unwrap();
        let forwarded = from_clients.recv().await.unwrap();
        assert_eq!(&forwarded[..], b"display device\r\n");

        drop(client_rx);
        drop(client_tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_client_write_drops_only_that_client() {
        let (to_clients, _) = broadcast::channel(16);
        let (to_serial, _from_clients) = mpsc::channel(16);

        let (healthy, healthy_side) = tokio::io::duplex(1024);
        let healthy_task = tokio::spawn(serve_client(
            healthy_side,
            peer(),
            to_clients.subscribe(),
            to_serial.clone(),
        ));

        let broken = Builder::new()
            .write_error(io::Error::new(io::ErrorKind::BrokenPipe, "client gone"))
            .build();
        let broken_rx = to_clients.subscribe();

        to_clients.send(Bytes::from_static(b"<H3C>")).unwrap();
        // Returns as soon as the write to the client fails
        serve_client(broken, peer(), broken_rx, to_serial.clone()).await;
        assert_eq!(to_clients.receiver_count(), 1);

        to_clients.send(Bytes::from_static(b"\r\n<H3C>")).unwrap();
        let (mut healthy_rx, healthy_tx) = tokio::io::split(healthy);
        let mut got = [0u8; 12];
        healthy_rx.read_exact(&mut got).await.unwrap();
        assert_eq!(&got, b"<H3C>\r\n<H3C>");

        drop(healthy_rx);
        drop(healthy_tx);
        healthy_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_serial_output_reaches_every_client() {
        let (mut device, serial) = tokio::io::duplex(1024);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();

        let bridge = tokio::spawn(serve(serial, listener, 16, async {
            let _ = stopped.await;
        }));

        // A byte from each client reaching the device means both are subscribed
        let mut first = TcpStream::connect(addr).await.unwrap();
        first.write_all(b"a").await.unwrap();
        let mut seen = [0u8; 1];
        device.read_exact(&mut seen).await.unwrap();
        assert_eq!(&seen, b"a");

        let mut second = TcpStream::connect(addr).await.unwrap();
        second.write_all(b"b").await.unwrap();
        device.read_exact(&mut seen).await.unwrap();
        assert_eq!(&seen, b"b");

        device.write_all(b"<H3C>").await.unwrap();
        for client in [&mut first, &mut second] {
            let mut prompt = [0u8; 5];
            client.read_exact(&mut prompt).await.unwrap();
            assert_eq!(&prompt, b"<H3C>");
        }

        stop.send(()).unwrap();
        bridge.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_failure_keeps_bridge_running() {
        let failed = until_signal(async { Err(io::Error::other("no signal handler")) });
        assert!(
            tokio::time::timeout(Duration::from_secs(60), failed)
                .await
                .is_err()
        );

        tokio::time::timeout(Duration::from_secs(1), until_signal(async { Ok(()) }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_serve_end_to_end() {
        let (mut device, serial) = tokio::io::duplex(1024);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();

        let bridge = tokio::spawn(serve(serial, listener, 16, async {
            let _ = stopped.await;
        }));

        let mut client = TcpStream::connect(addr).await.unwrap();

        // Client -> serial; once this arrives the client is subscribed
        client.write_all(b"\r\n").await.unwrap();
        let mut wake = [0u8; 2];
        device.read_exact(&mut wake).await.unwrap();
        assert_eq!(&wake, b"\r\n");

        // Serial -> client
        device.write_all(b"<H3C>").await.unwrap();
        let mut prompt = [0u8; 5];
        client.read_exact(&mut prompt).await.unwrap();
        assert_eq!(&prompt, b"<H3C>");

        stop.send(()).unwrap();
        bridge.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_serial_loss_stops_bridge() {
        let (device, serial) = tokio::io::duplex(1024);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        drop(device);
        let err = serve(serial, listener, 16, std::future::pending::<()>())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Transport(TransportError::Disconnected)
        ));
    }
}
