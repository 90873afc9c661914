use ferrous_mesh_domain::TransportProtocol;
use ferrous_mesh_infrastructure::dns::server::DnsServerHandler;
use hickory_server::ServerFuture;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(10);
const UDP_RECV_BUFFER: usize = 4096;

/// UDP socket and TCP listener bound to the same address.
pub struct DnsListeners {
    udp: Arc<UdpSocket>,
    tcp: TcpListener,
    addr: SocketAddr,
}

impl DnsListeners {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

/// Binds both DNS listeners. Fails when either port is taken.
pub fn bind_dns_listeners(socket_addr: SocketAddr) -> anyhow::Result<DnsListeners> {
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let udp = create_udp_socket(domain, socket_addr)?;
    let addr = udp.local_addr()?;
    let tcp = create_tcp_listener(domain, addr)?;

    Ok(DnsListeners {
        udp: Arc::new(udp),
        tcp,
        addr,
    })
}

/// Serves DNS on `listeners` until `shutdown` fires.
pub async fn start_dns_server(
    listeners: DnsListeners,
    handler: Arc<DnsServerHandler>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    info!(bind_address = %listeners.local_addr(), "DNS server ready (UDP + TCP)");

    let handler_tcp = (*handler).clone();
    let mut join_set: JoinSet<()> = JoinSet::new();
    join_set.spawn(run_udp_listener(listeners.udp, handler, shutdown.clone()));
    join_set.spawn(run_tcp_server(listeners.tcp, handler_tcp, shutdown));

    while join_set.join_next().await.is_some() {}
    info!("DNS listeners stopped");
    Ok(())
}

async fn run_udp_listener(
    socket: Arc<UdpSocket>,
    handler: Arc<DnsServerHandler>,
    shutdown: CancellationToken,
) {
    let mut recv_buf = [0u8; UDP_RECV_BUFFER];

    loop {
        let (n, from) = tokio::select! {
            _ = shutdown.cancelled() => break,
            received = socket.recv_from(&mut recv_buf) => match received {
                Ok(received) => received,
                Err(e) => {
                    // ICMP port-unreachable from a previous reply surfaces here on some
                    // platforms; the socket itself is still usable.
                    warn!(error = %e, "UDP recv error");
                    continue;
                }
            },
        };

        let query: Vec<u8> = recv_buf[..n].to_vec();
        let handler = handler.clone();
        let socket = socket.clone();
        tokio::spawn(async move {
            if let Some(response) = handler
                .handle_raw(&query, TransportProtocol::Udp, Some(from))
                .await
            {
                if let Err(e) = socket.send_to(&response, from).await {
                    debug!(client = %from, error = %e, "UDP send failed");
                }
            }
        });
    }
}

async fn run_tcp_server(
    listener: TcpListener,
    handler: DnsServerHandler,
    shutdown: CancellationToken,
) {
    let mut server = ServerFuture::new(handler);
    server.register_listener(listener, TCP_IDLE_TIMEOUT);

    shutdown.cancelled().await;
    if let Err(e) = server.shutdown_gracefully().await {
        error!(error = %e, "TCP DNS server error");
    }
}

fn create_udp_socket(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.set_recv_buffer_size(512 * 1024)?;
    socket.set_send_buffer_size(512 * 1024)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

fn create_tcp_listener(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}
