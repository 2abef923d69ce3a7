//! Native ICMP echo probe over a raw socket

use super::Probe;
use crate::error::ProbeError;
use crate::network::icmp::{build_echo_request, parse_echo_reply};
use rand::Rng;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{self, ErrorKind, Read};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Poll interval while waiting on the non-blocking socket
#[cfg(not(unix))]
const RECV_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Sends one echo request per probe and waits for the matching reply.
///
/// Every probe opens its own socket so concurrent probes never share receive
/// state; replies are matched on source address, identifier and sequence.
#[derive(Debug, Clone)]
pub struct IcmpProbe {
    identifier: u16,
}

impl IcmpProbe {
    /// Fails when the process may not open raw ICMP sockets
    pub fn new() -> Result<Self, ProbeError> {
        drop(open_socket()?);
        Ok(Self {
            identifier: rand::thread_rng().gen::<u16>(),
        })
    }
}

#[async_trait::async_trait]
impl Probe for IcmpProbe {
    async fn probe(&self, target: Ipv4Addr, timeout: Duration) -> Result<bool, ProbeError> {
        let socket = open_socket()?;
        let sequence = rand::thread_rng().gen::<u16>();
        let packet = build_echo_request(self.identifier, sequence);
        let destination = SockAddr::from(SocketAddr::new(IpAddr::V4(target), 0));

        socket
            .send_to(&packet, &destination)
            .map_err(|e| ProbeError::RawSocket(format!("send to {} failed: {}", target, e)))?;

        let identifier = self.identifier;
        receive_matching(socket, timeout, |datagram| {
            parse_echo_reply(datagram).map_or(false, |reply| {
                reply.source == target && reply.identifier == identifier && reply.sequence == sequence
            })
        })
        .await
        .map_err(|e| ProbeError::RawSocket(e.to_string()))
    }

    fn name(&self) -> &str {
        "icmp-echo"
    }
}

fn open_socket() -> Result<Socket, ProbeError> {
    let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4)).map_err(|e| {
        if e.kind() == ErrorKind::PermissionDenied {
            ProbeError::PermissionDenied("raw ICMP socket requires CAP_NET_RAW or root".to_string())
        } else {
            ProbeError::RawSocket(e.to_string())
        }
    })?;

    socket
        .set_nonblocking(true)
        .map_err(|e| ProbeError::RawSocket(e.to_string()))?;

    Ok(socket)
}

/// Read datagrams until one satisfies `matches` or `timeout` passes.
///
/// The task sleeps on socket readiness and is only woken when a datagram
/// arrives.
#[cfg(unix)]
async fn receive_matching<F>(socket: Socket, timeout: Duration, mut matches: F) -> io::Result<bool>
where
    F: FnMut(&[u8]) -> bool,
{
    use tokio::io::unix::AsyncFd;

    let socket = AsyncFd::new(socket)?;
    let mut buffer = [0u8; 1500];

    let wait = async {
        loop {
            let mut guard = socket.readable().await?;
            match guard.try_io(|inner| {
                let mut reader = inner.get_ref();
                reader.read(&mut buffer)
            }) {
                Ok(Ok(received)) => {
                    if matches(&buffer[..received]) {
                        return Ok(true);
                    }
                }
                Ok(Err(e)) if e.kind() == ErrorKind::Interrupted => {}
                Ok(Err(e)) => return Err(e),
                // Readiness was stale; try_io cleared it
                Err(_would_block) => {}
            }
        }
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(result) => result,
        Err(_) => Ok(false),
    }
}

#[cfg(not(unix))]
async fn receive_matching<F>(socket: Socket, timeout: Duration, mut matches: F) -> io::Result<bool>
where
    F: FnMut(&[u8]) -> bool,
{
    let started = tokio::time::Instant::now();
    let mut buffer = [0u8; 1500];
    let mut reader = &socket;

    while started.elapsed() < timeout {
        match reader.read(&mut buffer) {
            Ok(received) => {
                if matches(&buffer[..received]) {
                    return Ok(true);
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {
                tokio::time::sleep(RECV_POLL_INTERVAL).await;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(false)
}
