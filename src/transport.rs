// SPDX-License-Identifier: Apache-2.0 OR MIT

//! UDP transport: owns one connected socket, sends a request, and drives
//! the per-call read-with-retry loop (spec.md §4.2).

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use socket2::{Domain, Protocol, Socket, Type};

use crate::config::{MAX_DATAGRAM_BYTES, MAX_READ_ATTEMPTS};
use crate::correlator::Correlator;
use crate::error::{Error, Result};
use crate::framing::{Request, Response};

/// A single connected UDP socket, serialized per spec.md §5 — callers
/// must not issue overlapping calls on the same instance.
pub struct Transport {
    socket: UdpSocket,
}

impl Transport {
    /// Connect to `addr`. Binds an ephemeral local port and connects the
    /// socket so `send`/`recv` address the peer implicitly, matching the
    /// original driver's `socket.connect()` usage.
    pub fn connect(addr: SocketAddr) -> Result<Self> {
        let domain = if addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
        let socket2 = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket2.connect(&addr.into())?;
        log::debug!("[transport] connected to {addr}");
        Ok(Self { socket: socket2.into() })
    }

    /// Send `request` and wait for its matched response, honoring
    /// `deadline` across retries (spec.md §4.2, §5).
    ///
    /// Up to [`MAX_READ_ATTEMPTS`] datagrams are read within the
    /// deadline; any that the correlator rejects as "not mine" are
    /// silently discarded and the loop re-reads. Exhausting the attempt
    /// budget, or the deadline itself, raises [`Error::Timeout`].
    pub fn call(
        &self,
        request: &Request,
        correlator: &Correlator,
        deadline: Instant,
    ) -> Result<Response> {
        self.send(request)?;

        let mut recv_buf = [0u8; MAX_DATAGRAM_BYTES];
        for attempt in 0..MAX_READ_ATTEMPTS {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout);
            }
            self.socket.set_read_timeout(Some(remaining))?;

            log::trace!("[transport] read attempt {attempt} remaining={remaining:?}");
            let n = match self.socket.recv(&mut recv_buf) {
                Ok(n) => n,
                Err(e) => return Err(Error::from(e)),
            };

            let response = Response::decode(&recv_buf[..n])?;
            if let Some(matched) = correlator.correlate(request.msg_id, request.msg_type, response)? {
                return Ok(matched);
            }
            // Mismatched id: discard and retry within the same deadline.
        }

        Err(Error::Timeout)
    }

    /// Write a single datagram in one syscall, failing fast if it would
    /// exceed the configured MTU budget.
    fn send(&self, request: &Request) -> Result<()> {
        let bytes = request.encode()?;
        self.socket.send(&bytes)?;
        Ok(())
    }

    /// Configure the base read timeout used for ad-hoc reads outside of
    /// [`Transport::call`] (e.g. draining a discovery scan window).
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket.set_read_timeout(timeout)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::Request as WireRequest;
    use std::net::Ipv4Addr;

    fn loopback_pair() -> (UdpSocket, Transport) {
        let server = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let server_addr = server.local_addr().unwrap();
        let transport = Transport::connect(SocketAddr::new(server_addr.ip(), server_addr.port())).unwrap();
        (server, transport)
    }

    #[test]
    fn call_matches_response_and_returns() {
        let (server, transport) = loopback_pair();
        let correlator = Correlator::default();

        let req = WireRequest::new(7, 0x01, vec![1, 2, 3, 4], None);
        let client_addr = transport.socket.local_addr().unwrap();

        // Act as the "device": read the request, echo back a same-id
        // same-type response.
        std::thread::spawn(move || {
            let mut buf = [0u8; 1500];
            let (n, from) = server.recv_from(&mut buf).unwrap();
            assert_eq!(n, 28);
            let resp = WireRequest::new(7, 0x01, b"ok".to_vec(), None).encode().unwrap();
            server.send_to(&resp, from).unwrap();
        });
        let _ = client_addr;

        let deadline = Instant::now() + Duration::from_secs(2);
        let resp = transport.call(&req, &correlator, deadline).unwrap();
        assert_eq!(resp.payload, b"ok");
    }

    #[test]
    fn call_times_out_with_no_response() {
        let (_server, transport) = loopback_pair();
        let correlator = Correlator::default();
        let req = WireRequest::new(1, 0x01, vec![], None);
        let deadline = Instant::now() + Duration::from_millis(50);
        assert!(matches!(
            transport.call(&req, &correlator, deadline),
            Err(Error::Timeout)
        ));
    }

    #[test]
    fn call_discards_mismatched_id_then_succeeds() {
        let (server, transport) = loopback_pair();
        let correlator = Correlator::default();
        let req = WireRequest::new(10, 0x01, vec![], None);

        std::thread::spawn(move || {
            let mut buf = [0u8; 1500];
            let (_n, from) = server.recv_from(&mut buf).unwrap();
            // First: a stale reply with the wrong id.
            let stale = WireRequest::new(9, 0x01, vec![], None).encode().unwrap();
            server.send_to(&stale, from).unwrap();
            // Then: the real reply.
            let real = WireRequest::new(10, 0x01, b"hi".to_vec(), None).encode().unwrap();
            server.send_to(&real, from).unwrap();
        });

        let deadline = Instant::now() + Duration::from_secs(2);
        let resp = transport.call(&req, &correlator, deadline).unwrap();
        assert_eq!(resp.payload, b"hi");
    }
}
