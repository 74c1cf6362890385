// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Discovery broadcast scanner: build a filter datagram, broadcast it to
//! `255.255.255.255:27500`, and collect/decode responses until a deadline
//! (spec.md §4.5).

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::{Duration, Instant};

use socket2::{Domain, Protocol, Socket, Type};

use crate::config::{DEVICE_NAME_LEN, DEVICE_REV_LEN, DEVICE_TYPE_LEN, DISCOVERY_PORT, HARDWARE_ID_LEN, MAX_DATAGRAM_BYTES};
use crate::error::Result;
use crate::framing::{Request, Response};
use crate::types::{decode_fixed_ascii, encode_fixed_ascii, DiscoveredDevice};

/// Filter criteria for a discovery scan. An empty string / `None` means
/// "don't filter on this field".
#[derive(Debug, Clone, Default)]
pub struct DiscoveryFilter {
    pub device_id: Option<u32>,
    pub device_type: String,
    pub device_name: String,
    pub device_rev: String,
    pub hardware_id: String,
}

impl DiscoveryFilter {
    /// Build the filter request payload (spec.md §4.5).
    fn build_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(5 + 3 + 4 + 64 + 1 + 64 + 1 + 32 + 1 + 128 + 1);
        buf.push(u8::from(self.device_id.is_some()) * 0xFF);
        buf.push(u8::from(!self.device_type.is_empty()) * 0xFF);
        buf.push(u8::from(!self.device_name.is_empty()) * 0xFF);
        buf.push(u8::from(!self.device_rev.is_empty()) * 0xFF);
        buf.push(u8::from(!self.hardware_id.is_empty()) * 0xFF);
        buf.extend_from_slice(&[0u8; 3]); // padding

        buf.extend_from_slice(&self.device_id.unwrap_or(0).to_le_bytes());
        buf.extend_from_slice(&encode_fixed_ascii(&self.device_type, DEVICE_TYPE_LEN));
        buf.push(0);
        buf.extend_from_slice(&encode_fixed_ascii(&self.device_name, DEVICE_NAME_LEN));
        buf.push(0);
        buf.extend_from_slice(&encode_fixed_ascii(&self.device_rev, DEVICE_REV_LEN));
        buf.push(0);
        buf.extend_from_slice(&encode_fixed_ascii(&self.hardware_id, HARDWARE_ID_LEN));
        buf.push(0);
        buf
    }
}

/// Broadcast `filter` on the LAN and collect every valid, CRC-checked
/// response until `timeout` elapses. Malformed/unverifiable responses are
/// discarded, never surfaced — a single bad responder must not abort the
/// whole scan (spec.md §4.5, §7).
pub fn scan(filter: &DiscoveryFilter, timeout: Duration) -> Result<Vec<DiscoveredDevice>> {
    let socket2 = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket2.set_broadcast(true)?;
    socket2.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)).into())?;
    let socket: UdpSocket = socket2.into();

    let msg_id = fastrand::u16(..);
    let payload = filter.build_payload();
    let request = Request::new(msg_id, crate::types::MessageType::Discover as u8, payload, None);
    let bytes = request.encode()?;

    let dest = SocketAddrV4::new(Ipv4Addr::BROADCAST, DISCOVERY_PORT);
    socket.send_to(&bytes, dest)?;
    log::debug!("[discovery] broadcast sent to {dest}, waiting up to {timeout:?}");

    let deadline = Instant::now() + timeout;
    let mut found = Vec::new();
    let mut buf = [0u8; MAX_DATAGRAM_BYTES];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        socket.set_read_timeout(Some(remaining))?;

        match socket.recv(&mut buf) {
            Ok(n) => match Response::decode(&buf[..n]).and_then(|r| decode_device(&r.payload)) {
                Ok(device) => {
                    log::debug!("[discovery] found {} at {}:{}", device.name, device.ipv4, device.port);
                    found.push(device);
                }
                Err(e) => log::warn!("[discovery] discarding malformed response: {e}"),
            },
            Err(e) if matches!(e.kind(), std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock) => break,
            Err(e) => log::warn!("[discovery] recv error: {e}"),
        }
    }

    Ok(found)
}

/// Decode a discovery response payload (spec.md §4.5):
/// `hardware_id(128) type(64) name(64) revision(32) device_id(u32)
/// uptime(u32) ipv4(u32) reserved(16) port(u16)`.
fn decode_device(payload: &[u8]) -> Result<DiscoveredDevice> {
    const LAYOUT_LEN: usize = 128 + 64 + 64 + 32 + 4 + 4 + 4 + 16 + 2;
    if payload.len() < LAYOUT_LEN {
        return Err(crate::error::Error::BadResponseLength);
    }

    let mut off = 0;
    let hardware_id = decode_fixed_ascii(&payload[off..off + 128]);
    off += 128;
    let device_type = decode_fixed_ascii(&payload[off..off + 64]);
    off += 64;
    let name = decode_fixed_ascii(&payload[off..off + 64]);
    off += 64;
    let revision = decode_fixed_ascii(&payload[off..off + 32]);
    off += 32;
    let device_id = u32::from_le_bytes(payload[off..off + 4].try_into().unwrap());
    off += 4;
    let uptime = u32::from_le_bytes(payload[off..off + 4].try_into().unwrap());
    off += 4;
    // The IPv4 field is laid out as raw network-order octets on the wire
    // (not a little-endian integer): byte 0 is the first dotted-decimal
    // octet, regardless of host endianness.
    let ipv4_octets: [u8; 4] = payload[off..off + 4].try_into().unwrap();
    off += 4;
    off += 16; // reserved IPv6 slot
    let port = u16::from_le_bytes(payload[off..off + 2].try_into().unwrap());

    Ok(DiscoveredDevice {
        hardware_id,
        device_type,
        name,
        revision,
        device_id,
        uptime,
        ipv4: Ipv4Addr::from(ipv4_octets),
        port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_payload_no_criteria_all_flags_clear() {
        let filter = DiscoveryFilter::default();
        let payload = filter.build_payload();
        assert_eq!(&payload[0..5], &[0, 0, 0, 0, 0]);
        assert_eq!(payload.len(), 5 + 3 + 4 + 64 + 1 + 64 + 1 + 32 + 1 + 128 + 1);
    }

    #[test]
    fn filter_payload_sets_flag_per_present_field() {
        let filter = DiscoveryFilter {
            device_id: Some(7),
            device_type: "imu".into(),
            ..Default::default()
        };
        let payload = filter.build_payload();
        assert_eq!(payload[0], 0xFF); // device_id set
        assert_eq!(payload[1], 0xFF); // type set
        assert_eq!(payload[2], 0x00); // name not set
    }

    #[test]
    fn decode_device_roundtrip() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&encode_fixed_ascii("HW123", 128));
        payload.extend_from_slice(&encode_fixed_ascii("sensor", 64));
        payload.extend_from_slice(&encode_fixed_ascii("dev-a", 64));
        payload.extend_from_slice(&encode_fixed_ascii("r1", 32));
        payload.extend_from_slice(&7u32.to_le_bytes());
        payload.extend_from_slice(&1234u32.to_le_bytes());
        payload.extend_from_slice(&Ipv4Addr::new(192, 168, 1, 42).octets());
        payload.extend_from_slice(&[0u8; 16]);
        payload.extend_from_slice(&27500u16.to_le_bytes());

        let device = decode_device(&payload).unwrap();
        assert_eq!(device.hardware_id, "HW123");
        assert_eq!(device.device_type, "sensor");
        assert_eq!(device.name, "dev-a");
        assert_eq!(device.revision, "r1");
        assert_eq!(device.device_id, 7);
        assert_eq!(device.uptime, 1234);
        assert_eq!(device.ipv4, Ipv4Addr::new(192, 168, 1, 42));
        assert_eq!(device.port, 27500);
    }

    #[test]
    fn decode_device_truncated_is_error() {
        assert!(decode_device(&[0u8; 10]).is_err());
    }
}
