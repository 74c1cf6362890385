// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wire framing: build outgoing request datagrams and parse incoming
//! response datagrams, with dual CRC32 validation (spec.md §4.1).
//!
//! # Outgoing datagram layout (little-endian)
//!
//! ```text
//! offset 0:  u8  version       (0)
//! offset 1:  u8  msg_type
//! offset 2:  u16 msg_id
//! offset 4:  u32 options
//! offset 8:  u32 payload_len   (unpadded length in bytes)
//! offset 12: u32 header_crc    (CRC32 over bytes 0..12)
//! [if (options & NO_AUTH_TOKEN) == 0]
//! offset 16: u64 auth_token
//! payload:   payload_len bytes, zero-padded to a multiple of 8
//! trailer:   u32 payload_crc   (CRC32 over the padded payload only)
//! ```
//!
//! # Incoming datagram layout
//!
//! Same header (12 bytes) + 4-byte header CRC, no auth token, then the
//! padded payload and trailing payload CRC.

use crate::config::PAYLOAD_ALIGN;
use crate::crc::crc32_ieee;
use crate::error::{Error, Result};

/// Protocol version this crate speaks.
pub const VERSION: u8 = 0;

/// Option bit: the request carries no auth token (so the 8-byte auth
/// field is omitted from the header).
pub const NO_AUTH_TOKEN: u32 = 0x01;

/// Fixed 12-byte header length, before its trailing CRC.
const HEADER_LEN: usize = 12;

/// `header (12) + header_crc (4)` — present on every datagram.
const HEADER_TOTAL_LEN: usize = HEADER_LEN + 4;

/// Minimum valid incoming datagram: header + header CRC + payload CRC,
/// with a zero-length payload.
const MIN_RESPONSE_LEN: usize = HEADER_TOTAL_LEN + 4;

/// An immutable, fully-built request, ready to hand to the transport.
pub struct Request {
    pub msg_id: u16,
    pub msg_type: u8,
    pub options: u32,
    pub payload: Vec<u8>,
    pub auth_token: Option<u64>,
}

impl Request {
    #[must_use]
    pub fn new(msg_id: u16, msg_type: u8, payload: Vec<u8>, auth_token: Option<u64>) -> Self {
        let options = if auth_token.is_none() { NO_AUTH_TOKEN } else { 0 };
        Self {
            msg_id,
            msg_type,
            options,
            payload,
            auth_token,
        }
    }

    /// Number of bytes the padded payload will occupy (a multiple of
    /// [`PAYLOAD_ALIGN`]).
    fn padded_payload_len(&self) -> usize {
        pad_len(self.payload.len())
    }

    /// Total datagram size once built (header + optional auth + padded
    /// payload + payload CRC).
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let mut len = HEADER_TOTAL_LEN;
        if self.auth_token.is_some() {
            len += 8;
        }
        len + self.padded_payload_len() + 4
    }

    /// Serialize this request to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.payload.len() > crate::config::MAX_PAYLOAD_BYTES {
            return Err(Error::PayloadTooLarge);
        }

        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.push(VERSION);
        buf.push(self.msg_type);
        buf.extend_from_slice(&self.msg_id.to_le_bytes());
        buf.extend_from_slice(&self.options.to_le_bytes());
        buf.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());

        let header_crc = crc32_ieee(&buf[..HEADER_LEN]);
        buf.extend_from_slice(&header_crc.to_le_bytes());

        if let Some(token) = self.auth_token {
            buf.extend_from_slice(&token.to_le_bytes());
        }

        let padded_start = buf.len();
        buf.extend_from_slice(&self.payload);
        buf.resize(padded_start + self.padded_payload_len(), 0);

        let payload_crc = crc32_ieee(&buf[padded_start..]);
        buf.extend_from_slice(&payload_crc.to_le_bytes());

        Ok(buf)
    }
}

/// A parsed, CRC-validated response.
#[derive(Debug, Clone)]
pub struct Response {
    pub version: u8,
    pub msg_type: u8,
    pub msg_id: u16,
    pub options: u32,
    pub payload_len: u32,
    pub header_crc: u32,
    pub payload_crc: u32,
    pub payload: Vec<u8>,
}

impl Response {
    /// Parse and fully CRC-validate a datagram per spec.md §4.1.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_RESPONSE_LEN {
            return Err(Error::BadResponseLength);
        }

        let version = data[0];
        let msg_type = data[1];
        let msg_id = u16::from_le_bytes([data[2], data[3]]);
        let options = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let payload_len = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
        let header_crc = u32::from_le_bytes([data[12], data[13], data[14], data[15]]);

        let computed_header_crc = crc32_ieee(&data[..HEADER_LEN]);
        if computed_header_crc != header_crc {
            return Err(Error::BadHeaderCrc);
        }

        let padded_payload = &data[HEADER_TOTAL_LEN..data.len() - 4];
        let payload_crc = u32::from_le_bytes(data[data.len() - 4..].try_into().unwrap());
        let computed_payload_crc = crc32_ieee(padded_payload);
        if computed_payload_crc != payload_crc {
            return Err(Error::BadPayloadCrc);
        }

        let payload_len_usize = payload_len as usize;
        if payload_len_usize > padded_payload.len() {
            return Err(Error::BadResponseLength);
        }

        Ok(Self {
            version,
            msg_type,
            msg_id,
            options,
            payload_len,
            header_crc,
            payload_crc,
            payload: padded_payload[..payload_len_usize].to_vec(),
        })
    }
}

/// Round a length up to the next multiple of [`PAYLOAD_ALIGN`].
fn pad_len(len: usize) -> usize {
    let rem = len % PAYLOAD_ALIGN;
    if rem == 0 {
        len
    } else {
        len + (PAYLOAD_ALIGN - rem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// spec.md §8 scenario 3: ping request, msg_id=0x1234, no auth.
    #[test]
    fn scenario_3_ping_no_auth() {
        let req = Request::new(0x1234, 0x01, vec![0u8; 8], None);
        let encoded = req.encode().unwrap();
        assert_eq!(encoded[0], 0x00); // version
        assert_eq!(encoded[1], 0x01); // msg_type = ping
        assert_eq!(&encoded[2..4], &[0x34, 0x12]); // msg_id LE
        assert_eq!(&encoded[4..8], &[0x01, 0x00, 0x00, 0x00]); // NO_AUTH_TOKEN
        assert_eq!(&encoded[8..12], &[0x08, 0x00, 0x00, 0x00]); // payload_len = 8
        // total = 12 header + 4 crc + 8 payload + 4 payload crc = 28
        assert_eq!(encoded.len(), 28);
    }

    #[test]
    fn scenario_3_ping_with_auth() {
        let req = Request::new(0x1234, 0x01, vec![0u8; 8], Some(0));
        let encoded = req.encode().unwrap();
        assert_eq!(&encoded[4..8], &[0x00, 0x00, 0x00, 0x00]); // no NO_AUTH_TOKEN bit
        // total = 12 header + 4 crc + 8 auth + 8 payload + 4 payload crc = 36
        assert_eq!(encoded.len(), 36);
    }

    /// spec.md §8 scenario 4: read_var request payload bytes.
    #[test]
    fn scenario_4_read_var_payload_bytes() {
        let payload: Vec<u8> = vec![
            0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(payload.len(), 24);
    }

    #[test]
    fn padding_property_for_every_length() {
        for len in 0..=40usize {
            let req = Request::new(1, 1, vec![0u8; len], None);
            let encoded = req.encode().unwrap();
            let expected_pad = (PAYLOAD_ALIGN - len % PAYLOAD_ALIGN) % PAYLOAD_ALIGN;
            let expected_total = HEADER_TOTAL_LEN + 8 + len + expected_pad + 4;
            assert_eq!(encoded.len(), expected_total, "len={len}");
        }
    }

    /// Round-trip framing: build a request, then parse its bytes as a
    /// response (same header shape once the request's auth/no-auth
    /// bit is dropped at the response side). Uses a request built
    /// with NO_AUTH_TOKEN so the layouts line up exactly.
    #[test]
    fn round_trip_framing() {
        let payload = b"hello esper".to_vec();
        let req = Request::new(42, 0x10, payload.clone(), None);
        let bytes = req.encode().unwrap();
        let resp = Response::decode(&bytes).unwrap();
        assert_eq!(resp.msg_id, 42);
        assert_eq!(resp.msg_type, 0x10);
        assert_eq!(resp.payload_len as usize, payload.len());
        assert_eq!(resp.payload, payload);
    }

    #[test]
    fn header_crc_bit_flip_rejected() {
        let req = Request::new(1, 1, vec![1, 2, 3], None);
        let mut bytes = req.encode().unwrap();
        bytes[0] ^= 0x01; // flip a bit inside the 12-byte header
        assert!(matches!(Response::decode(&bytes), Err(Error::BadHeaderCrc)));
    }

    #[test]
    fn payload_crc_bit_flip_rejected() {
        let req = Request::new(1, 1, vec![1, 2, 3, 4, 5, 6, 7, 8], None);
        let mut bytes = req.encode().unwrap();
        let last = bytes.len() - 5;
        bytes[last] ^= 0x01; // flip a bit inside the padded payload region
        assert!(matches!(Response::decode(&bytes), Err(Error::BadPayloadCrc)));
    }

    #[test]
    fn too_short_response_rejected() {
        assert!(matches!(
            Response::decode(&[0u8; 10]),
            Err(Error::BadResponseLength)
        ));
    }

    #[test]
    fn oversized_payload_rejected() {
        let req = Request::new(1, 1, vec![0u8; crate::config::MAX_PAYLOAD_BYTES + 1], None);
        assert!(matches!(req.encode(), Err(Error::PayloadTooLarge)));
    }
}
