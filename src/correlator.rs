// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Request/response correlation: monotonic message-id allocation and
//! matching a response to its outstanding request (spec.md §4.3).

use crate::error::{Error, Result};
use crate::framing::Response;
use crate::types::MessageType;

/// Allocates message ids starting from a random seed, incrementing by one
/// per outgoing request (wraparound is acceptable — the id space is a
/// correlation tag, not a sequence counter).
pub struct Correlator {
    next_id: u16,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

impl Correlator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: fastrand::u16(..),
        }
    }

    /// Allocate the next message id.
    pub fn next_id(&mut self) -> u16 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        log::debug!("correlator: allocated msg_id={id}");
        id
    }

    /// Match a response against an outstanding request.
    ///
    /// - `Ok(None)` means the response's id doesn't belong to this
    ///   request; the caller should discard it and keep waiting.
    /// - `Ok(Some(response))` means it matched and is a normal reply.
    /// - `Err(Error::LinkError(code))` means it matched but the remote
    ///   reported an endpoint error.
    /// - `Err(Error::BadMessageType)` means it matched by id but the
    ///   message type doesn't correspond to the request.
    pub fn correlate(
        &self,
        request_msg_id: u16,
        request_msg_type: u8,
        response: Response,
    ) -> Result<Option<Response>> {
        if response.msg_id != request_msg_id {
            log::warn!(
                "correlator: dropping mismatched response (expected id={request_msg_id}, got id={})",
                response.msg_id
            );
            return Ok(None);
        }

        if response.msg_type == MessageType::Error as u8 {
            let code = decode_error_code(&response.payload);
            return Err(Error::LinkError(code));
        }

        if response.msg_type != request_msg_type {
            return Err(Error::BadMessageType);
        }

        Ok(Some(response))
    }
}

/// Decode the leading `i32` error code from an error response payload.
fn decode_error_code(payload: &[u8]) -> i32 {
    if payload.len() < 4 {
        return -1; // internal: malformed error payload
    }
    i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::Request;

    fn make_response(msg_id: u16, msg_type: u8, payload: Vec<u8>) -> Response {
        let bytes = Request::new(msg_id, msg_type, payload, None).encode().unwrap();
        Response::decode(&bytes).unwrap()
    }

    #[test]
    fn ids_increment_and_wrap() {
        let mut c = Correlator { next_id: u16::MAX };
        assert_eq!(c.next_id(), u16::MAX);
        assert_eq!(c.next_id(), 0);
        assert_eq!(c.next_id(), 1);
    }

    #[test]
    fn mismatched_id_is_dropped_silently() {
        let c = Correlator { next_id: 0 };
        let resp = make_response(99, 0x01, vec![]);
        assert!(c.correlate(1, 0x01, resp).unwrap().is_none());
    }

    #[test]
    fn matching_id_and_type_returns_response() {
        let c = Correlator { next_id: 0 };
        let resp = make_response(5, 0x01, vec![1, 2, 3]);
        let matched = c.correlate(5, 0x01, resp).unwrap().unwrap();
        assert_eq!(matched.payload, vec![1, 2, 3]);
    }

    #[test]
    fn matching_id_wrong_type_is_bad_message_type() {
        let c = Correlator { next_id: 0 };
        let resp = make_response(5, 0x13, vec![]);
        assert!(matches!(
            c.correlate(5, 0x01, resp),
            Err(Error::BadMessageType)
        ));
    }

    #[test]
    fn matching_id_error_type_surfaces_link_error() {
        let c = Correlator { next_id: 0 };
        let payload = (-8i32).to_le_bytes().to_vec();
        let resp = make_response(5, 0xFF, payload);
        assert!(matches!(
            c.correlate(5, 0x01, resp),
            Err(Error::LinkError(-8))
        ));
    }
}
