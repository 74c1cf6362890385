// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Closed error taxonomy for the ESPER client core.
//!
//! Errors come in two tiers (see the crate-level docs): link-layer errors
//! produced locally by framing/transport/correlator, and endpoint errors
//! reported by the remote device as a `msg_type == 0xFF` response whose
//! payload carries a signed 32-bit code.

use std::fmt;
use std::io;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by any ESPER client operation.
#[derive(Debug)]
pub enum Error {
    /// No response (of any kind) arrived before the per-call deadline, or
    /// three consecutive responses were discarded as mismatched ids.
    Timeout,
    /// The remote reported an application-level error (`msg_type == 0xFF`).
    /// The code maps to a human string via [`link_error_string`].
    LinkError(i32),
    /// The first 12 header bytes failed their CRC32 check.
    BadHeaderCrc,
    /// The padded payload region failed its CRC32 check.
    BadPayloadCrc,
    /// The datagram was shorter than the minimum framed length (20 bytes).
    BadResponseLength,
    /// `response.msg_type` did not match `request.msg_type` (and was not
    /// the error message type).
    BadMessageType,
    /// The remote actively refused the connection (ICMP port unreachable
    /// surfaced as `ECONNREFUSED` on the socket).
    ConnectionRefused,
    /// The requested payload would exceed the estimated UDP MTU budget.
    PayloadTooLarge,
    /// A path could not be resolved to a group/variable id.
    NotFound,
    /// Underlying OS/socket error not covered by a more specific variant.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out waiting for a response"),
            Self::LinkError(code) => {
                write!(f, "endpoint error {code}: {}", link_error_string(*code))
            }
            Self::BadHeaderCrc => write!(f, "bad header CRC"),
            Self::BadPayloadCrc => write!(f, "bad payload CRC"),
            Self::BadResponseLength => write!(f, "response shorter than a valid frame"),
            Self::BadMessageType => write!(f, "response message type did not match request"),
            Self::ConnectionRefused => write!(f, "connection refused"),
            Self::PayloadTooLarge => write!(f, "payload exceeds MTU budget"),
            Self::NotFound => write!(f, "path did not resolve to a known id"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock {
            return Self::Timeout;
        }
        if e.kind() == io::ErrorKind::ConnectionRefused {
            return Self::ConnectionRefused;
        }
        Self::Io(e)
    }
}

/// Map an endpoint error code (spec.md §3) to its human-readable string.
///
/// Ported from `EsperUDPLinkError.error_string` in the original Python
/// driver. Unknown codes yield `"Unknown"`, matching the original's
/// fallback.
#[must_use]
pub fn link_error_string(code: i32) -> &'static str {
    match code {
        -1 => "Internal Error",
        -2 => "Out of Range",
        -3 => "Validation Failed",
        -4 => "User Func Validation Failed",
        -5 => "Resource Locked",
        -6 => "Resource is Read-Only",
        -7 => "Resource is Write-Only",
        -8 => "Resource Id Not Found",
        -9 => "Wrong Var Type",
        -10 => "Insufficient Buffer Size",
        -11 => "Exceeded Max Elements for Resource",
        -64 => "Internal",
        -65 => "Runt Message",
        -66 => "Bad Header CRC",
        -67 => "Bad UDP Version",
        -68 => "Bad Message Type",
        -69 => "Bad Auth Token",
        -70 => "Bad Payload Len",
        -71 => "Bad Payload CRC",
        -72 => "Mismatched Request/Response",
        -73 => "Bad Response Length",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_strings() {
        assert_eq!(link_error_string(-8), "Resource Id Not Found");
        assert_eq!(link_error_string(-73), "Bad Response Length");
    }

    #[test]
    fn unknown_code_falls_back() {
        assert_eq!(link_error_string(42), "Unknown");
    }

    #[test]
    fn display_includes_code_and_string() {
        let err = Error::LinkError(-8);
        assert_eq!(err.to_string(), "endpoint error -8: Resource Id Not Found");
    }
}
