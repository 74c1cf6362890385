// SPDX-License-Identifier: Apache-2.0 OR MIT

//! ESPER global configuration — single source of truth for wire constants.
//!
//! **Never hardcode these elsewhere.** Centralizing them here means a port
//! or alignment change is a one-line diff instead of a grep-and-pray.

use std::time::Duration;

/// Default ESPER UDP port, used for both request/response traffic and
/// discovery broadcast (spec.md §6).
pub const DEFAULT_PORT: u16 = 27500;

/// Discovery broadcast destination port (same as [`DEFAULT_PORT`] in the
/// deployed protocol, kept separate so the two concerns don't silently
/// couple if one ever changes).
pub const DISCOVERY_PORT: u16 = 27500;

/// Payload padding alignment, in bytes (spec.md §4.1).
///
/// An earlier draft of the wire format used 4-byte alignment; the deployed
/// endpoint uses 8. Do not change without confirming against the endpoint.
pub const PAYLOAD_ALIGN: usize = 8;

/// Conservative estimate of the largest UDP payload that survives
/// fragmentation-free on a standard 1500-byte-MTU link (spec.md §4.2).
pub const MAX_PAYLOAD_BYTES: usize = 1472;

/// Largest datagram the transport will attempt to read.
pub const MAX_DATAGRAM_BYTES: usize = 1500;

/// Number of mismatched-id reads tolerated within one call's deadline
/// before giving up (spec.md §4.2).
pub const MAX_READ_ATTEMPTS: u32 = 3;

/// Fixed width, in bytes, of an ASCII `key` field (variable/group names).
pub const KEY_MAX_LEN: usize = 32;

/// Fixed widths of the discovery/endpoint-info ASCII string fields
/// (spec.md §3, §4.5), in declaration order.
pub const HARDWARE_ID_LEN: usize = 128;
pub const DEVICE_TYPE_LEN: usize = 64;
pub const DEVICE_NAME_LEN: usize = 64;
pub const DEVICE_REV_LEN: usize = 32;

/// Default per-call deadline, matching the original driver's `timeout=3`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Environment variable that overrides [`DEFAULT_TIMEOUT`] (milliseconds),
/// in the same override-via-env spirit as the teacher's `HDDS_REUSEPORT`.
pub const TIMEOUT_OVERRIDE_ENV: &str = "ESPER_TIMEOUT_MS";

/// Resolve the effective default timeout: [`TIMEOUT_OVERRIDE_ENV`] if set
/// and parseable, otherwise [`DEFAULT_TIMEOUT`].
#[must_use]
pub fn default_timeout() -> Duration {
    std::env::var(TIMEOUT_OVERRIDE_ENV)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_without_env_override() {
        std::env::remove_var(TIMEOUT_OVERRIDE_ENV);
        assert_eq!(default_timeout(), DEFAULT_TIMEOUT);
    }
}
