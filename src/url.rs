// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `parse_url`: splits an ESPER connection string of the form
//! `[auth_token@]host[:port]` into its parts (spec.md §6). A thin,
//! dependency-free helper for an external CLI front-end — this crate
//! itself never reads argv.

use crate::error::{Error, Result};

/// The parts of an ESPER connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub auth_token: Option<u64>,
    pub host: String,
    pub port: u16,
}

/// Parse `url`. `default_port` is used when no `:port` suffix is present;
/// `default_auth` is used when no `auth_token@` prefix is present.
///
/// Ported from `esper_tool2/__main__.py::parse_url`: the auth token uses
/// radix auto-detection (`0x`/`0o`/`0b` prefixes, else decimal), matching
/// Python's `int(s, 0)`.
pub fn parse_url(url: &str, default_port: u16, default_auth: Option<u64>) -> Result<ParsedUrl> {
    let auth_delimit = url.find('@');
    let port_delimit = url.find(':');

    let (auth_token, host_start) = match auth_delimit {
        Some(at) => (Some(parse_radix_u64(&url[..at])?), at + 1),
        None => (default_auth, 0),
    };

    let (port, host_end) = match port_delimit {
        Some(at) => (url[at + 1..].parse::<u16>().map_err(|_| Error::NotFound)?, at),
        None => (default_port, url.len()),
    };

    if host_start > host_end {
        return Err(Error::NotFound);
    }
    let host = url[host_start..host_end].to_string();

    Ok(ParsedUrl { auth_token, host, port })
}

/// Parse an integer with Python `int(s, 0)`-style radix auto-detection:
/// `0x`/`0X` hex, `0o`/`0O` octal, `0b`/`0B` binary, else decimal.
fn parse_radix_u64(s: &str) -> Result<u64> {
    let s = s.trim();
    let (digits, radix) = if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (rest, 16)
    } else if let Some(rest) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        (rest, 8)
    } else if let Some(rest) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (rest, 2)
    } else {
        (s, 10)
    };
    u64::from_str_radix(digits, radix).map_err(|_| Error::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_and_default_port_only() {
        let parsed = parse_url("192.168.1.10", 27500, None).unwrap();
        assert_eq!(parsed.host, "192.168.1.10");
        assert_eq!(parsed.port, 27500);
        assert_eq!(parsed.auth_token, None);
    }

    #[test]
    fn host_with_explicit_port() {
        let parsed = parse_url("192.168.1.10:9000", 27500, None).unwrap();
        assert_eq!(parsed.host, "192.168.1.10");
        assert_eq!(parsed.port, 9000);
    }

    #[test]
    fn auth_token_decimal() {
        let parsed = parse_url("42@192.168.1.10:9000", 27500, None).unwrap();
        assert_eq!(parsed.auth_token, Some(42));
        assert_eq!(parsed.host, "192.168.1.10");
        assert_eq!(parsed.port, 9000);
    }

    #[test]
    fn auth_token_hex_prefix() {
        let parsed = parse_url("0xFF@dev.local", 27500, None).unwrap();
        assert_eq!(parsed.auth_token, Some(255));
        assert_eq!(parsed.host, "dev.local");
    }

    #[test]
    fn default_auth_used_when_absent() {
        let parsed = parse_url("dev.local", 27500, Some(7)).unwrap();
        assert_eq!(parsed.auth_token, Some(7));
    }

    #[test]
    fn invalid_port_is_error() {
        assert!(parse_url("dev.local:notaport", 27500, None).is_err());
    }
}
