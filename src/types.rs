// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wire-level data model: the 13 scalar variable types, message types, and
//! the parsed record shapes (`VariableInfo`, `GroupInfo`, `EndpointInfo`,
//! `DiscoveredDevice`).

use std::fmt;

/// The 13 scalar variable type tags, plus `unknown`/`null`, with fixed
/// ordinals matching the wire protocol (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VariableType {
    Unknown = 0,
    Null = 1,
    Ascii = 2,
    Bool = 3,
    Uint8 = 4,
    Uint16 = 5,
    Uint32 = 6,
    Uint64 = 7,
    Int8 = 8,
    Int16 = 9,
    Int32 = 10,
    Int64 = 11,
    Float32 = 12,
    Float64 = 13,
}

impl VariableType {
    /// Construct from the wire ordinal. Unrecognized ordinals decode as
    /// `Unknown` rather than erroring — the wire format has no tag for
    /// "invalid", and a forward-compatible reader should not choke on a
    /// type it doesn't recognize yet.
    #[must_use]
    pub fn from_u32(v: u32) -> Self {
        match v {
            1 => Self::Null,
            2 => Self::Ascii,
            3 => Self::Bool,
            4 => Self::Uint8,
            5 => Self::Uint16,
            6 => Self::Uint32,
            7 => Self::Uint64,
            8 => Self::Int8,
            9 => Self::Int16,
            10 => Self::Int32,
            11 => Self::Int64,
            12 => Self::Float32,
            13 => Self::Float64,
            _ => Self::Unknown,
        }
    }

    /// Byte size of a single element of this type (spec.md §3).
    #[must_use]
    pub fn byte_size(self) -> usize {
        match self {
            Self::Unknown | Self::Null => 0,
            Self::Ascii | Self::Bool | Self::Uint8 | Self::Int8 => 1,
            Self::Uint16 | Self::Int16 => 2,
            Self::Uint32 | Self::Int32 | Self::Float32 => 4,
            Self::Uint64 | Self::Int64 | Self::Float64 => 8,
        }
    }

    /// Lowercase wire name, ported from `EsperGetTypeString`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Null => "null",
            Self::Ascii => "ascii",
            Self::Bool => "bool",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message type tags (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Discover = 0x00,
    Ping = 0x01,
    VarRead = 0x10,
    VarWrite = 0x11,
    VarPath = 0x12,
    VarInfo = 0x13,
    GroupInfo = 0x14,
    GroupPath = 0x15,
    EndpointInfo = 0x16,
    Error = 0xFF,
}

impl MessageType {
    #[must_use]
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0x00 => Self::Discover,
            0x01 => Self::Ping,
            0x10 => Self::VarRead,
            0x11 => Self::VarWrite,
            0x12 => Self::VarPath,
            0x13 => Self::VarInfo,
            0x14 => Self::GroupInfo,
            0x15 => Self::GroupPath,
            0x16 => Self::EndpointInfo,
            0xFF => Self::Error,
            _ => return None,
        })
    }
}

/// A dynamically-typed value presented at the `write_var` boundary, before
/// type auto-selection (spec.md §9 design notes) picks a concrete wire
/// type.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Null,
    Bool(bool),
    Ascii(String),
    Integer(i128),
    Float(f64),
    List(Vec<Variant>),
}

/// A parsed `var_info` response record (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    pub vid: u32,
    pub gid: u32,
    pub key: String,
    pub ts: u32,
    pub wc: u32,
    pub var_type: VariableType,
    pub num_elements: u32,
    pub max_elements_per_request: u32,
    pub option: u8,
    pub status: u8,
}

impl VariableInfo {
    pub const fn is_readable(&self) -> bool {
        self.option & 0x01 != 0
    }
    pub const fn is_writable(&self) -> bool {
        self.option & 0x02 != 0
    }
    pub const fn is_hidden(&self) -> bool {
        self.option & 0x04 != 0
    }
    pub const fn is_storable(&self) -> bool {
        self.option & 0x08 != 0
    }
    pub const fn is_lockable(&self) -> bool {
        self.option & 0x10 != 0
    }
    pub const fn is_windowed(&self) -> bool {
        self.option & 0x20 != 0
    }
    pub const fn is_locked(&self) -> bool {
        self.status & 0x01 != 0
    }
    pub const fn is_stored(&self) -> bool {
        self.status & 0x02 != 0
    }
    pub const fn is_logged(&self) -> bool {
        self.status & 0x04 != 0
    }
    pub const fn is_validated(&self) -> bool {
        self.status & 0x08 != 0
    }
}

/// A parsed `group_info` response record (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub gid: u32,
    /// Parent group id. The root group (`gid == 1`) reports `pid == 1`.
    pub pid: u32,
    pub key: String,
    pub num_vars: u32,
    pub num_groups: u32,
    pub ts: u32,
    pub wc: u32,
    pub option: u8,
    pub status: u8,
}

/// A parsed `endpoint_info` response record (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInfo {
    pub hardware_id: String,
    pub device_type: String,
    pub device_name: String,
    pub device_rev: String,
    pub uptime: u32,
    pub tick_count: u32,
    pub device_id: u32,
    pub log_level: i32,
    pub alarm_level: i32,
    pub log_id: u32,
    pub num_modules: u32,
    pub num_vars: u32,
    pub num_storable_vars: u32,
    pub num_groups: u32,
    pub num_alarms: u32,
    pub api_version: u8,
}

/// A single decoded `read_var`/`write_var` response record (spec.md §4.6).
#[derive(Debug, Clone, PartialEq)]
pub struct VarRecord {
    pub vid: u32,
    /// Negative on failure; 0 on success. See [`crate::error::link_error_string`].
    pub err: i32,
    pub offset: u32,
    pub var_type: VariableType,
    pub data: Variant,
}

/// A device discovered via the broadcast scanner (spec.md §4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub hardware_id: String,
    pub device_type: String,
    pub name: String,
    pub revision: String,
    pub device_id: u32,
    pub uptime: u32,
    pub ipv4: std::net::Ipv4Addr,
    pub port: u16,
}

/// Strip trailing NUL bytes (and any bytes after the first NUL) from a
/// fixed-width ASCII field, then decode the remainder as ASCII/UTF-8.
///
/// Mirrors `bytes.rstrip('\0')` in the original Python driver.
#[must_use]
pub fn decode_fixed_ascii(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// Encode `s` into a fixed-width NUL-padded ASCII field of length `width`.
/// Truncates `s` if it doesn't fit.
pub fn encode_fixed_ascii(s: &str, width: usize) -> Vec<u8> {
    let mut out = vec![0u8; width];
    let bytes = s.as_bytes();
    let n = bytes.len().min(width);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}
