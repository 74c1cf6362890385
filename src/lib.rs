// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # esper - ESPER UDP variable discovery/introspection protocol
//!
//! A client-side implementation of the ESPER wire protocol: a small,
//! CRC-checked UDP request/response protocol that lets a host introspect
//! and read/write named variables exposed by an embedded endpoint, and
//! discover endpoints on a LAN via broadcast.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use esper::{Client, Result, VariableType};
//! use std::net::SocketAddr;
//!
//! fn main() -> Result<()> {
//!     let addr: SocketAddr = "192.168.1.50:27500".parse().unwrap();
//!     let mut client = Client::connect(addr, None)?;
//!
//!     client.ping(vec![0u8; 8])?;
//!
//!     let vid = client.get_var_id("/sensors/temperature")?;
//!     let records = client.read_var(vid, 0, 1, VariableType::Unknown)?;
//!     println!("{:?}", records);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                      Client API (client)                     |
//! |   ping | read_var | write_var | get_var_id | *_info          |
//! +--------------------------------------------------------------+
//! |  Namespace (namespace)     |  Discovery (discovery)           |
//! |  path resolution, tree     |  broadcast scan, filter/response |
//! +--------------------------------------------------------------+
//! |      Correlator (correlator)      |      Codec (codec)        |
//! |      msg_id alloc + matching      |  scalar pack/unpack, type |
//! |                                    |  auto-selection           |
//! +--------------------------------------------------------------+
//! |                     Framing (framing + crc)                  |
//! |           header/payload CRC32, request/response bytes       |
//! +--------------------------------------------------------------+
//! |                     Transport (transport)                    |
//! |              connected UDP socket, deadline + retry          |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`client`] - typed operations (start here)
//! - [`namespace`] - group/variable tree and path resolution
//! - [`discovery`] - broadcast endpoint scanner
//! - [`correlator`] - message-id allocation and response matching
//! - [`codec`] - scalar value pack/unpack and type auto-selection
//! - [`framing`] - wire-level request/response byte layout
//! - [`transport`] - UDP socket and per-call retry loop
//! - [`types`] - wire data model (variable/group/endpoint records)
//! - [`config`] - crate-wide constants
//! - [`error`] - error taxonomy
//! - [`url`] - `auth_token@host:port` connection string parsing
//!
//! ## Non-goals
//!
//! No server side, no persistence, UDP only (no TCP/TLS), IPv4 data path
//! only. CLI argument parsing, an interactive shell, and packaging belong
//! to applications built on top of this crate.

pub mod client;
pub mod codec;
pub mod config;
pub mod correlator;
pub mod crc;
pub mod discovery;
pub mod error;
pub mod framing;
pub mod namespace;
pub mod transport;
pub mod types;
pub mod url;

pub use client::Client;
pub use discovery::{scan, DiscoveryFilter};
pub use error::{Error, Result};
pub use namespace::Namespace;
pub use types::{
    DiscoveredDevice, EndpointInfo, GroupInfo, MessageType, VarRecord, Variant, VariableInfo, VariableType,
};
pub use url::{parse_url, ParsedUrl};
