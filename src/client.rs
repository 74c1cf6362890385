// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed client API: `ping`, `read_var`, `write_var`, `get_var_id`,
//! `get_group_id`, `read_var_info`, `read_group_info`, `read_endpoint_info`
//! (spec.md §4.6), composed from [`crate::correlator`], [`crate::framing`]
//! and [`crate::transport`].

use std::net::SocketAddr;
use std::time::Instant;

use crate::codec;
use crate::config;
use crate::correlator::Correlator;
use crate::error::{Error, Result};
use crate::framing::Request;
use crate::namespace::Namespace;
use crate::transport::Transport;
use crate::types::{decode_fixed_ascii, EndpointInfo, GroupInfo, MessageType, VarRecord, Variant, VariableInfo, VariableType};

/// Option bit (request side of `var_read`): ignore the requested type and
/// return whatever the variable actually is. Set automatically when the
/// caller passes `VariableType::Unknown`.
const VAR_READ_IGNORE_TYPE: u32 = 0x01;

/// One read/write record header: `vid, err, offset, num_elements, type`.
const RECORD_HEADER_LEN: usize = 16;

/// A connected ESPER client. Owns one UDP socket and one message-id
/// counter; see spec.md §5 — not safe to share across concurrent calls.
pub struct Client {
    transport: Transport,
    correlator: Correlator,
    auth_token: Option<u64>,
    timeout: std::time::Duration,
}

impl Client {
    /// Connect to `addr`. `auth_token` is carried on every request; `None`
    /// sets the `NO_AUTH_TOKEN` option bit instead of sending a token.
    pub fn connect(addr: SocketAddr, auth_token: Option<u64>) -> Result<Self> {
        Ok(Self {
            transport: Transport::connect(addr)?,
            correlator: Correlator::new(),
            auth_token,
            timeout: config::default_timeout(),
        })
    }

    /// Override the per-call deadline (defaults to [`config::default_timeout`]).
    #[must_use]
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn call(&mut self, msg_type: MessageType, payload: Vec<u8>) -> Result<crate::framing::Response> {
        let msg_id = self.correlator.next_id();
        let request = Request::new(msg_id, msg_type as u8, payload, self.auth_token);
        let deadline = Instant::now() + self.timeout;
        self.transport.call(&request, &self.correlator, deadline)
    }

    /// Send a payload of zeros (or caller-supplied bytes) and succeed on
    /// any validly-matched reply.
    pub fn ping(&mut self, payload: Vec<u8>) -> Result<()> {
        self.call(MessageType::Ping, payload)?;
        Ok(())
    }

    /// Resolve a variable path to its `vid` (0 if not found).
    pub fn get_var_id(&mut self, path: &str) -> Result<u32> {
        let response = self.call(MessageType::VarPath, path_payload(path))?;
        read_u32(&response.payload, 0)
    }

    /// Resolve a group path to its `gid` (0 if not found).
    pub fn get_group_id(&mut self, path: &str) -> Result<u32> {
        let response = self.call(MessageType::GroupPath, path_payload(path))?;
        read_u32(&response.payload, 0)
    }

    /// Read `num_elements` elements of `vid` starting at `offset`. Passing
    /// `VariableType::Unknown` sets the ignore-type option bit so the
    /// endpoint returns whatever the variable actually is.
    pub fn read_var(
        &mut self,
        vid: u32,
        offset: u32,
        num_elements: u32,
        var_type: VariableType,
    ) -> Result<Vec<VarRecord>> {
        let options = if var_type == VariableType::Unknown { VAR_READ_IGNORE_TYPE } else { 0 };
        let mut payload = Vec::with_capacity(24);
        payload.extend_from_slice(&1u32.to_le_bytes()); // one var requested
        payload.extend_from_slice(&options.to_le_bytes());
        payload.extend_from_slice(&vid.to_le_bytes());
        payload.extend_from_slice(&offset.to_le_bytes());
        payload.extend_from_slice(&num_elements.to_le_bytes());
        payload.extend_from_slice(&(var_type as u32).to_le_bytes());

        let response = self.call(MessageType::VarRead, payload)?;
        decode_var_records(&response.payload)
    }

    /// Write `num_elements` elements to `vid` starting at `offset`.
    /// `var_type` must be a concrete wire type selected via
    /// [`codec::select_types`]; `data` is encoded per §4.4.
    pub fn write_var(
        &mut self,
        vid: u32,
        offset: u32,
        num_elements: u32,
        var_type: VariableType,
        data: &Variant,
    ) -> Result<Vec<VarRecord>> {
        let encoded = codec::encode(var_type, data).ok_or(Error::BadMessageType)?;

        let mut payload = Vec::with_capacity(24 + encoded.len());
        payload.extend_from_slice(&1u32.to_le_bytes()); // one var written
        payload.extend_from_slice(&0u32.to_le_bytes()); // no options
        payload.extend_from_slice(&vid.to_le_bytes());
        payload.extend_from_slice(&offset.to_le_bytes());
        payload.extend_from_slice(&num_elements.to_le_bytes());
        payload.extend_from_slice(&(var_type as u32).to_le_bytes());
        payload.extend_from_slice(&encoded);

        let response = self.call(MessageType::VarWrite, payload)?;
        decode_var_records(&response.payload)
    }

    /// Fetch a variable's metadata record.
    pub fn read_var_info(&mut self, vid: u32, options: u32) -> Result<VariableInfo> {
        let mut payload = Vec::with_capacity(8);
        payload.extend_from_slice(&vid.to_le_bytes());
        payload.extend_from_slice(&options.to_le_bytes());

        let response = self.call(MessageType::VarInfo, payload)?;
        decode_var_info(&response.payload)
    }

    /// Fetch a group's metadata record.
    pub fn read_group_info(&mut self, gid: u32, options: u32) -> Result<GroupInfo> {
        let mut payload = Vec::with_capacity(8);
        payload.extend_from_slice(&gid.to_le_bytes());
        payload.extend_from_slice(&options.to_le_bytes());

        let response = self.call(MessageType::GroupInfo, payload)?;
        decode_group_info(&response.payload)
    }

    /// Fetch the endpoint's identity and counts.
    pub fn read_endpoint_info(&mut self, options: u32) -> Result<EndpointInfo> {
        let payload = options.to_le_bytes().to_vec();
        let response = self.call(MessageType::EndpointInfo, payload)?;
        decode_endpoint_info(&response.payload)
    }

    /// Load the full namespace tree (spec.md §4.7): one `read_endpoint_info`
    /// call to learn `num_groups`/`num_vars`, then one `read_group_info`
    /// per `gid in [1, num_groups]` and one `read_var_info` per
    /// `vid in [1, num_vars]`, assembled into a [`Namespace`].
    pub fn load_namespace(&mut self) -> Result<Namespace> {
        let endpoint = self.read_endpoint_info(0)?;
        log::debug!(
            "client: loading namespace ({} groups, {} variables)",
            endpoint.num_groups,
            endpoint.num_vars
        );

        let mut groups = Vec::with_capacity(endpoint.num_groups as usize);
        for gid in 1..=endpoint.num_groups {
            groups.push(self.read_group_info(gid, 0)?);
        }

        let mut vars = Vec::with_capacity(endpoint.num_vars as usize);
        for vid in 1..=endpoint.num_vars {
            vars.push(self.read_var_info(vid, 0)?);
        }

        Ok(Namespace::build(groups, vars))
    }
}

fn path_payload(path: &str) -> Vec<u8> {
    let bytes = path.as_bytes();
    let mut payload = Vec::with_capacity(8 + bytes.len());
    payload.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    payload.extend_from_slice(&0u32.to_le_bytes()); // no options
    payload.extend_from_slice(bytes);
    payload
}

fn read_u32(buf: &[u8], at: usize) -> Result<u32> {
    let bytes: [u8; 4] = buf.get(at..at + 4).ok_or(Error::BadResponseLength)?.try_into().unwrap();
    Ok(u32::from_le_bytes(bytes))
}

fn read_i32(buf: &[u8], at: usize) -> Result<i32> {
    let bytes: [u8; 4] = buf.get(at..at + 4).ok_or(Error::BadResponseLength)?.try_into().unwrap();
    Ok(i32::from_le_bytes(bytes))
}

fn read_u16(buf: &[u8], at: usize) -> Result<u16> {
    let bytes: [u8; 2] = buf.get(at..at + 2).ok_or(Error::BadResponseLength)?.try_into().unwrap();
    Ok(u16::from_le_bytes(bytes))
}

/// Decode one or more `read_var`/`write_var` response records, iterating
/// until the payload is exhausted (spec.md §9 — the original driver's
/// single-record loop is a bug; the wire format supports several).
fn decode_var_records(payload: &[u8]) -> Result<Vec<VarRecord>> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while offset < payload.len() {
        if payload.len() - offset < RECORD_HEADER_LEN {
            return Err(Error::BadResponseLength);
        }
        let vid = read_u32(payload, offset)?;
        let err = read_i32(payload, offset + 4)?;
        let rec_offset = read_u32(payload, offset + 8)?;
        let num_elements = u32::from(read_u16(payload, offset + 12)?);
        let var_type = VariableType::from_u32(u32::from(read_u16(payload, offset + 14)?));
        offset += RECORD_HEADER_LEN;

        let (data, consumed) =
            codec::decode(var_type, num_elements, &payload[offset..]).ok_or(Error::BadResponseLength)?;
        offset += consumed;

        records.push(VarRecord {
            vid,
            err,
            offset: rec_offset,
            var_type,
            data,
        });
    }

    Ok(records)
}

fn decode_var_info(payload: &[u8]) -> Result<VariableInfo> {
    const LEN: usize = 4 + 4 + 32 + 4 + 4 + 4 + 4 + 4 + 1 + 1;
    if payload.len() < LEN {
        return Err(Error::BadResponseLength);
    }
    let vid = read_u32(payload, 0)?;
    let gid = read_u32(payload, 4)?;
    let key = decode_fixed_ascii(&payload[8..40]);
    let ts = read_u32(payload, 40)?;
    let wc = read_u32(payload, 44)?;
    let var_type = VariableType::from_u32(read_u32(payload, 48)?);
    let num_elements = read_u32(payload, 52)?;
    let max_elements_per_request = read_u32(payload, 56)?;
    let option = payload[60];
    let status = payload[61];

    Ok(VariableInfo {
        vid,
        gid,
        key,
        ts,
        wc,
        var_type,
        num_elements,
        max_elements_per_request,
        option,
        status,
    })
}

fn decode_group_info(payload: &[u8]) -> Result<GroupInfo> {
    const LEN: usize = 4 + 4 + 32 + 4 + 4 + 4 + 4 + 1 + 1;
    if payload.len() < LEN {
        return Err(Error::BadResponseLength);
    }
    let gid = read_u32(payload, 0)?;
    let pid = read_u32(payload, 4)?;
    let key = decode_fixed_ascii(&payload[8..40]);
    let num_vars = read_u32(payload, 40)?;
    let num_groups = read_u32(payload, 44)?;
    let ts = read_u32(payload, 48)?;
    let wc = read_u32(payload, 52)?;
    let option = payload[56];
    let status = payload[57];

    Ok(GroupInfo {
        gid,
        pid,
        key,
        num_vars,
        num_groups,
        ts,
        wc,
        option,
        status,
    })
}

fn decode_endpoint_info(payload: &[u8]) -> Result<EndpointInfo> {
    const LEN: usize = 128 + 64 + 64 + 32 + 4 * 3 + 4 * 2 + 4 * 6 + 1;
    if payload.len() < LEN {
        return Err(Error::BadResponseLength);
    }
    let mut off = 0;
    let hardware_id = decode_fixed_ascii(&payload[off..off + 128]);
    off += 128;
    let device_type = decode_fixed_ascii(&payload[off..off + 64]);
    off += 64;
    let device_name = decode_fixed_ascii(&payload[off..off + 64]);
    off += 64;
    let device_rev = decode_fixed_ascii(&payload[off..off + 32]);
    off += 32;
    let uptime = read_u32(payload, off)?;
    off += 4;
    let tick_count = read_u32(payload, off)?;
    off += 4;
    let device_id = read_u32(payload, off)?;
    off += 4;
    let log_level = read_i32(payload, off)?;
    off += 4;
    let alarm_level = read_i32(payload, off)?;
    off += 4;
    let log_id = read_u32(payload, off)?;
    off += 4;
    let num_modules = read_u32(payload, off)?;
    off += 4;
    let num_vars = read_u32(payload, off)?;
    off += 4;
    let num_storable_vars = read_u32(payload, off)?;
    off += 4;
    let num_groups = read_u32(payload, off)?;
    off += 4;
    let num_alarms = read_u32(payload, off)?;
    off += 4;
    let api_version = payload[off];

    Ok(EndpointInfo {
        hardware_id,
        device_type,
        device_name,
        device_rev,
        uptime,
        tick_count,
        device_id,
        log_level,
        alarm_level,
        log_id,
        num_modules,
        num_vars,
        num_storable_vars,
        num_groups,
        num_alarms,
        api_version,
    })
}
