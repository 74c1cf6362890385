// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pack/unpack for the 13 scalar variable types, and auto-selection of the
//! narrowest wire type(s) that can represent a homogeneous value sequence
//! (spec.md §4.4).

use crate::types::{Variant, VariableType};

/// Encode `data` as `var_type`-typed wire bytes (no padding — that is the
/// framing layer's concern). Returns `None` if `data` doesn't match
/// `var_type`'s shape (e.g. a `Bool` list encoded as `Uint32`).
#[must_use]
pub fn encode(var_type: VariableType, data: &Variant) -> Option<Vec<u8>> {
    let elems = match data {
        Variant::List(v) => v.as_slice(),
        other => std::slice::from_ref(other),
    };

    match var_type {
        VariableType::Unknown | VariableType::Null => Some(Vec::new()),
        VariableType::Ascii => {
            let Variant::Ascii(s) = data else {
                return None;
            };
            Some(s.as_bytes().to_vec())
        }
        VariableType::Bool => {
            let mut out = Vec::with_capacity(elems.len());
            for e in elems {
                out.push(u8::from(bool_of(e)?));
            }
            Some(out)
        }
        VariableType::Uint8 => pack_int(elems, |v| Some(vec![u8::try_from(v).ok()?])),
        VariableType::Uint16 => pack_int(elems, |v| Some(u16::try_from(v).ok()?.to_le_bytes().to_vec())),
        VariableType::Uint32 => pack_int(elems, |v| Some(u32::try_from(v).ok()?.to_le_bytes().to_vec())),
        VariableType::Uint64 => pack_int(elems, |v| Some(u64::try_from(v).ok()?.to_le_bytes().to_vec())),
        VariableType::Int8 => pack_int(elems, |v| Some(i8::try_from(v).ok()?.to_le_bytes().to_vec())),
        VariableType::Int16 => pack_int(elems, |v| Some(i16::try_from(v).ok()?.to_le_bytes().to_vec())),
        VariableType::Int32 => pack_int(elems, |v| Some(i32::try_from(v).ok()?.to_le_bytes().to_vec())),
        VariableType::Int64 => pack_int(elems, |v| Some(i64::try_from(v).ok()?.to_le_bytes().to_vec())),
        VariableType::Float32 => {
            let mut out = Vec::with_capacity(elems.len() * 4);
            for e in elems {
                out.extend_from_slice(&(float_of(e)? as f32).to_le_bytes());
            }
            Some(out)
        }
        VariableType::Float64 => {
            let mut out = Vec::with_capacity(elems.len() * 8);
            for e in elems {
                out.extend_from_slice(&float_of(e)?.to_le_bytes());
            }
            Some(out)
        }
    }
}

fn pack_int(elems: &[Variant], f: impl Fn(i128) -> Option<Vec<u8>>) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    for e in elems {
        out.extend_from_slice(&f(int_of(e)?)?);
    }
    Some(out)
}

fn int_of(v: &Variant) -> Option<i128> {
    match v {
        Variant::Integer(i) => Some(*i),
        _ => None,
    }
}

fn bool_of(v: &Variant) -> Option<bool> {
    match v {
        Variant::Bool(b) => Some(*b),
        _ => None,
    }
}

fn float_of(v: &Variant) -> Option<f64> {
    match v {
        Variant::Float(f) => Some(*f),
        Variant::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

/// Decode `num_elements` elements of `var_type` from the front of `buf`.
/// Returns the decoded [`Variant`] and the number of bytes consumed.
/// Returns `None` if `buf` is shorter than required.
#[must_use]
pub fn decode(var_type: VariableType, num_elements: u32, buf: &[u8]) -> Option<(Variant, usize)> {
    let n = num_elements as usize;
    match var_type {
        VariableType::Unknown | VariableType::Null => Some((Variant::Null, 0)),
        VariableType::Ascii => {
            let bytes = buf.get(..n)?;
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            Some((
                Variant::Ascii(String::from_utf8_lossy(&bytes[..end]).into_owned()),
                n,
            ))
        }
        VariableType::Bool => {
            let bytes = buf.get(..n)?;
            let list = bytes.iter().map(|&b| Variant::Bool(b != 0)).collect();
            Some((Variant::List(list), n))
        }
        VariableType::Uint8 => decode_ints(buf, n, 1, |c| i128::from(c[0])),
        VariableType::Int8 => decode_ints(buf, n, 1, |c| i128::from(c[0] as i8)),
        VariableType::Uint16 => decode_ints(buf, n, 2, |c| i128::from(u16::from_le_bytes([c[0], c[1]]))),
        VariableType::Int16 => decode_ints(buf, n, 2, |c| i128::from(i16::from_le_bytes([c[0], c[1]]))),
        VariableType::Uint32 => decode_ints(buf, n, 4, |c| {
            i128::from(u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        }),
        VariableType::Int32 => decode_ints(buf, n, 4, |c| {
            i128::from(i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        }),
        VariableType::Uint64 => decode_ints(buf, n, 8, |c| {
            i128::from(u64::from_le_bytes(c.try_into().unwrap()))
        }),
        VariableType::Int64 => decode_ints(buf, n, 8, |c| {
            i128::from(i64::from_le_bytes(c.try_into().unwrap()))
        }),
        VariableType::Float32 => {
            let size = 4;
            let total = n.checked_mul(size)?;
            let bytes = buf.get(..total)?;
            let list = bytes
                .chunks_exact(size)
                .map(|c| Variant::Float(f64::from(f32::from_le_bytes(c.try_into().unwrap()))))
                .collect();
            Some((Variant::List(list), total))
        }
        VariableType::Float64 => {
            let size = 8;
            let total = n.checked_mul(size)?;
            let bytes = buf.get(..total)?;
            let list = bytes
                .chunks_exact(size)
                .map(|c| Variant::Float(f64::from_le_bytes(c.try_into().unwrap())))
                .collect();
            Some((Variant::List(list), total))
        }
    }
}

fn decode_ints(
    buf: &[u8],
    n: usize,
    size: usize,
    conv: impl Fn(&[u8]) -> i128,
) -> Option<(Variant, usize)> {
    let total = n.checked_mul(size)?;
    let bytes = buf.get(..total)?;
    let list = bytes.chunks_exact(size).map(|c| Variant::Integer(conv(c))).collect();
    Some((Variant::List(list), total))
}

/// Auto-select the set of wire types (narrowest first) that can represent
/// every value of a homogeneous sequence (spec.md §4.4). Ported from
/// `get_var_types_available_for_data` in the original driver, with the
/// ordering corrected to the monotonic "narrowest first" contract spec.md
/// specifies (the original lists alternates inconsistently for some
/// unsigned ranges).
#[must_use]
pub fn select_types(values: &[Variant]) -> Vec<VariableType> {
    if values.is_empty() {
        return Vec::new();
    }

    if values.iter().all(|v| matches!(v, Variant::Null)) {
        return vec![VariableType::Null];
    }
    if values.iter().all(|v| matches!(v, Variant::Bool(_))) {
        return vec![VariableType::Bool];
    }
    if values.iter().all(|v| matches!(v, Variant::Ascii(_))) {
        return vec![VariableType::Ascii];
    }
    if values.iter().all(|v| matches!(v, Variant::Float(_))) {
        let magnitude_exceeds_f32 = values.iter().any(|v| match v {
            Variant::Float(f) => f.abs() > 3.4e38,
            _ => false,
        });
        return if magnitude_exceeds_f32 {
            vec![VariableType::Float64]
        } else {
            vec![VariableType::Float32, VariableType::Float64]
        };
    }
    if values.iter().all(|v| matches!(v, Variant::Integer(_))) {
        let mut min = i128::MAX;
        let mut max = i128::MIN;
        for v in values {
            if let Variant::Integer(i) = v {
                min = min.min(*i);
                max = max.max(*i);
            }
        }
        return select_integer_types(min, max);
    }

    Vec::new()
}

fn select_integer_types(min: i128, max: i128) -> Vec<VariableType> {
    use VariableType::{Float32, Float64, Int16, Int32, Int64, Int8, Uint16, Uint32, Uint64, Uint8};

    if min < 0 {
        // Signed: pick the narrowest signed integer containing [min, max],
        // then append wider signed types and both floats.
        let candidates = [
            (i128::from(i8::MIN), i128::from(i8::MAX), Int8),
            (i128::from(i16::MIN), i128::from(i16::MAX), Int16),
            (i128::from(i32::MIN), i128::from(i32::MAX), Int32),
            (i128::from(i64::MIN), i128::from(i64::MAX), Int64),
        ];
        let start = candidates
            .iter()
            .position(|&(lo, hi, _)| min >= lo && max <= hi)
            .unwrap_or(candidates.len() - 1);
        let mut out: Vec<VariableType> = candidates[start..].iter().map(|&(_, _, t)| t).collect();
        out.push(Float32);
        out.push(Float64);
        out
    } else {
        // Unsigned: start from the narrowest unsigned type containing
        // `max`, append wider unsigned types, then all wider signed types
        // that still fit, then both floats.
        let unsigned = [
            (i128::from(u8::MAX), Uint8),
            (i128::from(u16::MAX), Uint16),
            (i128::from(u32::MAX), Uint32),
            (i128::from(u64::MAX), Uint64),
        ];
        let start = unsigned
            .iter()
            .position(|&(hi, _)| max <= hi)
            .unwrap_or(unsigned.len() - 1);
        let mut out: Vec<VariableType> = unsigned[start..].iter().map(|&(_, t)| t).collect();

        let signed = [
            (i128::from(i16::MAX), Int16),
            (i128::from(i32::MAX), Int32),
            (i128::from(i64::MAX), Int64),
        ];
        for &(hi, t) in &signed {
            if max <= hi && !out.contains(&t) {
                out.push(t);
            }
        }
        out.push(Float32);
        out.push(Float64);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_signed_mix_scenario_6() {
        // spec.md §8 scenario 6: [-1, 2, 300] -> int16, int32, int64, float32, float64
        let values = vec![Variant::Integer(-1), Variant::Integer(2), Variant::Integer(300)];
        assert_eq!(
            select_types(&values),
            vec![
                VariableType::Int16,
                VariableType::Int32,
                VariableType::Int64,
                VariableType::Float32,
                VariableType::Float64,
            ]
        );
    }

    #[test]
    fn select_all_none() {
        assert_eq!(select_types(&[Variant::Null, Variant::Null]), vec![VariableType::Null]);
    }

    #[test]
    fn select_unsigned_small() {
        let values = vec![Variant::Integer(0), Variant::Integer(200)];
        assert_eq!(select_types(&values)[0], VariableType::Uint8);
    }

    #[test]
    fn select_mixed_types_is_empty() {
        let values = vec![Variant::Integer(1), Variant::Bool(true)];
        assert!(select_types(&values).is_empty());
    }

    #[test]
    fn monotonicity_contains_every_value() {
        let values = vec![Variant::Integer(-5000), Variant::Integer(20000)];
        let types = select_types(&values);
        let t = types[0];
        assert!(t.byte_size() >= 2); // i16 at minimum to hold -5000..20000
    }

    #[test]
    fn read_var_record_scenario_5() {
        // spec.md §8 scenario 5
        let buf: Vec<u8> = vec![0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00];
        let (decoded, consumed) = decode(VariableType::Uint16, 4, &buf).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(
            decoded,
            Variant::List(vec![
                Variant::Integer(1),
                Variant::Integer(2),
                Variant::Integer(3),
                Variant::Integer(4),
            ])
        );
    }

    #[test]
    fn ascii_encode_decode_roundtrip() {
        let encoded = encode(VariableType::Ascii, &Variant::Ascii("hi".into())).unwrap();
        assert_eq!(encoded, b"hi");
        let (decoded, consumed) = decode(VariableType::Ascii, 5, b"hi\0\0\0").unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(decoded, Variant::Ascii("hi".into()));
    }

    #[test]
    fn bool_pack_unpack() {
        let values = Variant::List(vec![Variant::Bool(true), Variant::Bool(false)]);
        let encoded = encode(VariableType::Bool, &values).unwrap();
        assert_eq!(encoded, vec![1, 0]);
        let (decoded, consumed) = decode(VariableType::Bool, 2, &encoded).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(decoded, values);
    }

    #[test]
    fn decode_insufficient_buffer_returns_none() {
        assert!(decode(VariableType::Uint32, 2, &[0, 0, 0, 0]).is_none());
    }
}
