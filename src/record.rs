//! record — декодирование записей (record format).
//!
//! Запись: [header_len varint][serial_type varint ...][body].
//! Serial types:
//! - 0 NULL; 1..=6 целые BE twos-complement (1,2,3,4,6,8 байт);
//! - 7 f64; 8 литерал 0; 9 литерал 1; 10/11 зарезервированы;
//! - N>=12 чётный — BLOB длины (N-12)/2; N>=13 нечётный — TEXT длины (N-13)/2.

use anyhow::{anyhow, Result};
use byteorder::{BigEndian, ByteOrder};
use std::fmt;

use crate::varint::read_varint;

/// Значение одной колонки записи.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Целое значение, если оно есть (для rootpage и т.п.).
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(b) => write!(f, "(blob {} B)", b.len()),
        }
    }
}

/// Длина тела для serial type.
fn serial_len(st: u64) -> Result<usize> {
    Ok(match st {
        0 | 8 | 9 => 0,
        1 => 1,
        2 => 2,
        3 => 3,
        4 => 4,
        5 => 6,
        6 | 7 => 8,
        10 | 11 => return Err(anyhow!("reserved serial type {}", st)),
        n if n % 2 == 0 => ((n - 12) / 2) as usize,
        n => ((n - 13) / 2) as usize,
    })
}

/// BE twos-complement целое из 1..8 байт.
fn read_int_be(bytes: &[u8]) -> i64 {
    debug_assert!(!bytes.is_empty() && bytes.len() <= 8);
    let mut v = bytes[0] as i8 as i64; // расширение знака со старшего байта
    for &b in &bytes[1..] {
        v = (v << 8) | b as i64;
    }
    v
}

fn decode_value(st: u64, bytes: &[u8]) -> Result<Value> {
    Ok(match st {
        0 => Value::Null,
        1..=6 => Value::Int(read_int_be(bytes)),
        7 => Value::Real(f64::from_bits(BigEndian::read_u64(bytes))),
        8 => Value::Int(0),
        9 => Value::Int(1),
        n if n >= 12 && n % 2 == 0 => Value::Blob(bytes.to_vec()),
        n if n >= 13 => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        n => return Err(anyhow!("reserved serial type {}", n)),
    })
}

/// Декодировать запись целиком в значения колонок.
pub fn decode_record(buf: &[u8]) -> Result<Vec<Value>> {
    let (hdr_len, n0) = read_varint(buf)?;
    let hdr_len = hdr_len as usize;
    if hdr_len < n0 || hdr_len > buf.len() {
        return Err(anyhow!(
            "record header length {} out of range (record {} B)",
            hdr_len,
            buf.len()
        ));
    }

    // Serial types лежат в хвосте header'а.
    let mut serials = Vec::new();
    let mut off = n0;
    while off < hdr_len {
        let (st, n) = read_varint(&buf[off..hdr_len])?;
        serials.push(st);
        off += n;
    }

    // Тело: значения подряд, по длинам serial types.
    let mut values = Vec::with_capacity(serials.len());
    let mut off = hdr_len;
    for &st in &serials {
        let len = serial_len(st)?;
        if off + len > buf.len() {
            return Err(anyhow!(
                "record body truncated: column needs {} byte(s) at offset {}, record {} B",
                len,
                off,
                buf.len()
            ));
        }
        values.push(decode_value(st, &buf[off..off + len])?);
        off += len;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Ручная сборка записи: header_len + serial types + body (все varint'ы короткие).
    fn record(serials: &[u64], body: &[u8]) -> Vec<u8> {
        let mut hdr = Vec::new();
        for &s in serials {
            assert!(s < 128, "test helper handles 1-byte varints only");
            hdr.push(s as u8);
        }
        let mut out = vec![(hdr.len() + 1) as u8];
        out.extend_from_slice(&hdr);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn decode_mixed_row() {
        // (NULL, 1000, 'abc', x'CAFE', 0)
        let mut body = Vec::new();
        body.extend_from_slice(&1000i16.to_be_bytes());
        body.extend_from_slice(b"abc");
        body.extend_from_slice(&[0xCA, 0xFE]);
        let rec = record(&[0, 2, 13 + 6, 12 + 4, 8], &body);

        let vals = decode_record(&rec).unwrap();
        assert_eq!(
            vals,
            vec![
                Value::Null,
                Value::Int(1000),
                Value::Text("abc".into()),
                Value::Blob(vec![0xCA, 0xFE]),
                Value::Int(0),
            ]
        );
    }

    #[test]
    fn negative_int_sign_extends() {
        let rec = record(&[1], &[0xFF]);
        assert_eq!(decode_record(&rec).unwrap(), vec![Value::Int(-1)]);

        let rec = record(&[3], &[0xFF, 0xFF, 0x85]);
        assert_eq!(decode_record(&rec).unwrap(), vec![Value::Int(-123)]);
    }

    #[test]
    fn real_roundtrip() {
        let mut body = Vec::new();
        body.extend_from_slice(&1.5f64.to_bits().to_be_bytes());
        let rec = record(&[7], &body);
        assert_eq!(decode_record(&rec).unwrap(), vec![Value::Real(1.5)]);
    }

    #[test]
    fn truncated_body_is_error() {
        let rec = record(&[13 + 20], b"short");
        assert!(decode_record(&rec).is_err());
    }

    #[test]
    fn reserved_serial_is_error() {
        let rec = record(&[10], &[]);
        assert!(decode_record(&rec).is_err());
    }
}
