//! varint — big-endian varints формата SQLite.
//!
//! 1..9 байт, по 7 бит на байт (старший бит — continuation); девятый байт
//! вносит все 8 бит. Максимум 9 байт => u64 целиком.

use anyhow::{anyhow, Result};

use crate::consts::MAX_VARINT_LEN;

/// Прочитать varint с начала `buf`. Возвращает (значение, длина в байтах).
pub fn read_varint(buf: &[u8]) -> Result<(u64, usize)> {
    let mut v: u64 = 0;
    for (i, &b) in buf.iter().take(MAX_VARINT_LEN).enumerate() {
        if i == MAX_VARINT_LEN - 1 {
            // Девятый байт — все 8 бит, без continuation-флага.
            v = (v << 8) | b as u64;
            return Ok((v, MAX_VARINT_LEN));
        }
        v = (v << 7) | (b & 0x7f) as u64;
        if b & 0x80 == 0 {
            return Ok((v, i + 1));
        }
    }
    Err(anyhow!("truncated varint ({} byte(s) available)", buf.len()))
}

/// Varint как знаковое число (rowid, ключи) — twos-complement поверх u64.
pub fn read_varint_i64(buf: &[u8]) -> Result<(i64, usize)> {
    let (v, n) = read_varint(buf)?;
    Ok((v as i64, n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_varint(mut v: u64) -> Vec<u8> {
        // Обратный порядок: набираем младшие 7-битные группы, потом разворачиваем.
        if v > (u64::MAX >> 8) {
            let mut out = vec![0u8; 9];
            out[8] = (v & 0xff) as u8;
            v >>= 8;
            for i in (0..8).rev() {
                out[i] = ((v & 0x7f) as u8) | 0x80;
                v >>= 7;
            }
            return out;
        }
        let mut tmp = vec![(v & 0x7f) as u8];
        v >>= 7;
        while v > 0 {
            tmp.push(((v & 0x7f) as u8) | 0x80);
            v >>= 7;
        }
        tmp.reverse();
        tmp
    }

    #[test]
    fn roundtrip_small_and_large() {
        for &v in &[
            0u64,
            1,
            127,
            128,
            16383,
            16384,
            0xFFFF_FFFF,
            u64::MAX >> 8,
            (u64::MAX >> 8) + 1,
            u64::MAX,
        ] {
            let enc = write_varint(v);
            let (got, n) = read_varint(&enc).unwrap();
            assert_eq!(got, v, "value mismatch for {}", v);
            assert_eq!(n, enc.len(), "length mismatch for {}", v);
        }
    }

    #[test]
    fn negative_rowid_via_i64() {
        let enc = write_varint(u64::MAX); // -1 в twos-complement
        let (got, n) = read_varint_i64(&enc).unwrap();
        assert_eq!(got, -1);
        assert_eq!(n, 9);
    }

    #[test]
    fn truncated_input_is_error() {
        assert!(read_varint(&[]).is_err());
        assert!(read_varint(&[0x80]).is_err());
        assert!(read_varint(&[0x80; 8]).is_err());
        // 9 байт с continuation во всех первых восьми — валидно.
        assert!(read_varint(&[0x80; 9]).is_ok());
    }

    #[test]
    fn trailing_bytes_ignored() {
        let (v, n) = read_varint(&[0x05, 0xAA, 0xBB]).unwrap();
        assert_eq!(v, 5);
        assert_eq!(n, 1);
    }
}
