//! page/cell — разбор ячеек btree-страниц.
//!
//! Четыре формата:
//! - table leaf (0x0d):    [payload_len varint][rowid varint][local payload]
//!                          [first_overflow u32 — если payload вынесен];
//! - table interior (0x05): [left_child u32][rowid varint];
//! - index leaf (0x0a):     [payload_len varint][local payload][first_overflow u32?];
//! - index interior (0x02): [left_child u32][payload_len varint][local payload]
//!                          [first_overflow u32?].
//!
//! Локальная часть payload'а считается через spill::split_payload по
//! usable size страницы — та же формула, что и при записи файла.

use anyhow::{anyhow, Result};
use byteorder::{BigEndian, ByteOrder};

use crate::page::header::PageType;
use crate::spill::{split_payload, PageKind};
use crate::varint::{read_varint, read_varint_i64};

/// Payload ячейки: локальная часть плюс ссылка на overflow-цепочку.
#[derive(Debug, Clone)]
pub struct Payload {
    /// Полная длина payload'а, включая overflow.
    pub total_len: u64,
    /// Байты, лежащие на самой странице.
    pub local: Vec<u8>,
    /// Первая страница overflow-цепочки, если payload вынесен.
    pub first_overflow: Option<u32>,
}

impl Payload {
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.first_overflow.is_none()
    }

    /// Байт payload'а в overflow-цепочке.
    #[inline]
    pub fn spilled(&self) -> u64 {
        self.total_len - self.local.len() as u64
    }
}

/// Разобранная ячейка.
#[derive(Debug, Clone)]
pub enum Cell {
    TableLeaf { rowid: i64, payload: Payload },
    TableInterior { left_child: u32, rowid: i64 },
    IndexLeaf { payload: Payload },
    IndexInterior { left_child: u32, payload: Payload },
}

impl Cell {
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Cell::TableLeaf { payload, .. } => Some(payload),
            Cell::IndexLeaf { payload } => Some(payload),
            Cell::IndexInterior { payload, .. } => Some(payload),
            Cell::TableInterior { .. } => None,
        }
    }

    pub fn left_child(&self) -> Option<u32> {
        match *self {
            Cell::TableInterior { left_child, .. } => Some(left_child),
            Cell::IndexInterior { left_child, .. } => Some(left_child),
            _ => None,
        }
    }
}

fn read_u32_at(page: &[u8], off: usize) -> Result<u32> {
    if off + 4 > page.len() {
        return Err(anyhow!("cell field u32 out of page bounds at offset {}", off));
    }
    Ok(BigEndian::read_u32(&page[off..off + 4]))
}

/// Локальная часть payload'а + ссылка на overflow.
fn parse_payload(page: &[u8], off: usize, total_len: u64, kind: PageKind) -> Result<Payload> {
    let usable = page.len() as u64;
    let placement = split_payload(usable, total_len, kind)?;
    let local_len = placement.local() as usize;

    if off + local_len > page.len() {
        return Err(anyhow!(
            "cell payload out of page bounds (offset {}, local {} B, page {} B)",
            off,
            local_len,
            page.len()
        ));
    }
    let local = page[off..off + local_len].to_vec();

    let first_overflow = if placement.is_inline() {
        None
    } else {
        let pid = read_u32_at(page, off + local_len)?;
        if pid == 0 {
            return Err(anyhow!("spilled payload with zero overflow page pointer"));
        }
        Some(pid)
    };

    Ok(Payload {
        total_len,
        local,
        first_overflow,
    })
}

/// Разобрать ячейку по offset'у из cell pointer array.
///
/// `page` — буфер страницы, усечённый до usable size (reserved-хвост
/// страницы ячейкам недоступен).
pub fn parse_cell(page: &[u8], off: usize, page_type: PageType) -> Result<Cell> {
    if off >= page.len() {
        return Err(anyhow!("cell offset {} out of page ({} B)", off, page.len()));
    }

    match page_type {
        PageType::LeafTable => {
            let (payload_len, n0) = read_varint(&page[off..])?;
            let (rowid, n1) = read_varint_i64(&page[off + n0..])?;
            let payload = parse_payload(page, off + n0 + n1, payload_len, PageKind::Table)?;
            Ok(Cell::TableLeaf { rowid, payload })
        }
        PageType::InteriorTable => {
            let left_child = read_u32_at(page, off)?;
            let (rowid, _) = read_varint_i64(&page[off + 4..])?;
            Ok(Cell::TableInterior { left_child, rowid })
        }
        PageType::LeafIndex => {
            let (payload_len, n0) = read_varint(&page[off..])?;
            let payload = parse_payload(page, off + n0, payload_len, PageKind::Index)?;
            Ok(Cell::IndexLeaf { payload })
        }
        PageType::InteriorIndex => {
            let left_child = read_u32_at(page, off)?;
            let (payload_len, n0) = read_varint(&page[off + 4..])?;
            let payload = parse_payload(page, off + 4 + n0, payload_len, PageKind::Index)?;
            Ok(Cell::IndexInterior {
                left_child,
                payload,
            })
        }
    }
}
