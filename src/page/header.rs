//! page/header — заголовок btree-страницы и массив cell pointers.
//!
//! Заголовок лежит с offset 0 страницы (на странице 1 — с offset 100,
//! после file header): [type u8][first_freeblock u16][cell_count u16]
//! [content_start u16; 0 => 65536][frag_bytes u8][right_most u32 — только
//! у interior]. Далее cell_count указателей u16 (offset от начала страницы).

use anyhow::{anyhow, Result};
use byteorder::{BigEndian, ByteOrder};

use crate::consts::{
    BTREE_HDR_INTERIOR, BTREE_HDR_LEAF, BT_OFF_CELL_COUNT, BT_OFF_CONTENT_START,
    BT_OFF_FIRST_FREEBLOCK, BT_OFF_FRAG_BYTES, BT_OFF_RIGHT_MOST, BT_OFF_TYPE,
    PAGE_TYPE_INTERIOR_INDEX, PAGE_TYPE_INTERIOR_TABLE, PAGE_TYPE_LEAF_INDEX,
    PAGE_TYPE_LEAF_TABLE,
};
use crate::spill::PageKind;

/// Тип btree-страницы.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    InteriorIndex,
    InteriorTable,
    LeafIndex,
    LeafTable,
}

impl PageType {
    pub fn from_byte(b: u8) -> Result<Self> {
        Ok(match b {
            PAGE_TYPE_INTERIOR_INDEX => PageType::InteriorIndex,
            PAGE_TYPE_INTERIOR_TABLE => PageType::InteriorTable,
            PAGE_TYPE_LEAF_INDEX => PageType::LeafIndex,
            PAGE_TYPE_LEAF_TABLE => PageType::LeafTable,
            other => return Err(anyhow!("unknown btree page type 0x{:02x}", other)),
        })
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        matches!(self, PageType::LeafIndex | PageType::LeafTable)
    }

    #[inline]
    pub fn is_table(self) -> bool {
        matches!(self, PageType::InteriorTable | PageType::LeafTable)
    }

    /// Размер заголовка страницы этого типа.
    #[inline]
    pub fn header_len(self) -> usize {
        if self.is_leaf() {
            BTREE_HDR_LEAF
        } else {
            BTREE_HDR_INTERIOR
        }
    }

    /// Вид страницы для порога spill. У table interior ячеек payload нет.
    pub fn spill_kind(self) -> Option<PageKind> {
        match self {
            PageType::LeafTable => Some(PageKind::Table),
            PageType::LeafIndex | PageType::InteriorIndex => Some(PageKind::Index),
            PageType::InteriorTable => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PageType::InteriorIndex => "interior index",
            PageType::InteriorTable => "interior table",
            PageType::LeafIndex => "leaf index",
            PageType::LeafTable => "leaf table",
        }
    }
}

/// Разобранный заголовок btree-страницы.
#[derive(Debug, Clone)]
pub struct BtreeHeader {
    pub page_type: PageType,
    pub first_freeblock: u16,
    pub cell_count: u16,
    pub content_start: u32, // 0 в файле => 65536
    pub frag_free_bytes: u8,
    pub right_most: Option<u32>, // только interior
}

/// Разобрать заголовок страницы. `base` — offset заголовка внутри буфера
/// страницы: 100 для страницы 1, иначе 0.
pub fn parse_btree_header(page: &[u8], base: usize) -> Result<BtreeHeader> {
    if base + BTREE_HDR_LEAF > page.len() {
        return Err(anyhow!("page too small for btree header"));
    }
    let page_type = PageType::from_byte(page[base + BT_OFF_TYPE])?;
    if !page_type.is_leaf() && base + BTREE_HDR_INTERIOR > page.len() {
        return Err(anyhow!("page too small for interior btree header"));
    }

    let raw_start =
        BigEndian::read_u16(&page[base + BT_OFF_CONTENT_START..base + BT_OFF_CONTENT_START + 2]);
    let content_start = if raw_start == 0 { 65536 } else { raw_start as u32 };

    let right_most = if page_type.is_leaf() {
        None
    } else {
        Some(BigEndian::read_u32(
            &page[base + BT_OFF_RIGHT_MOST..base + BT_OFF_RIGHT_MOST + 4],
        ))
    };

    Ok(BtreeHeader {
        page_type,
        first_freeblock: BigEndian::read_u16(
            &page[base + BT_OFF_FIRST_FREEBLOCK..base + BT_OFF_FIRST_FREEBLOCK + 2],
        ),
        cell_count: BigEndian::read_u16(
            &page[base + BT_OFF_CELL_COUNT..base + BT_OFF_CELL_COUNT + 2],
        ),
        content_start,
        frag_free_bytes: page[base + BT_OFF_FRAG_BYTES],
        right_most,
    })
}

/// Прочитать массив cell pointers (offsets от начала страницы).
pub fn read_cell_pointers(page: &[u8], base: usize, hdr: &BtreeHeader) -> Result<Vec<u16>> {
    let start = base + hdr.page_type.header_len();
    let end = start + hdr.cell_count as usize * 2;
    if end > page.len() {
        return Err(anyhow!(
            "cell pointer array out of page bounds ({} cells at offset {})",
            hdr.cell_count,
            start
        ));
    }
    let mut ptrs = Vec::with_capacity(hdr.cell_count as usize);
    for i in 0..hdr.cell_count as usize {
        ptrs.push(BigEndian::read_u16(&page[start + i * 2..start + i * 2 + 2]));
    }
    Ok(ptrs)
}
