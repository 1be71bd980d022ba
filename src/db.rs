//! db — read-only хэндл файла БД.
//!
//! Db::open читает file header и схему (обход table btree на странице 1).
//! Дальше — постраничное чтение, обход table btree с сборкой payload'ов
//! (локальная часть + overflow-цепочка) и быстрый подсчёт строк по
//! cell_count листьев.

use anyhow::{anyhow, Context, Result};
use log::debug;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::consts::PAGE1_HDR_BASE;
use crate::header::{read_db_header, DbHeader};
use crate::page::{
    parse_btree_header, parse_cell, read_cell_pointers, read_overflow_chain, Cell, PageType,
    Payload,
};
use crate::record::{decode_record, Value};
use crate::schema::{entry_from_record, ObjectKind, SchemaEntry};

// Защита от порчи: table btree глубже этого — заведомо некорректный файл.
const MAX_BTREE_DEPTH: usize = 64;

#[cfg(unix)]
pub(crate) fn read_at(f: &File, buf: &mut [u8], off: u64) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    f.read_exact_at(buf, off)
}
#[cfg(not(unix))]
pub(crate) fn read_at(f: &File, buf: &mut [u8], off: u64) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;
    let mut done = 0usize;
    while done < buf.len() {
        let n = f.seek_read(&mut buf[done..], off + done as u64)?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "short read",
            ));
        }
        done += n;
    }
    Ok(())
}

/// Открытый на чтение файл БД.
pub struct Db {
    file: File,
    pub path: PathBuf,
    pub header: DbHeader,
    pub schema: Vec<SchemaEntry>,
}

impl Db {
    /// Открыть файл, прочитать header и схему.
    pub fn open(path: &Path) -> Result<Db> {
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .with_context(|| format!("open {}", path.display()))?;
        let header = read_db_header(&file)
            .with_context(|| format!("parse db header of {}", path.display()))?;

        let mut db = Db {
            file,
            path: path.to_path_buf(),
            header,
            schema: Vec::new(),
        };
        db.schema = db.load_schema()?;
        debug!(
            "opened {} (page_size={}, usable={}, pages={}, schema objects={})",
            path.display(),
            db.header.page_size,
            db.header.usable_size(),
            db.header.page_count,
            db.schema.len()
        );
        Ok(db)
    }

    /// Offset страницы в файле (нумерация с 1).
    pub fn page_offset(&self, pageno: u32) -> Result<u64> {
        if pageno == 0 {
            return Err(anyhow!("page numbers start at 1"));
        }
        if self.header.page_count != 0 && pageno > self.header.page_count {
            return Err(anyhow!(
                "page {} out of range (db has {} page(s))",
                pageno,
                self.header.page_count
            ));
        }
        Ok((pageno as u64 - 1) * self.header.page_size as u64)
    }

    /// Прочитать страницу целиком (page_size байт).
    pub fn read_page(&self, pageno: u32) -> Result<Vec<u8>> {
        let off = self.page_offset(pageno)?;
        let mut buf = vec![0u8; self.header.page_size as usize];
        read_at(&self.file, &mut buf, off)
            .with_context(|| format!("read page {} at offset {}", pageno, off))?;
        Ok(buf)
    }

    /// Полный payload ячейки: локальная часть + overflow-цепочка.
    pub fn full_payload(&self, payload: &Payload) -> Result<Vec<u8>> {
        match payload.first_overflow {
            None => Ok(payload.local.clone()),
            Some(head) => {
                let mut out = payload.local.clone();
                let tail = read_overflow_chain(self, head, payload.spilled() as usize)?;
                out.extend_from_slice(&tail);
                Ok(out)
            }
        }
    }

    /// Обойти table btree с корнем `root`, вызывая visitor на каждой строке
    /// в порядке rowid.
    pub fn walk_table<F>(&self, root: u32, visitor: &mut F) -> Result<()>
    where
        F: FnMut(i64, Vec<Value>) -> Result<()>,
    {
        self.walk_table_page(root, 0, visitor)
    }

    fn walk_table_page<F>(&self, pageno: u32, depth: usize, visitor: &mut F) -> Result<()>
    where
        F: FnMut(i64, Vec<Value>) -> Result<()>,
    {
        if depth > MAX_BTREE_DEPTH {
            return Err(anyhow!("btree deeper than {} levels (corrupt file?)", MAX_BTREE_DEPTH));
        }

        let page = self.read_page(pageno)?;
        let usable = &page[..self.header.usable_size() as usize];
        let base = if pageno == 1 { PAGE1_HDR_BASE } else { 0 };
        let hdr = parse_btree_header(usable, base)
            .with_context(|| format!("btree header of page {}", pageno))?;
        if !hdr.page_type.is_table() {
            return Err(anyhow!(
                "page {} is a {} page, expected table btree",
                pageno,
                hdr.page_type.name()
            ));
        }

        let ptrs = read_cell_pointers(usable, base, &hdr)?;
        match hdr.page_type {
            PageType::LeafTable => {
                for &ptr in &ptrs {
                    let cell = parse_cell(usable, ptr as usize, hdr.page_type)
                        .with_context(|| format!("cell at {} on page {}", ptr, pageno))?;
                    if let Cell::TableLeaf { rowid, payload } = cell {
                        let body = self.full_payload(&payload)?;
                        let values = decode_record(&body)
                            .with_context(|| format!("record of rowid {} on page {}", rowid, pageno))?;
                        visitor(rowid, values)?;
                    }
                }
            }
            _ => {
                for &ptr in &ptrs {
                    let cell = parse_cell(usable, ptr as usize, hdr.page_type)?;
                    if let Some(child) = cell.left_child() {
                        self.walk_table_page(child, depth + 1, visitor)?;
                    }
                }
                // right-most pointer обходится последним.
                let right = hdr
                    .right_most
                    .ok_or_else(|| anyhow!("interior page {} without right-most pointer", pageno))?;
                self.walk_table_page(right, depth + 1, visitor)?;
            }
        }
        Ok(())
    }

    /// Число строк в table btree: сумма cell_count по листьям,
    /// без разбора ячеек.
    pub fn count_rows(&self, root: u32) -> Result<u64> {
        self.count_rows_page(root, 0)
    }

    fn count_rows_page(&self, pageno: u32, depth: usize) -> Result<u64> {
        if depth > MAX_BTREE_DEPTH {
            return Err(anyhow!("btree deeper than {} levels (corrupt file?)", MAX_BTREE_DEPTH));
        }
        let page = self.read_page(pageno)?;
        let usable = &page[..self.header.usable_size() as usize];
        let base = if pageno == 1 { PAGE1_HDR_BASE } else { 0 };
        let hdr = parse_btree_header(usable, base)?;

        match hdr.page_type {
            PageType::LeafTable => Ok(hdr.cell_count as u64),
            PageType::InteriorTable => {
                let mut total = 0u64;
                for &ptr in &read_cell_pointers(usable, base, &hdr)? {
                    let cell = parse_cell(usable, ptr as usize, hdr.page_type)?;
                    if let Some(child) = cell.left_child() {
                        total += self.count_rows_page(child, depth + 1)?;
                    }
                }
                let right = hdr
                    .right_most
                    .ok_or_else(|| anyhow!("interior page {} without right-most pointer", pageno))?;
                total += self.count_rows_page(right, depth + 1)?;
                Ok(total)
            }
            other => Err(anyhow!(
                "page {} is a {} page, expected table btree",
                pageno,
                other.name()
            )),
        }
    }

    // ---- Схема ----

    fn load_schema(&self) -> Result<Vec<SchemaEntry>> {
        let mut entries = Vec::new();
        self.walk_table(1, &mut |_rowid, values| {
            entries.push(entry_from_record(&values)?);
            Ok(())
        })
        .context("walk sqlite_schema")?;
        Ok(entries)
    }

    /// Таблицы пользователя (без sqlite_*), в порядке схемы.
    pub fn user_tables(&self) -> Vec<&SchemaEntry> {
        self.schema
            .iter()
            .filter(|e| e.kind == ObjectKind::Table && !e.is_internal())
            .collect()
    }

    pub fn table_count(&self) -> usize {
        self.schema
            .iter()
            .filter(|e| e.kind == ObjectKind::Table)
            .count()
    }

    /// Найти таблицу по имени (без учёта регистра, как в SQL).
    pub fn find_table(&self, name: &str) -> Result<&SchemaEntry> {
        self.schema
            .iter()
            .find(|e| e.kind == ObjectKind::Table && e.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("no such table: {}", name))
    }
}
