//! header — разбор 100-байтового file header SQLite.
//!
//! Формат (BE):
//! - magic16 = "SQLite format 3\0"
//! - u16 page_size       (степень двойки 512..=32768; значение 1 => 65536)
//! - u8  write_version / u8 read_version
//! - u8  reserved_per_page (usable = page_size - reserved, не меньше 480)
//! - u32 change_counter (offset 24)
//! - u32 page_count     (offset 28)
//! - u32 freelist_head / u32 freelist_count (offset 32/36)
//! - u32 schema_cookie  (offset 40)
//! - u32 text_encoding  (offset 56: 1=utf8, 2=utf16le, 3=utf16be)
//!
//! Читаем только то, что нужно инспектору; остальные поля header
//! не интерпретируются.

use anyhow::{anyhow, Context, Result};
use byteorder::{BigEndian, ByteOrder};
use std::fs::File;
use std::path::Path;

use crate::consts::{
    DB_HEADER_SIZE, ENCODING_UTF16BE, ENCODING_UTF16LE, ENCODING_UTF8, HEADER_MAGIC,
    MAX_PAGE_SIZE, MIN_PAGE_SIZE, MIN_USABLE_SIZE, OFF_CHANGE_COUNTER, OFF_FREELIST_COUNT,
    OFF_FREELIST_HEAD, OFF_PAGE_COUNT, OFF_PAGE_SIZE, OFF_RESERVED_PER_PAGE, OFF_SCHEMA_COOKIE,
    OFF_TEXT_ENCODING,
};

/// Заголовок файла БД.
#[derive(Debug, Clone)]
pub struct DbHeader {
    pub page_size: u32, // 512..=65536, степень двойки
    pub reserved_per_page: u8,
    pub change_counter: u32,
    pub page_count: u32,
    pub freelist_head: u32,
    pub freelist_pages: u32,
    pub schema_cookie: u32,
    pub text_encoding: u32,
}

impl DbHeader {
    /// Usable size страницы: page_size минус зарезервированный хвост.
    #[inline]
    pub fn usable_size(&self) -> u32 {
        self.page_size - self.reserved_per_page as u32
    }

    /// Имя кодировки текста для вывода.
    pub fn encoding_name(&self) -> &'static str {
        match self.text_encoding {
            ENCODING_UTF8 => "utf-8",
            ENCODING_UTF16LE => "utf-16le",
            ENCODING_UTF16BE => "utf-16be",
            _ => "unknown",
        }
    }
}

/// Проверка корректности размера страницы (2^n, 512 .. 64 KiB).
pub fn validate_page_size(page_size: u32) -> Result<()> {
    if page_size < MIN_PAGE_SIZE
        || page_size > MAX_PAGE_SIZE
        || (page_size & (page_size - 1)) != 0
    {
        return Err(anyhow!(
            "page_size must be a power of two in [{} .. {}], got {}",
            MIN_PAGE_SIZE,
            MAX_PAGE_SIZE,
            page_size
        ));
    }
    Ok(())
}

/// Разобрать file header из буфера (минимум 100 байт).
pub fn parse_db_header(buf: &[u8]) -> Result<DbHeader> {
    if buf.len() < DB_HEADER_SIZE {
        return Err(anyhow!(
            "file too short for db header: {} byte(s), need {}",
            buf.len(),
            DB_HEADER_SIZE
        ));
    }
    if &buf[..HEADER_MAGIC.len()] != HEADER_MAGIC {
        return Err(anyhow!("bad file magic (not a SQLite database)"));
    }

    let raw = BigEndian::read_u16(&buf[OFF_PAGE_SIZE..OFF_PAGE_SIZE + 2]);
    let page_size = if raw == 1 { MAX_PAGE_SIZE } else { raw as u32 };
    validate_page_size(page_size)?;

    let reserved_per_page = buf[OFF_RESERVED_PER_PAGE];
    let usable = page_size - reserved_per_page as u32;
    if usable < MIN_USABLE_SIZE {
        return Err(anyhow!(
            "usable page size {} below minimum {} (page_size={}, reserved={})",
            usable,
            MIN_USABLE_SIZE,
            page_size,
            reserved_per_page
        ));
    }

    Ok(DbHeader {
        page_size,
        reserved_per_page,
        change_counter: BigEndian::read_u32(&buf[OFF_CHANGE_COUNTER..OFF_CHANGE_COUNTER + 4]),
        page_count: BigEndian::read_u32(&buf[OFF_PAGE_COUNT..OFF_PAGE_COUNT + 4]),
        freelist_head: BigEndian::read_u32(&buf[OFF_FREELIST_HEAD..OFF_FREELIST_HEAD + 4]),
        freelist_pages: BigEndian::read_u32(&buf[OFF_FREELIST_COUNT..OFF_FREELIST_COUNT + 4]),
        schema_cookie: BigEndian::read_u32(&buf[OFF_SCHEMA_COOKIE..OFF_SCHEMA_COOKIE + 4]),
        text_encoding: BigEndian::read_u32(&buf[OFF_TEXT_ENCODING..OFF_TEXT_ENCODING + 4]),
    })
}

/// Прочитать file header с начала файла.
pub fn read_db_header(f: &File) -> Result<DbHeader> {
    let mut buf = [0u8; DB_HEADER_SIZE];
    crate::db::read_at(f, &mut buf, 0).context("read db header")?;
    parse_db_header(&buf)
}

/// То же по пути (для команд, которым не нужен полный Db).
pub fn read_db_header_at(path: &Path) -> Result<DbHeader> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_db_header(&f)
}
