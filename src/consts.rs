//! Общие константы формата SQLite (file header, btree-страницы, serial types).
//!
//! Все многобайтовые числа в файле — big-endian.

// -------- File header (первые 100 байт файла) --------
pub const HEADER_MAGIC: &[u8; 16] = b"SQLite format 3\0";
pub const DB_HEADER_SIZE: usize = 100;

// Offsets внутри file header:
pub const OFF_PAGE_SIZE: usize = 16; // u16; значение 1 означает 65536
pub const OFF_WRITE_VERSION: usize = 18; // u8
pub const OFF_READ_VERSION: usize = 19; // u8
pub const OFF_RESERVED_PER_PAGE: usize = 20; // u8; usable = page_size - reserved
pub const OFF_CHANGE_COUNTER: usize = 24; // u32
pub const OFF_PAGE_COUNT: usize = 28; // u32
pub const OFF_FREELIST_HEAD: usize = 32; // u32
pub const OFF_FREELIST_COUNT: usize = 36; // u32
pub const OFF_SCHEMA_COOKIE: usize = 40; // u32
pub const OFF_TEXT_ENCODING: usize = 56; // u32: 1=utf8, 2=utf16le, 3=utf16be

pub const ENCODING_UTF8: u32 = 1;
pub const ENCODING_UTF16LE: u32 = 2;
pub const ENCODING_UTF16BE: u32 = 3;

// Допустимый размер страницы: степень двойки в [512 .. 65536].
pub const MIN_PAGE_SIZE: u32 = 512;
pub const MAX_PAGE_SIZE: u32 = 65536;

// Минимальный usable size (page_size - reserved), при котором формат валиден.
pub const MIN_USABLE_SIZE: u32 = 480;

// -------- Btree pages --------
// Байт типа страницы (offset 0 заголовка страницы; на странице 1 заголовок
// начинается с offset 100, сразу после file header).
pub const PAGE_TYPE_INTERIOR_INDEX: u8 = 0x02;
pub const PAGE_TYPE_INTERIOR_TABLE: u8 = 0x05;
pub const PAGE_TYPE_LEAF_INDEX: u8 = 0x0a;
pub const PAGE_TYPE_LEAF_TABLE: u8 = 0x0d;

// Размер заголовка btree-страницы: 8 байт для leaf, 12 для interior
// (добавляется right-most pointer u32).
pub const BTREE_HDR_LEAF: usize = 8;
pub const BTREE_HDR_INTERIOR: usize = 12;

// Offsets внутри заголовка btree-страницы:
pub const BT_OFF_TYPE: usize = 0; // u8
pub const BT_OFF_FIRST_FREEBLOCK: usize = 1; // u16
pub const BT_OFF_CELL_COUNT: usize = 3; // u16
pub const BT_OFF_CONTENT_START: usize = 5; // u16; значение 0 означает 65536
pub const BT_OFF_FRAG_BYTES: usize = 7; // u8
pub const BT_OFF_RIGHT_MOST: usize = 8; // u32, только interior

// Страница 1 несёт btree-заголовок после file header.
pub const PAGE1_HDR_BASE: usize = DB_HEADER_SIZE;

// -------- Overflow pages --------
// Каждая overflow-страница: [next_page u32][payload ...], next=0 — конец цепочки.
pub const OVERFLOW_NEXT_LEN: usize = 4;

// -------- Varints --------
pub const MAX_VARINT_LEN: usize = 9;
