//! Сборка минимальных файлов SQLite для интеграционных тестов.
//!
//! Страницы собираются руками: file header + leaf/interior table btree +
//! overflow-цепочки. Локальная часть вынесенных payload'ов считается той же
//! формулой, что и в библиотеке (litescope::split_payload), так что файлы
//! согласованы с читателем по построению.

use byteorder::{BigEndian, ByteOrder};
use std::fs;
use std::path::PathBuf;

use litescope::record::Value;
use litescope::spill::{split_payload, PageKind};

pub const DB_HEADER_SIZE: usize = 100;

/// Уникальный путь во временном каталоге.
pub fn unique_path(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("litescope-{}-{}-{}.db", prefix, pid, t))
}

/// BE varint формата SQLite.
pub fn write_varint(out: &mut Vec<u8>, v: u64) {
    if v > u64::MAX >> 8 {
        let mut buf = [0u8; 9];
        buf[8] = (v & 0xff) as u8;
        let mut rest = v >> 8;
        for i in (0..8).rev() {
            buf[i] = ((rest & 0x7f) as u8) | 0x80;
            rest >>= 7;
        }
        out.extend_from_slice(&buf);
        return;
    }
    let mut tmp = vec![(v & 0x7f) as u8];
    let mut rest = v >> 7;
    while rest > 0 {
        tmp.push(((rest & 0x7f) as u8) | 0x80);
        rest >>= 7;
    }
    tmp.reverse();
    out.extend_from_slice(&tmp);
}

fn varint_len(v: u64) -> usize {
    let mut tmp = Vec::new();
    write_varint(&mut tmp, v);
    tmp.len()
}

fn int_serial(v: i64) -> (u64, Vec<u8>) {
    let bytes = v.to_be_bytes();
    if (i8::MIN as i64..=i8::MAX as i64).contains(&v) {
        (1, bytes[7..].to_vec())
    } else if (i16::MIN as i64..=i16::MAX as i64).contains(&v) {
        (2, bytes[6..].to_vec())
    } else if (-(1i64 << 23)..(1i64 << 23)).contains(&v) {
        (3, bytes[5..].to_vec())
    } else if (i32::MIN as i64..=i32::MAX as i64).contains(&v) {
        (4, bytes[4..].to_vec())
    } else if (-(1i64 << 47)..(1i64 << 47)).contains(&v) {
        (5, bytes[2..].to_vec())
    } else {
        (6, bytes.to_vec())
    }
}

/// Запись в формате record: header (serial types) + body.
pub fn encode_record(values: &[Value]) -> Vec<u8> {
    let mut serials = Vec::new();
    let mut body = Vec::new();
    for v in values {
        match v {
            Value::Null => serials.push(0u64),
            Value::Int(n) => {
                let (st, b) = int_serial(*n);
                serials.push(st);
                body.extend_from_slice(&b);
            }
            Value::Real(r) => {
                serials.push(7);
                body.extend_from_slice(&r.to_bits().to_be_bytes());
            }
            Value::Text(s) => {
                serials.push(13 + 2 * s.len() as u64);
                body.extend_from_slice(s.as_bytes());
            }
            Value::Blob(b) => {
                serials.push(12 + 2 * b.len() as u64);
                body.extend_from_slice(b);
            }
        }
    }

    let serial_bytes: usize = serials.iter().map(|&s| varint_len(s)).sum();
    // header_len включает собственный varint; для растущей длины — вторая итерация.
    let mut hdr_len = serial_bytes + 1;
    if varint_len(hdr_len as u64) > 1 {
        hdr_len = serial_bytes + varint_len((serial_bytes + 2) as u64);
    }

    let mut out = Vec::with_capacity(hdr_len + body.len());
    write_varint(&mut out, hdr_len as u64);
    for &s in &serials {
        write_varint(&mut out, s);
    }
    out.extend_from_slice(&body);
    out
}

/// Пошаговая сборка файла.
pub struct FileBuilder {
    page_size: u32,
    pages: Vec<Vec<u8>>,
}

impl FileBuilder {
    pub fn new(page_size: u32) -> Self {
        FileBuilder {
            page_size,
            pages: vec![vec![0u8; page_size as usize]], // страница 1
        }
    }

    pub fn usable(&self) -> u64 {
        self.page_size as u64 // reserved = 0 в тестовых файлах
    }

    /// Выделить пустую страницу, вернуть её номер.
    pub fn alloc_page(&mut self) -> u32 {
        self.pages.push(vec![0u8; self.page_size as usize]);
        self.pages.len() as u32
    }

    fn page_mut(&mut self, pageno: u32) -> &mut Vec<u8> {
        &mut self.pages[pageno as usize - 1]
    }

    /// Ячейка table leaf: при необходимости payload выносится в
    /// overflow-цепочку (страницы выделяются тут же).
    pub fn table_leaf_cell(&mut self, rowid: i64, record: &[u8]) -> Vec<u8> {
        let placement = split_payload(self.usable(), record.len() as u64, PageKind::Table)
            .expect("usable size is valid in tests");
        let local_len = placement.local() as usize;

        let mut cell = Vec::new();
        write_varint(&mut cell, record.len() as u64);
        write_varint(&mut cell, rowid as u64);
        cell.extend_from_slice(&record[..local_len]);

        if local_len < record.len() {
            let head = self.write_overflow_chain(&record[local_len..]);
            let mut be = [0u8; 4];
            BigEndian::write_u32(&mut be, head);
            cell.extend_from_slice(&be);
        }
        cell
    }

    fn write_overflow_chain(&mut self, mut rest: &[u8]) -> u32 {
        let per_page = self.page_size as usize - 4;
        let head = self.alloc_page();
        let mut cur = head;
        loop {
            let take = rest.len().min(per_page);
            let (chunk, tail) = rest.split_at(take);
            rest = tail;

            let next = if rest.is_empty() { 0 } else { self.alloc_page() };
            let page = self.page_mut(cur);
            BigEndian::write_u32(&mut page[..4], next);
            page[4..4 + chunk.len()].copy_from_slice(chunk);

            if next == 0 {
                return head;
            }
            cur = next;
        }
    }

    /// Записать leaf table страницу: ячейки пакуются от конца страницы,
    /// указатели — в порядке следования `cells`.
    pub fn write_leaf_table(&mut self, pageno: u32, cells: &[Vec<u8>]) {
        let base = if pageno == 1 { DB_HEADER_SIZE } else { 0 };
        let ps = self.page_size as usize;

        let mut content = ps;
        let mut ptrs = Vec::with_capacity(cells.len());
        {
            let page = self.page_mut(pageno);
            for cell in cells {
                content -= cell.len();
                page[content..content + cell.len()].copy_from_slice(cell);
                ptrs.push(content as u16);
            }

            page[base] = 0x0d; // leaf table
            BigEndian::write_u16(&mut page[base + 3..base + 5], cells.len() as u16);
            BigEndian::write_u16(&mut page[base + 5..base + 7], content as u16);
            for (i, &p) in ptrs.iter().enumerate() {
                BigEndian::write_u16(&mut page[base + 8 + i * 2..base + 10 + i * 2], p);
            }
        }
        assert!(
            base + 8 + cells.len() * 2 <= content,
            "leaf page {} overflows: pointers up to {}, content from {}",
            pageno,
            base + 8 + cells.len() * 2,
            content
        );
    }

    /// Interior table страница: (left_child, max_rowid) + right-most.
    pub fn write_interior_table(&mut self, pageno: u32, children: &[(u32, i64)], right_most: u32) {
        let ps = self.page_size as usize;
        let mut content = ps;
        let mut ptrs = Vec::with_capacity(children.len());
        let page = self.page_mut(pageno);

        for &(child, key) in children {
            let mut cell = Vec::new();
            let mut be = [0u8; 4];
            BigEndian::write_u32(&mut be, child);
            cell.extend_from_slice(&be);
            write_varint(&mut cell, key as u64);

            content -= cell.len();
            page[content..content + cell.len()].copy_from_slice(&cell);
            ptrs.push(content as u16);
        }

        page[0] = 0x05; // interior table
        BigEndian::write_u16(&mut page[3..5], children.len() as u16);
        BigEndian::write_u16(&mut page[5..7], content as u16);
        BigEndian::write_u32(&mut page[8..12], right_most);
        for (i, &p) in ptrs.iter().enumerate() {
            BigEndian::write_u16(&mut page[12 + i * 2..14 + i * 2], p);
        }
    }

    /// Дописать file header на страницу 1 и сохранить файл.
    pub fn finish(mut self, path: &PathBuf) {
        let page_count = self.pages.len() as u32;
        let ps = self.page_size;
        let page1 = self.page_mut(1);

        page1[..16].copy_from_slice(b"SQLite format 3\0");
        let raw: u16 = if ps == 65536 { 1 } else { ps as u16 };
        BigEndian::write_u16(&mut page1[16..18], raw);
        page1[18] = 1; // write version (legacy)
        page1[19] = 1; // read version
        page1[20] = 0; // reserved per page
        BigEndian::write_u32(&mut page1[24..28], 1); // change counter
        BigEndian::write_u32(&mut page1[28..32], page_count);
        BigEndian::write_u32(&mut page1[40..44], 1); // schema cookie
        BigEndian::write_u32(&mut page1[44..48], 4); // schema format
        BigEndian::write_u32(&mut page1[56..60], 1); // utf-8

        let mut out = Vec::with_capacity(self.pages.len() * ps as usize);
        for p in &self.pages {
            out.extend_from_slice(p);
        }
        fs::write(path, out).expect("write test db file");
    }
}

/// Строка sqlite_schema для таблицы.
pub fn schema_row(name: &str, rootpage: u32, sql: &str) -> Vec<Value> {
    vec![
        Value::Text("table".into()),
        Value::Text(name.into()),
        Value::Text(name.into()),
        Value::Int(rootpage as i64),
        Value::Text(sql.into()),
    ]
}
