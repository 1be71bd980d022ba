//! page/overflow — чтение overflow-цепочек.
//!
//! Каждая overflow-страница: [next_page u32 BE][payload ...], next=0 —
//! конец цепочки. Полезных байт на странице usable-4; последняя страница
//! заполнена частично.
//!
//! read_overflow_chain читает цепочку с head и возвращает ровно
//! expected_len байт. Длина проверяется строго (ошибка при несовпадении),
//! против петель — ограничение на число страниц, выводимое из expected_len.

use anyhow::{anyhow, Result};
use byteorder::{BigEndian, ByteOrder};

use crate::consts::OVERFLOW_NEXT_LEN;
use crate::db::Db;

/// Прочитать overflow-цепочку, начиная со страницы `head`.
pub fn read_overflow_chain(db: &Db, head: u32, expected_len: usize) -> Result<Vec<u8>> {
    let usable = db.header.usable_size() as usize;
    let per_page = usable - OVERFLOW_NEXT_LEN;

    // Страниц в корректной цепочке не больше ceil(expected/per_page);
    // +1 — запас на пустую голову при expected_len=0.
    let max_pages = expected_len / per_page + 2;

    let mut out = Vec::with_capacity(expected_len);
    let mut next = head;
    let mut pages = 0usize;

    while next != 0 {
        pages += 1;
        if pages > max_pages {
            return Err(anyhow!(
                "overflow chain too long or loop detected (head={}, expected {} B)",
                head,
                expected_len
            ));
        }

        let page = db.read_page(next)?;
        let nxt = BigEndian::read_u32(&page[..OVERFLOW_NEXT_LEN]);

        let remaining = expected_len - out.len();
        if remaining == 0 {
            return Err(anyhow!(
                "overflow chain longer than expected (page {} past {} B)",
                next,
                expected_len
            ));
        }
        let take = remaining.min(per_page);
        out.extend_from_slice(&page[OVERFLOW_NEXT_LEN..OVERFLOW_NEXT_LEN + take]);
        next = nxt;
    }

    if out.len() != expected_len {
        return Err(anyhow!(
            "overflow length mismatch: got {} B, expected {} B (head={})",
            out.len(),
            expected_len,
            head
        ));
    }
    Ok(out)
}
