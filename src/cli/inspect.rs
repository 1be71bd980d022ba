//! cli/inspect — info/tables/schema/page.

use anyhow::Result;
use std::path::PathBuf;

use crate::consts::PAGE1_HDR_BASE;
use crate::db::Db;
use crate::page::parse_btree_header;
use crate::util::hex_dump;

pub fn cmd_info(path: PathBuf, json: bool) -> Result<()> {
    let db = Db::open(&path)?;
    let h = &db.header;

    if json {
        let obj = serde_json::json!({
            "path": path.display().to_string(),
            "page_size": h.page_size,
            "reserved_per_page": h.reserved_per_page,
            "usable_size": h.usable_size(),
            "page_count": h.page_count,
            "freelist_pages": h.freelist_pages,
            "schema_cookie": h.schema_cookie,
            "text_encoding": h.encoding_name(),
            "table_count": db.table_count(),
        });
        println!("{}", serde_json::to_string(&obj)?);
        return Ok(());
    }

    println!("database page size: {}", h.page_size);
    println!("usable page size:   {}", h.usable_size());
    println!("page count:         {}", h.page_count);
    println!("freelist pages:     {}", h.freelist_pages);
    println!("text encoding:      {}", h.encoding_name());
    println!("number of tables:   {}", db.table_count());
    Ok(())
}

pub fn cmd_tables(path: PathBuf) -> Result<()> {
    let db = Db::open(&path)?;
    let names: Vec<&str> = db.user_tables().iter().map(|t| t.name.as_str()).collect();
    println!("{}", names.join(" "));
    Ok(())
}

pub fn cmd_schema(path: PathBuf, table: Option<String>, json: bool) -> Result<()> {
    let db = Db::open(&path)?;

    let entries: Vec<_> = match &table {
        Some(name) => vec![db.find_table(name)?],
        None => db.schema.iter().collect(),
    };

    if json {
        println!("{}", serde_json::to_string(&entries)?);
        return Ok(());
    }

    for e in entries {
        if e.sql.is_empty() {
            println!("-- {} {} (rootpage {})", e.kind.name(), e.name, e.rootpage);
        } else {
            println!("{};", e.sql);
        }
    }
    Ok(())
}

pub fn cmd_page(path: PathBuf, page_id: u32, len: usize) -> Result<()> {
    let db = Db::open(&path)?;
    let page = db.read_page(page_id)?;
    let base = if page_id == 1 { PAGE1_HDR_BASE } else { 0 };

    match parse_btree_header(&page[..db.header.usable_size() as usize], base) {
        Ok(hdr) => {
            println!("page {} ({})", page_id, hdr.page_type.name());
            println!("  cell_count      = {}", hdr.cell_count);
            println!("  content_start   = {}", hdr.content_start);
            println!("  first_freeblock = {}", hdr.first_freeblock);
            println!("  frag_free_bytes = {}", hdr.frag_free_bytes);
            if let Some(rm) = hdr.right_most {
                println!("  right_most      = {}", rm);
            }
        }
        // Не btree-страница (overflow/freelist) — печатаем только дамп.
        Err(e) => println!("page {} (no btree header: {})", page_id, e),
    }

    let take = len.min(page.len().saturating_sub(base));
    if take > 0 {
        println!("{}", hex_dump(&page[base..base + take]));
    }
    Ok(())
}
