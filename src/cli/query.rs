//! cli/query — выполнение SELECT-подмножества.

use anyhow::Result;
use std::path::PathBuf;

use crate::db::Db;
use crate::sql::{execute_select, parse_select};

pub fn cmd_query(path: PathBuf, sql: String, json: bool) -> Result<()> {
    let stmt = parse_select(&sql)?;
    let db = Db::open(&path)?;
    let rows = execute_select(&db, &stmt)?;

    if json {
        println!("{}", serde_json::to_string(&rows)?);
        return Ok(());
    }
    for row in rows {
        println!("{}", row.join("|"));
    }
    Ok(())
}
