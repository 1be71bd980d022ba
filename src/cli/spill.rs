//! cli/spill — классификация payload'а: сколько байт остаётся на странице,
//! сколько уходит в overflow.

use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::header::{read_db_header_at, validate_page_size};
use crate::spill::{max_inline, min_inline, split_payload, PageKind, Placement};

pub fn cmd_spill(
    payload: u64,
    path: Option<PathBuf>,
    page_size: Option<u32>,
    reserved: u8,
    index: bool,
    json: bool,
) -> Result<()> {
    let usable = match path {
        Some(ref p) => read_db_header_at(p)?.usable_size() as u64,
        None => {
            let ps = page_size.unwrap_or(4096);
            validate_page_size(ps)?;
            let ps = ps as u64;
            let reserved = reserved as u64;
            if reserved >= ps {
                return Err(anyhow!("reserved {} leaves no usable space", reserved));
            }
            ps - reserved
        }
    };

    let kind = if index { PageKind::Index } else { PageKind::Table };
    let placement = split_payload(usable, payload, kind)?;

    if json {
        let regime = match placement {
            Placement::Inline { .. } => "inline",
            Placement::SpillTail { .. } => "spill-tail",
            Placement::SpillMin { .. } => "spill-min",
        };
        let obj = serde_json::json!({
            "usable_size": usable,
            "payload": payload,
            "page_kind": if index { "index" } else { "table" },
            "max_inline": max_inline(usable, kind)?,
            "min_inline": min_inline(usable)?,
            "regime": regime,
            "local_bytes": placement.local(),
            "overflow_bytes": placement.overflow(),
        });
        println!("{}", serde_json::to_string(&obj)?);
        return Ok(());
    }

    match placement {
        Placement::Inline { local } => {
            println!(
                "All {} payload byte(s) are stored directly on the btree page without overflow.",
                local
            );
        }
        Placement::SpillTail { local, overflow } | Placement::SpillMin { local, overflow } => {
            println!(
                "The first {} byte(s) of the payload are stored on the btree page and the remaining {} byte(s) are stored on overflow pages.",
                local, overflow
            );
        }
    }
    Ok(())
}
