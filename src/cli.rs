//! cli — команды бинаря litescope.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod inspect;
pub mod query;
pub mod spill;

#[derive(Parser, Debug)]
#[command(
    name = "litescope",
    version,
    about = "Read-only SQLite file inspector",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print db header summary (page size, page count, tables)
    Info {
        #[arg(long)]
        path: PathBuf,
        /// JSON output (single object)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List user table names on one line
    Tables {
        #[arg(long)]
        path: PathBuf,
    },
    /// Print schema objects (CREATE sql)
    Schema {
        #[arg(long)]
        path: PathBuf,
        /// Only this table
        #[arg(long)]
        table: Option<String>,
        /// JSON output (array of schema objects)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Dump a btree page header plus a bounded hex dump
    Page {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        page_id: u32,
        /// Bytes of page content to hex-dump
        #[arg(long, default_value_t = 64)]
        len: usize,
    },
    /// Classify a payload: local bytes vs overflow bytes
    ///
    /// Usable size берётся из файла (--path) или задаётся напрямую
    /// (--page-size, по умолчанию 4096).
    Spill {
        /// Payload length in bytes
        #[arg(long)]
        payload: u64,
        /// Take usable size from this db file
        #[arg(long, conflicts_with = "page_size")]
        path: Option<PathBuf>,
        /// Page size to compute against (without a file)
        #[arg(long)]
        page_size: Option<u32>,
        /// Reserved bytes per page (subtracted from page size)
        #[arg(long, default_value_t = 0, conflicts_with = "path")]
        reserved: u8,
        /// Compute for index pages instead of table leaf pages
        #[arg(long, default_value_t = false)]
        index: bool,
        /// JSON output (single object)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run a SELECT from the supported subset
    Query {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        sql: String,
        /// JSON output (array of rows)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Info { path, json } => inspect::cmd_info(path, json),
        Cmd::Tables { path } => inspect::cmd_tables(path),
        Cmd::Schema { path, table, json } => inspect::cmd_schema(path, table, json),
        Cmd::Page { path, page_id, len } => inspect::cmd_page(path, page_id, len),
        Cmd::Spill {
            payload,
            path,
            page_size,
            reserved,
            index,
            json,
        } => spill::cmd_spill(payload, path, page_size, reserved, index, json),
        Cmd::Query { path, sql, json } => query::cmd_query(path, sql, json),
    }
}
