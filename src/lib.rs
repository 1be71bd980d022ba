// Базовые модули
pub mod consts;
pub mod header;
pub mod varint;
pub mod spill;

// Разбор содержимого страниц
pub mod record;
pub mod page;   // src/page/{mod,header,cell,overflow}.rs

// Высокоуровневый API
pub mod schema;
pub mod db;
pub mod sql;

// Утилиты (hex_dump, ...)
pub mod util;

// CLI (команды бинаря litescope)
pub mod cli;

// Удобные реэкспорты
pub use db::Db;
pub use header::{parse_db_header, read_db_header, validate_page_size, DbHeader};
pub use spill::{max_inline, min_inline, split_payload, PageKind, Placement};
