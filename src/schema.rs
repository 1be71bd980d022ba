//! schema — объекты sqlite_schema (таблица на странице 1).
//!
//! Строки схемы: (type, name, tbl_name, rootpage, sql). Имена колонок
//! таблицы извлекаются из текста CREATE TABLE: содержимое внешних скобок
//! режется по запятым верхнего уровня, из каждой части берётся первый
//! токен. Части, начинающиеся с ключевых слов table-constraint'ов
//! (PRIMARY, UNIQUE, ...), пропускаются.

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::record::Value;

/// Тип объекта схемы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Table,
    Index,
    View,
    Trigger,
}

impl ObjectKind {
    pub fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "table" => ObjectKind::Table,
            "index" => ObjectKind::Index,
            "view" => ObjectKind::View,
            "trigger" => ObjectKind::Trigger,
            other => return Err(anyhow!("unknown schema object type '{}'", other)),
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Table => "table",
            ObjectKind::Index => "index",
            ObjectKind::View => "view",
            ObjectKind::Trigger => "trigger",
        }
    }
}

/// Одна строка sqlite_schema.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaEntry {
    pub kind: ObjectKind,
    pub name: String,
    pub tbl_name: String,
    pub rootpage: u32,
    pub sql: String,
    /// Имена колонок (только для таблиц, из CREATE TABLE).
    pub col_names: Vec<String>,
    /// Индекс колонки INTEGER PRIMARY KEY (rowid-алиас), если есть.
    #[serde(skip)]
    pub ipk_col: Option<usize>,
}

impl SchemaEntry {
    /// Служебный объект (sqlite_schema, sqlite_sequence, ...).
    pub fn is_internal(&self) -> bool {
        self.name.starts_with("sqlite_")
    }
}

/// Собрать SchemaEntry из значений записи схемы.
pub fn entry_from_record(values: &[Value]) -> Result<SchemaEntry> {
    if values.len() < 5 {
        return Err(anyhow!(
            "schema row has {} column(s), expected 5",
            values.len()
        ));
    }
    let kind_text = values[0]
        .as_str()
        .ok_or_else(|| anyhow!("schema row: type is not text"))?;
    let kind = ObjectKind::parse(kind_text)?;
    let name = values[1]
        .as_str()
        .ok_or_else(|| anyhow!("schema row: name is not text"))?
        .to_string();
    let tbl_name = values[2].as_str().unwrap_or(&name).to_string();
    // У view/trigger rootpage = 0 (или NULL в старых файлах).
    let rootpage = values[3].as_int().unwrap_or(0);
    if rootpage < 0 || rootpage > u32::MAX as i64 {
        return Err(anyhow!("schema row '{}': bad rootpage {}", name, rootpage));
    }
    let sql = values[4].as_str().unwrap_or("").to_string();

    let (col_names, ipk_col) = if kind == ObjectKind::Table {
        parse_columns(&sql)
    } else {
        (Vec::new(), None)
    };

    Ok(SchemaEntry {
        kind,
        name,
        tbl_name,
        rootpage: rootpage as u32,
        sql,
        col_names,
        ipk_col,
    })
}

/// Разрезать содержимое внешних скобок по запятым верхнего уровня.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(body[start..].trim());
    parts
}

const CONSTRAINT_KEYWORDS: &[&str] = &[
    "primary", "unique", "check", "foreign", "constraint",
];

/// Снять кавычки/скобки с идентификатора.
fn unquote(ident: &str) -> &str {
    let b = ident.as_bytes();
    if b.len() >= 2 {
        let (first, last) = (b[0], b[b.len() - 1]);
        let quoted = matches!(
            (first, last),
            (b'"', b'"') | (b'`', b'`') | (b'\'', b'\'') | (b'[', b']')
        );
        if quoted {
            return &ident[1..ident.len() - 1];
        }
    }
    ident
}

/// Имена колонок и позиция INTEGER PRIMARY KEY из текста CREATE TABLE.
pub fn parse_columns(sql: &str) -> (Vec<String>, Option<usize>) {
    let open = match sql.find('(') {
        Some(i) => i,
        None => return (Vec::new(), None),
    };
    let close = match sql.rfind(')') {
        Some(i) if i > open => i,
        _ => return (Vec::new(), None),
    };

    let mut names = Vec::new();
    let mut ipk = None;
    for part in split_top_level(&sql[open + 1..close]) {
        let first = match part.split_whitespace().next() {
            Some(t) => t,
            None => continue,
        };
        if CONSTRAINT_KEYWORDS.contains(&first.to_ascii_lowercase().as_str()) {
            continue;
        }
        let lowered = part.to_ascii_lowercase();
        if lowered.contains("integer") && lowered.contains("primary key") {
            ipk = Some(names.len());
        }
        names.push(unquote(first).to_string());
    }
    (names, ipk)
}
