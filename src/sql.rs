//! sql — поддерживаемое подмножество SELECT.
//!
//! Грамматика:
//!   SELECT count(*) FROM t
//!   SELECT * FROM t
//!   SELECT col[, col...] FROM t
//! с опциональным WHERE col = 'literal' (равенство по одной колонке).
//! Ключевые слова и имена — без учёта регистра. Токенизатор ручной,
//! строковые литералы в одинарных кавычках с удвоением ('it''s').

use anyhow::{anyhow, Result};

use crate::db::Db;
use crate::record::Value;

// ---- Токенизатор ----

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    StringLit(String),
    Number(String),
    Star,
    Comma,
    LParen,
    RParen,
    Eq,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(i, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            ';' => {
                chars.next();
                // `;` допустим только как хвост
                if chars.clone().any(|(_, c)| !c.is_whitespace()) {
                    return Err(anyhow!("unexpected input after ';'"));
                }
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '\'' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some((_, '\'')) => {
                            // '' — экранированная кавычка
                            if let Some(&(_, '\'')) = chars.peek() {
                                chars.next();
                                s.push('\'');
                            } else {
                                break;
                            }
                        }
                        Some((_, c)) => s.push(c),
                        None => return Err(anyhow!("unterminated string literal")),
                    }
                }
                tokens.push(Token::StringLit(s));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                let mut end = i;
                while let Some(&(j, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        end = j + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Number(input[start..end].to_string()));
            }
            c if c.is_alphanumeric() || c == '_' || c == '"' => {
                if c == '"' {
                    chars.next();
                    let mut s = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '"')) => break,
                            Some((_, c)) => s.push(c),
                            None => return Err(anyhow!("unterminated quoted identifier")),
                        }
                    }
                    tokens.push(Token::Ident(s));
                } else {
                    let start = i;
                    let mut end = i;
                    while let Some(&(j, c)) = chars.peek() {
                        if c.is_alphanumeric() || c == '_' {
                            end = j + c.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    tokens.push(Token::Ident(input[start..end].to_string()));
                }
            }
            other => return Err(anyhow!("unexpected character '{}' in SQL", other)),
        }
    }
    Ok(tokens)
}

// ---- AST и парсер ----

/// Проекция SELECT.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Count,
    Cols(Vec<String>),
}

/// Разобранный SELECT.
#[derive(Debug, Clone)]
pub struct Select {
    pub projection: Projection,
    pub table: String,
    /// WHERE col = 'literal'
    pub filter: Option<(String, String)>,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token> {
        let t = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| anyhow!("unexpected end of SQL"))?;
        self.pos += 1;
        Ok(t)
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        match self.next()? {
            Token::Ident(s) if s.eq_ignore_ascii_case(kw) => Ok(()),
            other => Err(anyhow!("expected {}, got {:?}", kw.to_uppercase(), other)),
        }
    }

    fn ident(&mut self) -> Result<String> {
        match self.next()? {
            Token::Ident(s) => Ok(s),
            other => Err(anyhow!("expected identifier, got {:?}", other)),
        }
    }

    fn keyword_is(&self, kw: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(s)) if s.eq_ignore_ascii_case(kw))
    }

    fn projection(&mut self) -> Result<Projection> {
        if let Some(Token::Star) = self.peek() {
            self.pos += 1;
            return Ok(Projection::All);
        }
        if self.keyword_is("count") {
            // count ( * )
            self.pos += 1;
            match self.next()? {
                Token::LParen => {}
                other => return Err(anyhow!("expected '(' after count, got {:?}", other)),
            }
            match self.next()? {
                Token::Star => {}
                other => return Err(anyhow!("only count(*) is supported, got {:?}", other)),
            }
            match self.next()? {
                Token::RParen => {}
                other => return Err(anyhow!("expected ')', got {:?}", other)),
            }
            return Ok(Projection::Count);
        }

        let mut cols = vec![self.ident()?];
        while let Some(Token::Comma) = self.peek() {
            self.pos += 1;
            cols.push(self.ident()?);
        }
        Ok(Projection::Cols(cols))
    }
}

/// Разобрать SELECT из строки.
pub fn parse_select(input: &str) -> Result<Select> {
    let mut p = Parser {
        tokens: tokenize(input)?,
        pos: 0,
    };

    p.expect_keyword("select")?;
    let projection = p.projection()?;
    p.expect_keyword("from")?;
    let table = p.ident()?;

    let filter = if p.keyword_is("where") {
        p.pos += 1;
        let col = p.ident()?;
        match p.next()? {
            Token::Eq => {}
            other => return Err(anyhow!("expected '=' in WHERE, got {:?}", other)),
        }
        let value = match p.next()? {
            Token::StringLit(s) => s,
            Token::Number(s) => s,
            other => return Err(anyhow!("expected literal in WHERE, got {:?}", other)),
        };
        Some((col, value))
    } else {
        None
    };

    if let Some(t) = p.peek() {
        return Err(anyhow!("unexpected trailing token {:?}", t));
    }
    Ok(Select {
        projection,
        table,
        filter,
    })
}

// ---- Исполнение ----

/// Отрисовать значение колонки; rowid-алиас (INTEGER PRIMARY KEY хранится
/// как NULL) подставляется из rowid ячейки.
fn render(values: &[Value], rowid: i64, idx: usize, ipk_col: Option<usize>) -> String {
    if ipk_col == Some(idx) {
        if values.get(idx).map(Value::is_null).unwrap_or(true) {
            return rowid.to_string();
        }
    }
    match values.get(idx) {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

/// Выполнить SELECT, вернуть строки результата.
pub fn execute_select(db: &Db, stmt: &Select) -> Result<Vec<Vec<String>>> {
    let table = db.find_table(&stmt.table)?;
    if table.rootpage == 0 {
        return Err(anyhow!("'{}' has no storage (view?)", table.name));
    }

    // Быстрый путь: count(*) без фильтра — по заголовкам листьев.
    if stmt.projection == Projection::Count && stmt.filter.is_none() {
        let n = db.count_rows(table.rootpage)?;
        return Ok(vec![vec![n.to_string()]]);
    }

    let col_index = |name: &str| -> Result<usize> {
        table
            .col_names
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("no such column: {}.{}", table.name, name))
    };

    let projected: Vec<usize> = match &stmt.projection {
        Projection::All => (0..table.col_names.len()).collect(),
        Projection::Count => Vec::new(),
        Projection::Cols(cols) => cols
            .iter()
            .map(|c| col_index(c))
            .collect::<Result<Vec<_>>>()?,
    };

    let filter = match &stmt.filter {
        Some((col, value)) => Some((col_index(col)?, value.clone())),
        None => None,
    };

    let ipk = table.ipk_col;
    let mut rows = Vec::new();
    let mut matched = 0u64;
    db.walk_table(table.rootpage, &mut |rowid, values| {
        if let Some((fidx, fval)) = &filter {
            if render(&values, rowid, *fidx, ipk) != *fval {
                return Ok(());
            }
        }
        matched += 1;
        if stmt.projection != Projection::Count {
            rows.push(
                projected
                    .iter()
                    .map(|&i| render(&values, rowid, i, ipk))
                    .collect(),
            );
        }
        Ok(())
    })?;

    if stmt.projection == Projection::Count {
        rows.push(vec![matched.to_string()]);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count() {
        let s = parse_select("SELECT COUNT(*) FROM apples").unwrap();
        assert_eq!(s.projection, Projection::Count);
        assert_eq!(s.table, "apples");
        assert!(s.filter.is_none());
    }

    #[test]
    fn parse_columns_and_where() {
        let s = parse_select("select name, color from apples where color = 'Light Green'").unwrap();
        assert_eq!(
            s.projection,
            Projection::Cols(vec!["name".into(), "color".into()])
        );
        assert_eq!(s.filter, Some(("color".into(), "Light Green".into())));
    }

    #[test]
    fn parse_star_and_semicolon() {
        let s = parse_select("select * from t;").unwrap();
        assert_eq!(s.projection, Projection::All);
    }

    #[test]
    fn escaped_quote_in_literal() {
        let s = parse_select("select a from t where b = 'it''s'").unwrap();
        assert_eq!(s.filter, Some(("b".into(), "it's".into())));
    }

    #[test]
    fn numeric_where_literal() {
        let s = parse_select("select a from t where id = 42").unwrap();
        assert_eq!(s.filter, Some(("id".into(), "42".into())));
    }

    #[test]
    fn parse_errors() {
        assert!(parse_select("delete from t").is_err());
        assert!(parse_select("select from t").is_err());
        assert!(parse_select("select a t").is_err());
        assert!(parse_select("select count(x) from t").is_err());
        assert!(parse_select("select a from t where b = 'unterminated").is_err());
        assert!(parse_select("select a from t extra").is_err());
    }
}
