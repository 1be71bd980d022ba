//! spill — расчёт split point для payload btree-страниц.
//!
//! Для usable size U и длины payload P:
//! - X — максимум, который ячейка может держать на самой странице:
//!   U-35 для table leaf, ((U-12)*64/255)-23 для index-страниц;
//! - M — минимум, который остаётся на странице при выносе в overflow:
//!   ((U-12)*32/255)-23 (деление вещественное, без floor);
//! - K — фактический локальный размер при выносе: M + ((P-M) mod (U-4)).
//!
//! Ровно один из трёх режимов для любой пары (U, P):
//! 1. P <= X       — весь payload на странице, overflow нет;
//! 2. P > X, K <= X — на странице первые K байт, остальное в overflow;
//! 3. P > X, K > X  — на странице первые M байт, остальное в overflow.
//!
//! K при целых U и P всегда целое (дробные части M сокращаются), поэтому
//! round() снимает только погрешность f64. M при выносе усечён до целого
//! числа байт (floor), как в дисковом формате.

use anyhow::{anyhow, Result};

/// Вид btree-страницы: table leaf против index — у них разный X.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Table,
    Index,
}

/// Минимальный usable size, при котором формула осмысленна
/// (все пороги положительны, mod (U-4) определён).
pub const SPILL_MIN_USABLE: u64 = 480;

/// Итог разбиения payload между страницей и overflow-цепочкой.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// P <= X: все P байт на странице.
    Inline { local: u64 },
    /// P > X и K <= X: на странице K байт, хвост в overflow.
    SpillTail { local: u64, overflow: u64 },
    /// P > X и K > X: на странице минимум M байт, остальное в overflow.
    SpillMin { local: u64, overflow: u64 },
}

impl Placement {
    /// Байт payload на самой странице.
    #[inline]
    pub fn local(&self) -> u64 {
        match *self {
            Placement::Inline { local } => local,
            Placement::SpillTail { local, .. } => local,
            Placement::SpillMin { local, .. } => local,
        }
    }

    /// Байт payload в overflow-цепочке.
    #[inline]
    pub fn overflow(&self) -> u64 {
        match *self {
            Placement::Inline { .. } => 0,
            Placement::SpillTail { overflow, .. } => overflow,
            Placement::SpillMin { overflow, .. } => overflow,
        }
    }

    #[inline]
    pub fn is_inline(&self) -> bool {
        matches!(self, Placement::Inline { .. })
    }
}

fn check_usable(usable: u64) -> Result<()> {
    if usable < SPILL_MIN_USABLE {
        return Err(anyhow!(
            "usable page size {} too small for payload split (minimum {})",
            usable,
            SPILL_MIN_USABLE
        ));
    }
    Ok(())
}

#[inline]
fn max_local(usable: u64, kind: PageKind) -> f64 {
    match kind {
        PageKind::Table => usable as f64 - 35.0,
        PageKind::Index => (usable as f64 - 12.0) * 64.0 / 255.0 - 23.0,
    }
}

#[inline]
fn min_local(usable: u64) -> f64 {
    (usable as f64 - 12.0) * 32.0 / 255.0 - 23.0
}

/// X, усечённый до целого числа байт.
pub fn max_inline(usable: u64, kind: PageKind) -> Result<u64> {
    check_usable(usable)?;
    Ok(max_local(usable, kind).floor() as u64)
}

/// M, усечённый до целого числа байт.
pub fn min_inline(usable: u64) -> Result<u64> {
    check_usable(usable)?;
    Ok(min_local(usable).floor() as u64)
}

/// Классифицировать payload длины `payload` на странице с usable size `usable`.
pub fn split_payload(usable: u64, payload: u64, kind: PageKind) -> Result<Placement> {
    check_usable(usable)?;

    let p = payload as f64;
    let x = max_local(usable, kind);
    if p <= x {
        return Ok(Placement::Inline { local: payload });
    }

    // P > X >= M, значит P - M > 0 и обычный % совпадает с floored mod.
    let m = min_local(usable);
    let k = m + (p - m) % (usable - 4) as f64;
    if k <= x {
        let local = k.round() as u64;
        Ok(Placement::SpillTail {
            local,
            overflow: payload - local,
        })
    } else {
        let local = m.floor() as u64;
        Ok(Placement::SpillMin {
            local,
            overflow: payload - local,
        })
    }
}
