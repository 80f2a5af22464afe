// src/size.rs

//! Defines `TerminalSize`, the value returned by every size query.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal dimensions in character cells.
///
/// A plain value: two sizes with the same fields are interchangeable.
/// A fresh `TerminalSize` is produced by every query; nothing here caches one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerminalSize {
    /// Width in character cells.
    pub columns: u16,
    /// Height in character cells.
    pub rows: u16,
}

impl TerminalSize {
    /// The conventional 80x24 used when the real size is unknown.
    pub const DEFAULT: TerminalSize = TerminalSize::new(80, 24);

    pub const fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }

    /// Returns true if either dimension is zero.
    ///
    /// Freshly allocated ptys commonly report 0x0 until someone sets a size.
    pub fn is_empty(&self) -> bool {
        self.columns == 0 || self.rows == 0
    }
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for TerminalSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

impl From<(u16, u16)> for TerminalSize {
    fn from((columns, rows): (u16, u16)) -> Self {
        Self::new(columns, rows)
    }
}
