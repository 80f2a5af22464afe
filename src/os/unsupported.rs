// src/os/unsupported.rs

//! Fallback for platforms without `TIOCGWINSZ` or `SIGWINCH`.
//!
//! Size queries report `NotATerminal` and resize notifications cannot be
//! armed; callers fall back to defaults or periodic polling.

use crate::error::{Error, Result};
use crate::size::TerminalSize;

/// Placeholder disposition; there is nothing to restore on these platforms.
#[derive(Debug, Clone, Copy)]
pub struct Disposition;

pub fn stdout_size() -> Result<TerminalSize> {
    Err(Error::NotATerminal)
}

pub fn set_callback(_callback: Option<fn()>) {}

pub fn arm() -> Result<Disposition> {
    Err(Error::NotifyUnsupported(
        "no terminal resize signal on this platform".to_string(),
    ))
}

pub fn disarm(_previous: &Disposition) -> Result<()> {
    Ok(())
}

pub fn is_armed() -> bool {
    false
}

pub fn delivered() -> usize {
    0
}

pub fn take_pending() -> bool {
    false
}

pub fn open_wake_pipe() -> Result<std::fs::File> {
    Err(Error::NotifyUnsupported(
        "no terminal resize signal on this platform".to_string(),
    ))
}
