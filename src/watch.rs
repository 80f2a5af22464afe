// src/watch.rs

//! Process-wide terminal resize watching.
//!
//! `ResizeWatch` owns the single `SIGWINCH` registration of the process.
//! Installing it points the signal at a handler that re-arms itself on every
//! delivery, so no notification can silently disable the ones after it.
//!
//! Callbacks registered through [`ResizeWatch::install`] run inside the
//! signal handler and must be async-signal-safe: no allocation, no locks, no
//! logging. Typical callbacks store to an atomic. Code that needs an ordinary
//! thread context should use [`crate::ResizeListener`] instead.
//!
//! Only `install` and `uninstall` mutate the lifecycle state, and they are
//! serialized through a mutex.

use crate::error::Result;
use crate::os;
use log::{debug, error, info, trace};
use once_cell::sync::Lazy;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct WatchState {
    installed: bool,
    /// Disposition in place before the first install, restored on uninstall.
    previous: Option<os::Disposition>,
}

static STATE: Lazy<Mutex<WatchState>> = Lazy::new(|| Mutex::new(WatchState::default()));

fn lock_state() -> MutexGuard<'static, WatchState> {
    // The state is two plain fields; a panic elsewhere cannot leave it torn.
    STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the process-wide resize registration.
///
/// There is exactly one registration per process, so every operation is an
/// associated function. Use [`ResizeWatch::scoped`] to tie the registration to
/// a value's lifetime.
#[derive(Debug)]
pub struct ResizeWatch;

impl ResizeWatch {
    /// Starts receiving terminal resize notifications.
    ///
    /// `on_resize` is invoked with no arguments after every notification, from
    /// signal context. It does not receive the new size; call
    /// [`crate::query`] from normal context to learn it.
    ///
    /// Installing again while installed replaces the callback (last writer
    /// wins). Handlers never stack.
    ///
    /// # Errors
    /// `Error::NotifyUnsupported` if the OS refuses the registration or has no
    /// resize notification. Callers can fall back to polling [`crate::query`].
    pub fn install(on_resize: Option<fn()>) -> Result<()> {
        let mut state = lock_state();

        // Arm even when already installed so a disposition overwritten by
        // someone else is repaired. A failed install leaves the current
        // callback registered.
        let previous = os::arm()?;
        os::set_callback(on_resize);

        if state.installed {
            debug!(
                "ResizeWatch: replaced registration (callback: {})",
                on_resize.is_some()
            );
        } else {
            state.previous = Some(previous);
            state.installed = true;
            info!(
                "ResizeWatch: installed (callback: {})",
                on_resize.is_some()
            );
        }
        Ok(())
    }

    /// Stops receiving notifications and restores the disposition that was in
    /// place before the first install (the OS default in a fresh process).
    ///
    /// Safe to call when not installed, and any number of times.
    pub fn uninstall() -> Result<()> {
        let mut state = lock_state();
        os::set_callback(None);

        if !state.installed {
            trace!("ResizeWatch: uninstall while not installed, nothing to do");
            return Ok(());
        }

        if let Some(previous) = state.previous.take() {
            if let Err(e) = os::disarm(&previous) {
                state.previous = Some(previous);
                return Err(e);
            }
        }
        state.installed = false;
        info!("ResizeWatch: uninstalled");
        Ok(())
    }

    /// Installs the watch and returns a guard that uninstalls it when dropped.
    pub fn scoped(on_resize: Option<fn()>) -> Result<ResizeGuard> {
        Self::install(on_resize)?;
        Ok(ResizeGuard { _private: () })
    }

    /// Returns true while the resize handler is installed.
    pub fn is_installed() -> bool {
        lock_state().installed && os::is_armed()
    }

    /// Number of resize notifications handled since process start.
    ///
    /// The counter is never reset; compare two readings to count deliveries
    /// in between.
    pub fn notification_count() -> usize {
        os::delivered()
    }

    /// Returns whether a notification arrived since the previous call, and
    /// clears the flag. Lets a main loop poll without any callback.
    pub fn take_pending() -> bool {
        os::take_pending()
    }

    /// Installs the handler if needed without touching the registered callback.
    ///
    /// Returns true if this call did the install.
    pub(crate) fn ensure_installed() -> Result<bool> {
        let mut state = lock_state();
        if state.installed {
            return Ok(false);
        }
        let previous = os::arm()?;
        state.previous = Some(previous);
        state.installed = true;
        info!("ResizeWatch: installed for listeners");
        Ok(true)
    }
}

/// Keeps the resize watch installed; uninstalls it on drop.
#[derive(Debug)]
#[must_use = "the watch is uninstalled as soon as the guard is dropped"]
pub struct ResizeGuard {
    _private: (),
}

impl ResizeGuard {
    /// Uninstalls now, reporting any error instead of logging it.
    pub fn release(self) -> Result<()> {
        std::mem::forget(self);
        ResizeWatch::uninstall()
    }
}

impl Drop for ResizeGuard {
    fn drop(&mut self) {
        if let Err(e) = ResizeWatch::uninstall() {
            // Log error, but don't panic in drop.
            error!("ResizeGuard: failed to uninstall resize watch: {}", e);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    // The only unit test in this crate that touches the SIGWINCH disposition.
    #[test_log::test]
    fn ensure_installed_reports_who_installed() {
        ResizeWatch::uninstall().unwrap();

        assert!(ResizeWatch::ensure_installed().unwrap());
        assert!(!ResizeWatch::ensure_installed().unwrap());
        assert!(ResizeWatch::is_installed());

        ResizeWatch::uninstall().unwrap();
        assert!(!ResizeWatch::is_installed());
    }
}
