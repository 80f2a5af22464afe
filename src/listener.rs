// src/listener.rs

//! Resize notifications delivered on an ordinary thread.
//!
//! The signal handler writes one byte to a wake pipe. A dispatcher thread
//! blocks on the read end and, on each wake-up, calls every subscribed closure
//! in normal context, so closures may allocate, lock, log, and query the size.
//!
//! Bursts of resizes coalesce into fewer calls. A call means "the size may have
//! changed, query again", never a specific new size.
//!
//! The pipe and the dispatcher thread are created on first use and live for the
//! rest of the process. Subscribing installs the resize watch if needed;
//! `ResizeWatch::uninstall` stops deliveries to listeners too.

use crate::error::{Error, Result};
use crate::os;
use crate::watch::ResizeWatch;
use log::{debug, error, info, trace, warn};
use once_cell::sync::{Lazy, OnceCell};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Size of the buffer used to drain the wake pipe. Everything drained in one
/// read results in a single round of callbacks.
const WAKE_BUFFER_SIZE: usize = 64;

static LISTENERS: Lazy<Mutex<Vec<(u64, Callback)>>> = Lazy::new(|| Mutex::new(Vec::new()));
static NEXT_ID: AtomicU64 = AtomicU64::new(1);
static DISPATCHER: OnceCell<()> = OnceCell::new();

fn listeners() -> MutexGuard<'static, Vec<(u64, Callback)>> {
    LISTENERS.lock().unwrap_or_else(PoisonError::into_inner)
}

fn start_dispatcher() -> Result<()> {
    DISPATCHER.get_or_try_init(|| {
        let wake = os::open_wake_pipe()?;
        thread::Builder::new()
            .name("resize-listener".to_string())
            .spawn(move || dispatch_loop(wake))?;
        info!("Resize dispatcher thread spawned");
        Ok::<(), Error>(())
    })?;
    Ok(())
}

fn dispatch_loop(mut wake: File) {
    let mut buffer = [0u8; WAKE_BUFFER_SIZE];
    loop {
        match wake.read(&mut buffer) {
            Ok(0) => {
                warn!("Resize wake pipe closed, dispatcher exiting");
                return;
            }
            Ok(bytes_read) => {
                trace!("Resize dispatcher woke ({} pending)", bytes_read);
                notify_listeners();
            }
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("Resize dispatcher read failed: {}", e);
                return;
            }
        }
    }
}

fn notify_listeners() {
    // Call outside the lock so a closure may subscribe or drop listeners.
    let snapshot: Vec<Callback> = listeners().iter().map(|(_, cb)| Arc::clone(cb)).collect();
    for callback in snapshot {
        if panic::catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
            error!("Resize listener panicked; dispatcher continues");
        }
    }
}

/// A subscription to resize notifications, delivered on the dispatcher thread.
///
/// Dropping the listener unsubscribes it. A call already in progress on the
/// dispatcher thread may still complete after the drop returns.
#[derive(Debug)]
#[must_use = "the listener unsubscribes as soon as it is dropped"]
pub struct ResizeListener {
    id: u64,
}

impl ResizeListener {
    /// Subscribes `on_resize` to resize notifications.
    ///
    /// # Errors
    /// `Error::NotifyUnsupported` when the platform has no resize notification;
    /// `Error::Io` if the wake pipe or dispatcher thread cannot be created. A
    /// watch installed by this call is uninstalled again on error.
    pub fn subscribe<F>(on_resize: F) -> Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let installed_here = ResizeWatch::ensure_installed()?;
        if let Err(e) = start_dispatcher() {
            if installed_here {
                if let Err(undo) = ResizeWatch::uninstall() {
                    warn!("Failed to uninstall resize watch after dispatcher error: {}", undo);
                }
            }
            return Err(e);
        }

        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        listeners().push((id, Arc::new(on_resize)));
        debug!("Resize listener {} subscribed", id);
        Ok(Self { id })
    }

    /// Number of currently subscribed listeners.
    pub fn active() -> usize {
        listeners().len()
    }
}

impl Drop for ResizeListener {
    fn drop(&mut self) {
        listeners().retain(|(id, _)| *id != self.id);
        debug!("Resize listener {} unsubscribed", self.id);
    }
}
