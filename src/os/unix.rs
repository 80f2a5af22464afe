// src/os/unix.rs

//! Unix implementation: `ioctl(TIOCGWINSZ)` for sizes and a `SIGWINCH`
//! handler for resize notifications.
//!
//! The handler runs in signal context. It only touches the atomics declared
//! here and calls `sigaction(2)` and `write(2)`, both async-signal-safe. It
//! never allocates, locks, or logs.

use crate::error::{Error, Result};
use crate::size::TerminalSize;
use log::{debug, trace};
use nix::errno::Errno;
use nix::pty::Winsize;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, IntoRawFd, OwnedFd};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

/// Signal disposition saved on install and restored on uninstall.
pub type Disposition = SigAction;

nix::ioctl_read_bad!(tiocgwinsz, libc::TIOCGWINSZ, Winsize);

/// Set while our handler is supposed to own `SIGWINCH`. The handler only
/// re-arms while this is true, so an uninstall is never undone by a late
/// delivery.
static ARMED: AtomicBool = AtomicBool::new(false);
/// Registered handler-context callback as a raw `fn()` address, 0 for none.
static CALLBACK: AtomicUsize = AtomicUsize::new(0);
/// Total notifications handled since process start.
static DELIVERED: AtomicUsize = AtomicUsize::new(0);
static PENDING: AtomicBool = AtomicBool::new(false);
/// Write end of the listener wake pipe, -1 until one is opened.
static WAKE_FD: AtomicI32 = AtomicI32::new(-1);

/// Reads the window size of the terminal behind `fd`.
pub fn window_size(fd: BorrowedFd<'_>) -> Result<TerminalSize> {
    let mut ws = Winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    // SAFETY: `ws` is a valid, writable winsize for the duration of the call.
    unsafe { tiocgwinsz(fd.as_raw_fd(), &mut ws) }?;
    trace!(
        "TIOCGWINSZ on fd {}: {}x{}",
        fd.as_raw_fd(),
        ws.ws_col,
        ws.ws_row
    );
    Ok(TerminalSize::new(ws.ws_col, ws.ws_row))
}

/// Reads the window size of standard output.
pub fn stdout_size() -> Result<TerminalSize> {
    // SAFETY: STDOUT_FILENO stays open for the duration of the borrow; if it was
    // closed the ioctl reports EBADF, which surfaces as `Error::Io`.
    let fd = unsafe { BorrowedFd::borrow_raw(libc::STDOUT_FILENO) };
    window_size(fd)
}

fn winch_action() -> SigAction {
    SigAction::new(
        SigHandler::Handler(handle_winch),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    )
}

extern "C" fn handle_winch(_signo: libc::c_int) {
    let saved_errno = Errno::last_raw();

    if ARMED.load(Ordering::Acquire) {
        // Delivery may have reset the disposition to SIG_DFL.
        // SAFETY: sigaction(2) is async-signal-safe.
        let _ = unsafe { sigaction(Signal::SIGWINCH, &winch_action()) };
    }

    DELIVERED.fetch_add(1, Ordering::AcqRel);
    PENDING.store(true, Ordering::Release);

    let fd = WAKE_FD.load(Ordering::Acquire);
    if fd >= 0 {
        let byte = 1u8;
        // SAFETY: write(2) is async-signal-safe. The pipe is non-blocking, so a
        // full pipe drops the byte, which only coalesces wake-ups.
        unsafe { libc::write(fd, &byte as *const u8 as *const libc::c_void, 1) };
    }

    let raw = CALLBACK.load(Ordering::Acquire);
    if raw != 0 {
        // SAFETY: CALLBACK only ever holds 0 or an address taken from a `fn()`
        // in `set_callback`.
        let callback = unsafe { std::mem::transmute::<usize, fn()>(raw) };
        callback();
    }

    Errno::set_raw(saved_errno);
}

/// Replaces the handler-context callback. `None` clears it.
pub fn set_callback(callback: Option<fn()>) {
    let raw = callback.map_or(0, |f| f as usize);
    CALLBACK.store(raw, Ordering::Release);
}

/// Points `SIGWINCH` at our handler and returns the disposition it replaced.
pub fn arm() -> Result<Disposition> {
    let was_armed = ARMED.swap(true, Ordering::AcqRel);
    // SAFETY: the handler only performs async-signal-safe operations.
    match unsafe { sigaction(Signal::SIGWINCH, &winch_action()) } {
        Ok(previous) => {
            debug!("SIGWINCH handler armed");
            Ok(previous)
        }
        Err(errno) => {
            ARMED.store(was_armed, Ordering::Release);
            Err(Error::NotifyUnsupported(format!(
                "sigaction(SIGWINCH) failed: {}",
                errno
            )))
        }
    }
}

/// Stops re-arming and restores `previous` as the `SIGWINCH` disposition.
pub fn disarm(previous: &Disposition) -> Result<()> {
    ARMED.store(false, Ordering::Release);
    // SAFETY: `previous` came from a successful sigaction call and is a valid
    // disposition to reinstate.
    unsafe { sigaction(Signal::SIGWINCH, previous) }.map_err(|errno| {
        Error::Io(io::Error::from(errno))
    })?;
    debug!("SIGWINCH disposition restored");
    Ok(())
}

/// Returns true while our handler owns `SIGWINCH`.
pub fn is_armed() -> bool {
    ARMED.load(Ordering::Acquire)
}

/// Number of notifications handled since process start.
pub fn delivered() -> usize {
    DELIVERED.load(Ordering::Acquire)
}

/// Clears the pending flag, returning whether a notification arrived since the
/// last call.
pub fn take_pending() -> bool {
    PENDING.swap(false, Ordering::AcqRel)
}

/// Opens the wake pipe the handler writes to and returns its blocking read end.
///
/// The write end is non-blocking and intentionally kept open for the rest of
/// the process, since the handler may still be holding its descriptor number.
pub fn open_wake_pipe() -> Result<File> {
    let mut fds = [0 as libc::c_int; 2];
    // SAFETY: `fds` has room for the two descriptors pipe(2) writes.
    if unsafe { libc::pipe(fds.as_mut_ptr()) } == -1 {
        return Err(io::Error::last_os_error().into());
    }
    // SAFETY: pipe(2) succeeded, so both descriptors are open and owned by us.
    let (read_end, write_end) =
        unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };

    set_cloexec(&read_end)?;
    set_cloexec(&write_end)?;
    set_nonblocking(&write_end)?;

    let write_fd = write_end.into_raw_fd();
    if WAKE_FD
        .compare_exchange(-1, write_fd, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        // SAFETY: write_fd was never published, so nothing else refers to it.
        drop(unsafe { OwnedFd::from_raw_fd(write_fd) });
        return Err(
            io::Error::new(io::ErrorKind::AlreadyExists, "wake pipe already open").into(),
        );
    }
    debug!("Opened resize wake pipe (read fd {})", read_end.as_raw_fd());
    Ok(File::from(read_end))
}

fn set_cloexec(fd: &OwnedFd) -> Result<()> {
    // SAFETY: fcntl(2) on a descriptor we own.
    let flags = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_GETFD) };
    if flags == -1 {
        return Err(io::Error::last_os_error().into());
    }
    // SAFETY: same descriptor, only adding FD_CLOEXEC.
    if unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, flags | libc::FD_CLOEXEC) } == -1 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(())
}

fn set_nonblocking(fd: &OwnedFd) -> Result<()> {
    // SAFETY: fcntl(2) on a descriptor we own.
    let flags = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_GETFL) };
    if flags == -1 {
        return Err(io::Error::last_os_error().into());
    }
    // SAFETY: same descriptor, only adding O_NONBLOCK.
    if unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFL, flags | libc::O_NONBLOCK) } == -1 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::pty::openpty;
    use std::os::fd::AsFd;

    #[test_log::test]
    fn window_size_reads_pty_dimensions() {
        let ws = Winsize {
            ws_row: 33,
            ws_col: 101,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let pty = openpty(&ws, None).expect("openpty");
        let size = window_size(pty.slave.as_fd()).expect("pty is a terminal");
        assert_eq!(size, TerminalSize::new(101, 33));
    }

    #[test_log::test]
    fn window_size_on_regular_device_is_not_a_terminal() {
        let null = File::open("/dev/null").expect("open /dev/null");
        let err = window_size(null.as_fd()).unwrap_err();
        assert!(err.is_not_a_terminal(), "got {:?}", err);
    }

    fn noop() {}

    #[test_log::test]
    fn set_callback_round_trips_through_the_atomic() {
        set_callback(Some(noop));
        assert_eq!(CALLBACK.load(Ordering::Acquire), noop as fn() as usize);
        set_callback(None);
        assert_eq!(CALLBACK.load(Ordering::Acquire), 0);
    }
}
