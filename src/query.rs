// src/query.rs

//! Terminal size queries.
//!
//! Every call goes to the OS; nothing is cached. Queries mutate no shared
//! state and are safe to call from any thread.

use crate::error::Result;
use crate::os;
use crate::size::TerminalSize;
use log::debug;

#[cfg(unix)]
use std::os::fd::AsFd;

/// Returns the current size of the terminal attached to standard output.
///
/// # Errors
/// * `Error::NotATerminal` when standard output is redirected to a file, a
///   pipe, or anything else that is not a tty.
/// * `Error::Io` for other OS failures, e.g. a closed standard output.
///
/// A successful query returns exactly what the OS reported. A freshly created
/// pty may report `0x0`; see [`TerminalSize::is_empty`].
pub fn query() -> Result<TerminalSize> {
    os::stdout_size()
}

/// Returns the size of the terminal behind `fd`.
#[cfg(unix)]
pub fn query_fd<F: AsFd>(fd: F) -> Result<TerminalSize> {
    os::window_size(fd.as_fd())
}

/// Queries standard output, substituting `default` when the size is unknown.
///
/// Unknown covers any query error as well as an empty (zero-dimension) report.
pub fn query_or(default: TerminalSize) -> TerminalSize {
    known_or(query(), default)
}

fn known_or(reported: Result<TerminalSize>, default: TerminalSize) -> TerminalSize {
    match reported {
        Ok(size) if !size.is_empty() => size,
        Ok(size) => {
            debug!(
                "Terminal reported empty size {}, using fallback {}",
                size, default
            );
            default
        }
        Err(e) => {
            debug!("Terminal size unavailable ({}), using fallback {}", e, default);
            default
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use nix::pty::{openpty, Winsize};
    use std::fs::File;

    fn pty_with_size(columns: u16, rows: u16) -> nix::pty::OpenptyResult {
        let ws = Winsize {
            ws_row: rows,
            ws_col: columns,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        openpty(&ws, None).expect("openpty")
    }

    #[test_log::test]
    fn repeated_queries_agree() {
        let pty = pty_with_size(80, 24);
        let first = query_fd(&pty.slave).unwrap();
        let second = query_fd(&pty.slave).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, TerminalSize::new(80, 24));
    }

    #[test_log::test]
    fn master_side_reports_the_same_size() {
        let pty = pty_with_size(132, 50);
        assert_eq!(query_fd(&pty.master).unwrap(), TerminalSize::new(132, 50));
    }

    #[test_log::test]
    fn regular_file_is_not_a_terminal() {
        let file = File::open("/dev/null").unwrap();
        assert!(query_fd(&file).unwrap_err().is_not_a_terminal());
    }

    #[test_log::test]
    fn concurrent_queries_do_not_interfere() {
        let pty = pty_with_size(90, 30);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..50 {
                        assert_eq!(query_fd(&pty.slave).unwrap(), TerminalSize::new(90, 30));
                    }
                });
            }
        });
    }

    #[test_log::test]
    fn fallback_replaces_empty_and_failed_reports() {
        let fallback = TerminalSize::new(100, 40);

        let empty = pty_with_size(0, 0);
        assert!(query_fd(&empty.slave).unwrap().is_empty());
        assert_eq!(known_or(query_fd(&empty.slave), fallback), fallback);

        let half_empty = pty_with_size(120, 0);
        assert_eq!(known_or(query_fd(&half_empty.slave), fallback), fallback);

        let null = File::open("/dev/null").unwrap();
        assert_eq!(known_or(query_fd(&null), fallback), fallback);

        let sized = pty_with_size(132, 43);
        assert_eq!(
            known_or(query_fd(&sized.slave), fallback),
            TerminalSize::new(132, 43)
        );
    }
}
