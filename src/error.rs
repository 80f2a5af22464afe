// src/error.rs

//! Error types for terminal size queries and resize watching.

use std::fmt;
use std::io;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by `query` and `ResizeWatch`.
///
/// Errors are always returned to the immediate caller; nothing here ever
/// fails from inside the signal handler.
#[derive(Debug)]
pub enum Error {
    /// The descriptor queried is not attached to a terminal (stdout redirected
    /// to a file or pipe, for instance).
    NotATerminal,
    /// The platform has no resize notification, or it refused the registration.
    NotifyUnsupported(String),
    /// Any other OS failure.
    Io(io::Error),
}

impl Error {
    /// Returns true for `NotATerminal`.
    pub fn is_not_a_terminal(&self) -> bool {
        matches!(self, Error::NotATerminal)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotATerminal => write!(f, "not a terminal"),
            Error::NotifyUnsupported(reason) => {
                write!(f, "resize notifications unsupported: {}", reason)
            }
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<nix::errno::Errno> for Error {
    fn from(errno: nix::errno::Errno) -> Self {
        match errno {
            nix::errno::Errno::ENOTTY => Error::NotATerminal,
            other => Error::Io(io::Error::from(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test_log::test]
    fn enotty_maps_to_not_a_terminal() {
        assert!(Error::from(Errno::ENOTTY).is_not_a_terminal());
    }

    #[test_log::test]
    fn other_errnos_keep_their_os_error() {
        match Error::from(Errno::EBADF) {
            Error::Io(e) => assert_eq!(e.raw_os_error(), Some(libc::EBADF)),
            other => panic!("expected Io, got {:?}", other),
        }
    }

    #[test_log::test]
    fn display_names_the_condition() {
        assert_eq!(Error::NotATerminal.to_string(), "not a terminal");
        assert!(Error::NotifyUnsupported("no SIGWINCH".into())
            .to_string()
            .contains("no SIGWINCH"));
    }
}
