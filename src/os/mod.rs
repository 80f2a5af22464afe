// src/os/mod.rs
//
// Platform layer. Everything that touches ioctl, signal dispositions, or raw
// descriptors lives below this module so callers never see platform specifics.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::*;

#[cfg(not(unix))]
mod unsupported;
#[cfg(not(unix))]
pub use unsupported::*;
