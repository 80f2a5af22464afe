//! Terminal size queries and resize notifications.
//!
//! Two pieces: [`query`] reads the current size of the terminal behind
//! standard output, and [`ResizeWatch`] keeps a `SIGWINCH` handler armed so
//! the process hears about every resize. [`ResizeListener`] delivers those
//! notifications on an ordinary thread for code that cannot run in signal
//! context.
//!
//! ```no_run
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! static RESIZED: AtomicBool = AtomicBool::new(false);
//!
//! fn on_resize() {
//!     RESIZED.store(true, Ordering::Relaxed);
//! }
//!
//! termwatch::ResizeWatch::install(Some(on_resize))?;
//! let size = termwatch::query()?;
//! println!("{} columns, {} rows", size.columns, size.rows);
//! # Ok::<(), termwatch::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod listener;
mod os;
pub mod query;
pub mod size;
pub mod watch;

pub use error::{Error, Result};
pub use listener::ResizeListener;
#[cfg(unix)]
pub use query::query_fd;
pub use query::{query, query_or};
pub use size::TerminalSize;
pub use watch::{ResizeGuard, ResizeWatch};
