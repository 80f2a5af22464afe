// src/main.rs

//! `termwatch`: print the terminal size, once or after every resize.
//!
//! ```text
//! termwatch [--json] [--strict] [--watch] [--count N] [--config FILE]
//! ```

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::mpsc;

use termwatch::config::Config;
use termwatch::{query, ResizeListener, TerminalSize};

const USAGE: &str = "usage: termwatch [--json] [--strict] [--watch] [--count N] [--config FILE]";

/// Parsed command-line flags.
#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    json: bool,
    strict: bool,
    watch: bool,
    count: Option<usize>,
    config: Option<PathBuf>,
    help: bool,
}

fn parse_args<I>(args: I) -> Result<Options>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => options.json = true,
            "--strict" => options.strict = true,
            "--watch" => options.watch = true,
            "--count" => {
                let value = args.next().ok_or_else(|| anyhow!("--count needs a value"))?;
                let count = value
                    .parse::<usize>()
                    .with_context(|| format!("Invalid --count value '{}'", value))?;
                options.count = Some(count);
            }
            "--config" => {
                let value = args.next().ok_or_else(|| anyhow!("--config needs a path"))?;
                options.config = Some(PathBuf::from(value));
            }
            "-h" | "--help" => options.help = true,
            other => bail!("Unknown argument '{}'\n{}", other, USAGE),
        }
    }
    if options.count.is_some() && !options.watch {
        bail!("--count only applies to --watch");
    }
    Ok(options)
}

fn render(size: TerminalSize, json: bool) -> Result<String> {
    if json {
        serde_json::to_string(&size).context("Failed to encode terminal size as JSON")
    } else {
        Ok(size.to_string())
    }
}

/// Queries the size, applying the configured fallback unless strict.
///
/// Strict mode fails on query errors and prints an empty report as-is.
fn current_size(config: &Config, strict: bool) -> Result<TerminalSize> {
    match query() {
        Ok(size) if size.is_empty() && !strict => {
            let fallback = config.fallback_size();
            warn!("Terminal reported an empty size {}; using {}", size, fallback);
            Ok(fallback)
        }
        Ok(size) => Ok(size),
        Err(e) if strict => Err(e).context("Failed to query terminal size"),
        Err(e) => {
            let fallback = config.fallback_size();
            warn!("Terminal size unavailable ({}); using {}", e, fallback);
            Ok(fallback)
        }
    }
}

fn run_watch(options: &Options, config: &Config, strict: bool) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let _listener = ResizeListener::subscribe(move || {
        // The receiver only goes away when main is exiting.
        let _ = tx.send(());
    })
    .context("Failed to subscribe to terminal resize notifications")?;

    println!("watching for resize events");
    let mut last = None;
    if config.watch.print_initial {
        let size = current_size(config, strict)?;
        println!("{}", render(size, options.json)?);
        last = Some(size);
    }

    let mut printed = 0usize;
    while options.count.map_or(true, |limit| printed < limit) {
        rx.recv().context("Resize listener disconnected")?;
        let size = current_size(config, strict)?;
        if config.watch.skip_unchanged && last == Some(size) {
            debug!("Size unchanged at {}, skipping", size);
            continue;
        }
        println!("{}", render(size, options.json)?);
        last = Some(size);
        printed += 1;
    }
    info!("Printed {} resize(s), exiting", printed);
    Ok(())
}

fn main() -> Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let options = parse_args(std::env::args().skip(1))?;
    if options.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = match &options.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    debug!("Configuration: {:?}", config);
    let strict = options.strict || config.strict;

    if options.watch {
        run_watch(&options, &config, strict)
    } else {
        let size = current_size(&config, strict)?;
        println!("{}", render(size, options.json)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test_log::test]
    fn no_arguments_prints_once() {
        assert_eq!(parse_args(args(&[])).unwrap(), Options::default());
    }

    #[test_log::test]
    fn flags_combine() {
        let options =
            parse_args(args(&["--watch", "--count", "3", "--json", "--config", "c.json"])).unwrap();
        assert!(options.watch);
        assert!(options.json);
        assert_eq!(options.count, Some(3));
        assert_eq!(options.config, Some(PathBuf::from("c.json")));
    }

    #[test_log::test]
    fn count_requires_watch_and_a_number() {
        assert!(parse_args(args(&["--count", "2"])).is_err());
        assert!(parse_args(args(&["--watch", "--count", "two"])).is_err());
        assert!(parse_args(args(&["--watch", "--count"])).is_err());
    }

    #[test_log::test]
    fn unknown_flag_is_rejected() {
        let err = parse_args(args(&["--frobnicate"])).unwrap_err();
        assert!(err.to_string().contains("--frobnicate"));
    }

    #[test_log::test]
    fn render_plain_and_json() {
        let size = TerminalSize::new(120, 40);
        assert_eq!(render(size, false).unwrap(), "120x40");
        assert_eq!(render(size, true).unwrap(), r#"{"columns":120,"rows":40}"#);
    }
}
