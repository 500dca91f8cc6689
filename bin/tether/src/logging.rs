//! Logging setup.

use eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::LogArgs;

/// Initialize logging based on command line arguments.
///
/// The filter is built with the following precedence:
/// 1. If `--quiet` is set, only errors are shown
/// 2. Otherwise, start with `RUST_LOG` env var if set, or a level from `-v`
/// 3. Apply any custom filter from `--log.filter`
pub(crate) fn init_logging(args: &LogArgs) -> Result<()> {
    let filter = build_filter(args);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if args.json {
        builder
            .json()
            .try_init()
            .map_err(|e| eyre::eyre!("failed to install log subscriber: {e}"))?;
    } else {
        builder
            .try_init()
            .map_err(|e| eyre::eyre!("failed to install log subscriber: {e}"))?;
    }

    Ok(())
}

fn build_filter(args: &LogArgs) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new("error");
    }

    let base_level = match args.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level));

    if let Some(custom_filter) = &args.filter {
        for directive in custom_filter.split(',') {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(e) => eprintln!("ignoring invalid log directive {directive:?}: {e}"),
            }
        }
    }

    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_overrides_verbosity() {
        let args = LogArgs {
            quiet: true,
            verbosity: 3,
            ..Default::default()
        };
        assert_eq!(build_filter(&args).to_string(), "error");
    }

    #[test]
    fn test_custom_directives_are_added() {
        let args = LogArgs {
            filter: Some("tether_maintainer=trace,bogus=[".to_string()),
            ..Default::default()
        };
        let filter = build_filter(&args).to_string();
        assert!(filter.contains("tether_maintainer=trace"));
    }
}
