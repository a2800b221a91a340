//! Logging initialization for SmartPark binaries
//!
//! The filter is chosen in this priority order:
//! 1. CLI flags (`-v/-q`)
//! 2. `RUST_LOG` environment variable
//! 3. The binary's default filter

use anyhow::Result;
use clap_verbosity_flag::{LogLevel, Verbosity};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with the given verbosity flags and default filter.
///
/// ```no_run
/// use clap::Parser;
/// use clap_verbosity_flag::{InfoLevel, Verbosity};
/// use smartpark_common::logging;
///
/// #[derive(Parser)]
/// struct Args {
///     #[clap(flatten)]
///     verbosity: Verbosity<InfoLevel>,
/// }
///
/// let args = Args::parse();
/// logging::init_logging(&args.verbosity, "smartpark_ledger=info").unwrap();
/// ```
pub fn init_logging<L: LogLevel>(verbosity: &Verbosity<L>, default_filter: &str) -> Result<()> {
    let filter = build_filter(verbosity, default_filter)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .compact(),
        )
        .try_init()?;

    Ok(())
}

fn build_filter<L: LogLevel>(verbosity: &Verbosity<L>, default_filter: &str) -> Result<EnvFilter> {
    let filter = if let Some(log_level) = verbosity.log_level() {
        EnvFilter::try_new(format!("{}", log_level))?
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
    };
    Ok(filter)
}
