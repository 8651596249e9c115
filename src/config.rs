use crate::cli::{Args, ColorChoice};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

pub struct AppConfig {
    pub color_enabled: bool,
    pub verbose: bool,
    pub check: bool,
    pub print_result: bool,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Self {
        let color_enabled = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => atty::is(atty::Stream::Stderr) && atty::is(atty::Stream::Stdout),
        };

        AppConfig {
            color_enabled,
            verbose: args.verbose,
            check: args.check,
            print_result: args.print_result,
        }
    }
}

/// Install the log subscriber. Safe to call more than once.
///
/// `verbose` forces `betty=debug`; otherwise logging is on only when
/// `RUST_LOG` is set. Events go to stderr so program output stays clean.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = if verbose {
            EnvFilter::new("betty=debug")
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .init();
    });
}
