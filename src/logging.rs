use tracing_subscriber::EnvFilter;

use crate::output::OutputMode;

pub const LOG_ENV: &str = "INTELLISTUDY_LOG";

/// Installs the stderr subscriber. `INTELLISTUDY_LOG` wins over the flags.
pub fn init(output: &OutputMode) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level(output)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn default_level(output: &OutputMode) -> &'static str {
    if output.debug {
        "intellistudy=debug"
    } else if output.verbose {
        "intellistudy=info"
    } else if output.quiet || output.json {
        "error"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(verbose: bool, debug: bool) -> OutputMode {
        OutputMode {
            json: false,
            quiet: false,
            verbose,
            debug,
        }
    }

    #[test]
    fn debug_beats_verbose() {
        assert_eq!(default_level(&mode(true, true)), "intellistudy=debug");
        assert_eq!(default_level(&mode(true, false)), "intellistudy=info");
        assert_eq!(default_level(&mode(false, false)), "warn");
    }
}
