use log::{LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

fn level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    }
}

/// Log to the terminal, `Warn` and up.
///
/// Pass `verbose` to include the per-request `Info` lines.
pub fn init(verbose: bool) -> Result<(), SetLoggerError> {
    TermLogger::init(
        level(verbose),
        ConfigBuilder::default()
            .add_filter_allow_str("agentpass")
            .build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
}
