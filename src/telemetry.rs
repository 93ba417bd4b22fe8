use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Where log output ends up, which decides whether colors make sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// CloudWatch, through the Lambda runtime's stdout capture.
    Lambda,
    /// A developer terminal.
    Terminal,
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set, otherwise `log_level` (e.g. `INFO`, `debug`) is used.
pub fn set_up_tracing(log_level: &str, output: LogOutput) -> Result<()> {
    let with_color = match output {
        LogOutput::Lambda => false,
        #[cfg(windows)]
        LogOutput::Terminal => nu_ansi_term::enable_ansi_support().is_ok(),
        #[cfg(not(windows))]
        LogOutput::Terminal => true,
    };

    let fmt_layer = fmt::layer().with_ansi(with_color).with_target(false);
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(log_level)))?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Maps the conventional upper-case level names onto filter directives.
fn filter_directive(log_level: &str) -> String {
    match log_level.trim().to_ascii_lowercase().as_str() {
        "" => "info".to_string(),
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        level => level.to_string(),
    }
}
