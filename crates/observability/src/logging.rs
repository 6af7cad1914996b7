//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Output shape of the process log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line, for collectors.
    Json,
    /// Human-readable multi-line output for local runs.
    #[default]
    Pretty,
}

impl LogFormat {
    /// JSON in production, pretty everywhere else.
    pub fn for_environment(production: bool) -> Self {
        if production { Self::Json } else { Self::Pretty }
    }
}

/// Install the global subscriber. The filter comes from `RUST_LOG`
/// (default `info`).
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .with_target(true)
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(?format, "logging initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_environment() {
        assert_eq!(LogFormat::for_environment(true), LogFormat::Json);
        assert_eq!(LogFormat::for_environment(false), LogFormat::Pretty);
    }

    #[test]
    fn init_twice_is_harmless() {
        init(LogFormat::Pretty);
        init(LogFormat::Json);
    }
}
