use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Overrides `--log-level` with a full filter directive, e.g.
/// `lspwire_server=debug,info`.
pub const LOG_FILTER_ENV: &str = "LSPWIRE_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn filter_for(level: LogLevel, directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(LevelFilter::from(level).into()))
}

pub fn init_logging(format: LogFormat, level: LogLevel) {
    let directive = std::env::var(LOG_FILTER_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter_for(level, directive.as_deref()))
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_flag_used_without_directive() {
        let filter = filter_for(LogLevel::Warn, None);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn directive_overrides_level() {
        let filter = filter_for(LogLevel::Error, Some("lspwire_server=debug"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn unparseable_directive_falls_back_to_level() {
        let filter = filter_for(LogLevel::Info, Some("lspwire=loud"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}
