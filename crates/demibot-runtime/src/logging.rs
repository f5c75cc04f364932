//! Diagnostic logging setup.
//!
//! Everything in demibot logs through `tracing`; this module installs the
//! subscriber described by the `[logging]` section. The chat log
//! (connect/join/nick-change entries) is separate and lives in
//! [`crate::chatlog`].
//!
//! ```rust,ignore
//! use demibot_runtime::{config::load_config, logging};
//!
//! let config = load_config()?;
//! logging::init_from_config(&config.logging);
//!
//! // or, with extra filter directives:
//! logging::LoggingBuilder::from_config(&config.logging)
//!     .directive("demibot_framework=trace")
//!     .try_init()?;
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{Subscriber, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig};

/// Installs the subscriber described by `config`.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Subscriber settings taken from [`LoggingConfig`].
#[derive(Debug)]
pub struct LoggingBuilder {
    level: tracing::Level,
    directives: Vec<String>,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
    thread_ids: bool,
    file_location: bool,
}

impl LoggingBuilder {
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut filters: Vec<_> = config.filters.iter().collect();
        filters.sort_by(|a, b| a.0.cmp(b.0));

        Self {
            level: config.level.to_tracing_level(),
            directives: filters
                .into_iter()
                .map(|(target, level)| format!("{target}={level}"))
                .collect(),
            format: config.format,
            output: config.output,
            file_path: config.file_path.clone(),
            thread_ids: config.thread_ids,
            file_location: config.file_location,
        }
    }

    /// Adds a filter directive, e.g. `demibot_runtime=debug`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    /// `RUST_LOG` replaces the configured base level when set; per-target
    /// directives apply on top either way.
    fn filter(&self) -> EnvFilter {
        let base = self.level.to_string().to_lowercase();
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&base));
        for directive in &self.directives {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }
        filter
    }

    fn writer(&self) -> BoxMakeWriter {
        match (self.output, &self.file_path) {
            (LogOutput::Stdout, _) => BoxMakeWriter::new(std::io::stdout),
            (LogOutput::Stderr, _) => BoxMakeWriter::new(std::io::stderr),
            (LogOutput::File, Some(path)) => {
                let dir = path
                    .parent()
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                let name = path
                    .file_name()
                    .unwrap_or_else(|| OsStr::new("demibot-debug.log"));
                BoxMakeWriter::new(tracing_appender::rolling::never(dir, name))
            }
            (LogOutput::File, None) => {
                warn!("File output requested without a file path, logging to stdout");
                BoxMakeWriter::new(std::io::stdout)
            }
        }
    }

    fn layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_writer(self.writer())
            .with_thread_ids(self.thread_ids)
            .with_file(self.file_location)
            .with_line_number(self.file_location);

        match self.format {
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Full => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            _ => layer.compact().boxed(),
        }
    }

    /// Installs the global subscriber. Fails if one is already installed.
    pub fn try_init(self) -> Result<(), TryInitError> {
        tracing_subscriber::registry()
            .with(self.layer())
            .with(self.filter())
            .try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_from_config_collects_filters() {
        let mut config = LoggingConfig {
            level: LogLevel::Debug,
            ..Default::default()
        };
        config
            .filters
            .insert("demibot_framework".to_string(), LogLevel::Trace);
        config.filters.insert("figment".to_string(), LogLevel::Warn);

        let builder = LoggingBuilder::from_config(&config).directive("tower=off");
        assert_eq!(builder.level, tracing::Level::DEBUG);
        assert_eq!(
            builder.directives,
            vec!["demibot_framework=trace", "figment=warn", "tower=off"]
        );
    }

    // The only test in this crate that installs a global subscriber.
    #[test]
    fn test_file_output_installs_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        let config = LoggingConfig {
            output: LogOutput::File,
            file_path: Some(path.clone()),
            ..Default::default()
        };

        assert!(LoggingBuilder::from_config(&config).try_init().is_ok());
        assert!(path.exists());
        assert!(LoggingBuilder::from_config(&config).try_init().is_err());
        init_from_config(&config);
    }
}
