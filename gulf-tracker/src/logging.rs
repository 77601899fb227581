//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

const CRATE_TARGET: &str = "gulf_tracker";

/// Filter directives for a logging config.
///
/// The crate logs at the configured level (`debug` when verbose), the quiet
/// targets at `warn`, and everything else at `warn`.
pub fn filter_directives(config: &LoggingConfig, verbose: bool) -> String {
    let level = if verbose { "debug" } else { config.level.trim() };
    let mut directives = vec!["warn".to_string(), format!("{}={}", CRATE_TARGET, level)];
    directives.extend(
        config
            .quiet_targets
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| format!("{}=warn", t)),
    );
    directives.join(",")
}

/// Install the global subscriber, writing to stderr. `RUST_LOG` takes
/// precedence when set.
pub fn init(
    config: &LoggingConfig,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(config, verbose))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        let directives = filter_directives(&LoggingConfig::default(), false);
        assert!(directives.starts_with("warn,gulf_tracker=info"));
        assert!(directives.contains("reqwest=warn"));
        assert!(directives.contains("hyper=warn"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_verbose_overrides_level() {
        let config = LoggingConfig {
            level: "error".to_string(),
            quiet_targets: vec![" h2 ".to_string(), String::new()],
        };
        assert_eq!(filter_directives(&config, true), "warn,gulf_tracker=debug,h2=warn");
        assert_eq!(filter_directives(&config, false), "warn,gulf_tracker=error,h2=warn");
    }
}
