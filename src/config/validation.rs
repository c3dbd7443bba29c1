use crate::config::types::{Config, CrawlerConfig, FetcherConfig};
use crate::ConfigError;

/// Upper bound on the worker count accepted from configuration
pub const MAX_WORKERS: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.results_buffer < 1 {
        return Err(ConfigError::Validation(format!(
            "results-buffer must be >= 1, got {}",
            config.results_buffer
        )));
    }

    if config.link_batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "link-batch-size must be >= 1, got {}",
            config.link_batch_size
        )));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_workers_bounds() {
        let mut config = Config::default();

        config.crawler.workers = 0;
        assert!(validate(&config).is_err());

        config.crawler.workers = MAX_WORKERS + 1;
        assert!(validate(&config).is_err());

        config.crawler.workers = 1;
        assert!(validate(&config).is_ok());

        config.crawler.workers = MAX_WORKERS;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_buffers() {
        let mut config = Config::default();
        config.crawler.results_buffer = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.link_batch_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_fetcher() {
        let mut config = Config::default();
        config.fetcher.user_agent = "   ".to_string();
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.fetcher.timeout_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.fetcher.connect_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }
}
