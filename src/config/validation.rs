use crate::config::types::{ArchiveConfig, Config, CrawlerConfig, SiteConfig, UserAgentConfig};
use crate::url::SiteScope;
use crate::ConfigError;
use chrono::{NaiveDate, NaiveDateTime};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_archive_config(&config.archive)?;

    if config.output.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the mirrored site definition
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_domain_string(&config.domain)?;
    validate_snapshot(&config.snapshot)?;

    let entry = parse_http_url("entry-url", &config.entry_url)?;
    let scope = SiteScope::new(&config.domain);
    if !scope.contains_url(&entry) {
        return Err(ConfigError::Validation(format!(
            "entry-url '{}' is not inside domain '{}'",
            config.entry_url, config.domain
        )));
    }

    Ok(())
}

/// Validates crawler limits
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 || config.max_pages > 100_000 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be between 1 and 100000, got {}",
            config.max_pages
        )));
    }

    if config.asset_workers < 1 || config.asset_workers > 64 {
        return Err(ConfigError::Validation(format!(
            "asset-workers must be between 1 and 64, got {}",
            config.asset_workers
        )));
    }

    if config.request_timeout < 1 || config.request_timeout > 600 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be between 1 and 600 seconds, got {}",
            config.request_timeout
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates the archive endpoints
fn validate_archive_config(config: &ArchiveConfig) -> Result<(), ConfigError> {
    parse_http_url("index-endpoint", &config.index_endpoint)?;
    parse_http_url("replay-endpoint", &config.replay_endpoint)?;
    Ok(())
}

/// Parses a URL that must use the http or https scheme
fn parse_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(url)
}

/// Validates an archive timestamp: 8 to 14 digits forming a real date
fn validate_snapshot(snapshot: &str) -> Result<(), ConfigError> {
    if snapshot.len() < 8 || snapshot.len() > 14 || !snapshot.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ConfigError::Validation(format!(
            "snapshot must be 8 to 14 digits (YYYYMMDD[hhmmss]), got '{}'",
            snapshot
        )));
    }

    NaiveDate::parse_from_str(&snapshot[..8], "%Y%m%d").map_err(|e| {
        ConfigError::Validation(format!("snapshot '{}' is not a valid date: {}", snapshot, e))
    })?;

    if snapshot.len() == 14 {
        NaiveDateTime::parse_from_str(snapshot, "%Y%m%d%H%M%S").map_err(|e| {
            ConfigError::Validation(format!("snapshot '{}' is not a valid time: {}", snapshot, e))
        })?;
    }

    Ok(())
}

/// Validates a bare domain string (no scheme, path or wildcard)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.org')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::OutputConfig;

    fn valid_config() -> Config {
        Config {
            site: SiteConfig {
                domain: "example.org".to_string(),
                entry_url: "http://www.example.org/".to_string(),
                snapshot: "20170509211847".to_string(),
                title: None,
            },
            crawler: CrawlerConfig::default(),
            user_agent: UserAgentConfig {
                crawler_name: "TestMirror".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: None,
                contact_email: Some("admin@example.com".to_string()),
            },
            archive: ArchiveConfig::default(),
            output: OutputConfig {
                directory: "archive".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_domain_string() {
        assert!(validate_domain_string("example.org").is_ok());
        assert!(validate_domain_string("sub.example.org").is_ok());

        assert!(validate_domain_string("").is_err());
        assert!(validate_domain_string("*.example.org").is_err());
        assert!(validate_domain_string("example").is_err());
        assert!(validate_domain_string(".example.org").is_err());
        assert!(validate_domain_string("example.org.").is_err());
        assert!(validate_domain_string("http://example.org").is_err());
    }

    #[test]
    fn test_validate_snapshot() {
        assert!(validate_snapshot("20170509211847").is_ok());
        assert!(validate_snapshot("20170509").is_ok());
        assert!(validate_snapshot("2017050921").is_ok());

        assert!(validate_snapshot("2017").is_err());
        assert!(validate_snapshot("2017-05-09").is_err());
        assert!(validate_snapshot("20171340").is_err());
        assert!(validate_snapshot("20170509256199").is_err());
        assert!(validate_snapshot("201705092118470").is_err());
    }

    #[test]
    fn test_entry_url_must_be_in_scope() {
        let mut config = valid_config();
        config.site.entry_url = "http://other.org/".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));

        config.site.entry_url = "ftp://www.example.org/".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_crawler_limits() {
        let mut config = valid_config();
        config.crawler.max_pages = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.crawler.asset_workers = 65;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.crawler.request_timeout = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("admin@example.com").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("admin@").is_err());
        assert!(validate_email("admin@localhost").is_err());
    }

    #[test]
    fn test_endpoints_must_be_http() {
        let mut config = valid_config();
        config.archive.replay_endpoint = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_empty_output_directory() {
        let mut config = valid_config();
        config.output.directory = "  ".to_string();
        assert!(validate(&config).is_err());
    }
}
