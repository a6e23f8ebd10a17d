/// Worker configuration
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 2)
/// - `REMINDER_INTERVAL_SECS`: Seconds between sweeps (default: 86400)
/// - `MAIL_PROVIDER`, `MAIL_API_URL`, `MAIL_API_KEY`, `MAIL_FROM`,
///   `ORGANIZATION_NAME`: same as the API server

use std::env;
use std::time::Duration;

use cluster_shared::notify::MailConfig;

/// One sweep a day
pub const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 86_400;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub reminder_interval: Duration,
    pub mail: MailConfig,
}

/// Parses a sweep interval in seconds; zero is rejected
pub fn parse_interval(raw: Option<&str>) -> anyhow::Result<Duration> {
    let secs = match raw {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("REMINDER_INTERVAL_SECS is invalid: {}", e))?,
        None => DEFAULT_REMINDER_INTERVAL_SECS,
    };

    if secs == 0 {
        anyhow::bail!("REMINDER_INTERVAL_SECS must be positive");
    }

    Ok(Duration::from_secs(secs))
}

impl WorkerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?,
            Err(_) => 2,
        };

        Ok(Self {
            database_url,
            max_connections,
            reminder_interval: parse_interval(env::var("REMINDER_INTERVAL_SECS").ok().as_deref())?,
            mail: MailConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval(None).unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_interval(Some(" 3600 ")).unwrap(), Duration::from_secs(3600));
        assert!(parse_interval(Some("0")).is_err());
        assert!(parse_interval(Some("daily")).is_err());
        assert!(parse_interval(Some("-5")).is_err());
    }
}
