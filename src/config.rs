use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_LOG_LEVEL: &str = "INFO";
pub const DEFAULT_STREAM_NAME: &str = "data_pipe";
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
pub const DEFAULT_SAFETY_MARGIN_MS: u64 = 100;
pub const DEFAULT_MAX_RETRY_ELAPSED_MS: u64 = 2000;
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_SINK_LATENCY_MS: u64 = 5;
pub const DEFAULT_SINK_SHARDS: u32 = 4;

/// Settings for the event producer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerSettings {
    pub log_level: String,
    pub stream_name: String,
    pub region: String,
    /// The loop stops once the remaining invocation time drops to this.
    pub safety_margin: Duration,
    /// Upper bound on time spent retrying a single transient submission error.
    pub max_retry_elapsed: Duration,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            stream_name: DEFAULT_STREAM_NAME.to_string(),
            region: DEFAULT_AWS_REGION.to_string(),
            safety_margin: Duration::from_millis(DEFAULT_SAFETY_MARGIN_MS),
            max_retry_elapsed: Duration::from_millis(DEFAULT_MAX_RETRY_ELAPSED_MS),
        }
    }
}

impl ProducerSettings {
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        settings.apply_env()?;
        Ok(settings)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Ok(name) = env::var("STREAM_NAME") {
            self.stream_name = name;
        }
        if let Ok(region) = env::var("AWS_REGION") {
            self.region = region;
        }
        if let Some(ms) = parse_var::<u64>("PRODUCER_SAFETY_MARGIN_MS")? {
            self.safety_margin = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>("PRODUCER_MAX_RETRY_ELAPSED_MS")? {
            self.max_retry_elapsed = Duration::from_millis(ms);
        }
        Ok(())
    }
}

/// Settings for the record transformer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformerSettings {
    pub log_level: String,
}

impl Default for TransformerSettings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl TransformerSettings {
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        if let Ok(level) = env::var("LOG_LEVEL") {
            settings.log_level = level;
        }
        Ok(settings)
    }
}

/// Settings for the local invocation server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub producer: ProducerSettings,
    pub port: u16,
    pub sink_latency: Duration,
    pub sink_shards: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            producer: ProducerSettings::default(),
            port: DEFAULT_SERVER_PORT,
            sink_latency: Duration::from_millis(DEFAULT_SINK_LATENCY_MS),
            sink_shards: DEFAULT_SINK_SHARDS,
        }
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self> {
        let mut settings = Self {
            producer: ProducerSettings::from_env()?,
            ..Self::default()
        };
        if let Some(port) = parse_var::<u16>("LOCAL_SERVER_PORT")? {
            settings.port = port;
        }
        if let Some(ms) = parse_var::<u64>("LOCAL_SINK_LATENCY_MS")? {
            settings.sink_latency = Duration::from_millis(ms);
        }
        if let Some(shards) = parse_var::<u32>("LOCAL_SINK_SHARDS")? {
            anyhow::ensure!(shards > 0, "LOCAL_SINK_SHARDS must be at least 1");
            settings.sink_shards = shards;
        }
        Ok(settings)
    }
}

/// Reads an optional variable, failing if it is set but does not parse.
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {name}: '{value}'")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ProducerSettings::default();
        assert_eq!(settings.stream_name, "data_pipe");
        assert_eq!(settings.region, "us-east-1");
        assert_eq!(settings.safety_margin, Duration::from_millis(100));
        assert_eq!(TransformerSettings::default().log_level, "INFO");
        assert_eq!(ServerSettings::default().port, 3000);
    }

    #[test]
    fn test_parse_var() {
        // Variable names are unique to this test so parallel tests don't interfere.
        unsafe {
            env::set_var("KSP_TEST_PARSE_OK", " 250 ");
            env::set_var("KSP_TEST_PARSE_BAD", "soon");
        }
        assert_eq!(parse_var::<u64>("KSP_TEST_PARSE_OK").unwrap(), Some(250));
        assert!(parse_var::<u64>("KSP_TEST_PARSE_BAD").is_err());
        assert_eq!(parse_var::<u64>("KSP_TEST_PARSE_MISSING").unwrap(), None);
    }
}
