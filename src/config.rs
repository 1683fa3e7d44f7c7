use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{EtsError, EtsResult};

#[derive(Clone, Deserialize)]
pub struct Config {
    /// Location of the capabilities document of the implementation under test
    #[serde(default)]
    pub iut: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Size of the sample record set fetched during preconditions
    #[serde(default = "default_max_records")]
    pub max_records: u32,
    /// Test classes to run (all when empty)
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub schemas: SchemaConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

// Custom Debug implementation to prevent credentials in the IUT URL from being logged
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("iut", &self.iut.as_deref().map(redact_userinfo))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_records", &self.max_records)
            .field("classes", &self.classes)
            .field("schemas", &self.schemas)
            .field("report", &self.report)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            iut: None,
            timeout_secs: default_timeout_secs(),
            max_records: default_max_records(),
            classes: Vec::new(),
            schemas: SchemaConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_records() -> u32 {
    10
}

fn redact_userinfo(iut: &str) -> String {
    match Url::parse(iut) {
        Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
            let _ = url.set_username("[REDACTED]");
            let _ = url.set_password(None);
            url.to_string()
        }
        _ => iut.to_string(),
    }
}

/// Local schema resources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaConfig {
    /// CSW 3.0 message schema (cswAll.xsd)
    #[serde(default)]
    pub csw: Option<PathBuf>,
    /// Atom schema; the bundled schema is used when absent
    #[serde(default)]
    pub atom: Option<PathBuf>,
    /// OpenSearch description grammar (RELAX NG); the bundled grammar is used when absent
    #[serde(default)]
    pub osd: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Markdown,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,
    /// Output file; stdout when absent
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("ets").required(false))
            .add_source(
                config::Environment::with_prefix("ETS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("classes")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// The IUT location as an absolute URL.
    pub fn iut_url(&self) -> EtsResult<Url> {
        let iut = self
            .iut
            .as_deref()
            .ok_or_else(|| EtsError::Precondition("No IUT location given".to_string()))?;
        Ok(Url::parse(iut)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
