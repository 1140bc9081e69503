use crate::url_resolver::AddressingPolicy;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use serde_yaml;
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::Write,
    path::PathBuf,
    time::Duration,
};
use tracing::debug;

pub const DEFAULT_APPLICATION_ID: &str = "personium";
pub const DEFAULT_CONFIGURATION_FILE_NAME: &str = "config.yml";
pub const DEFAULT_BASE_URL: &str = "https://localhost/";

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("failed to resolve the configuration directory")]
    FailedToFindConfigurationDirectory,
    #[error("failed to load configuration data, because of: {cause:?}")]
    FailedToLoadData {
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to write configuration data to file, because of: {cause:?}")]
    FailedToWriteData {
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("malformed URL {url:?}: {cause}")]
    MalformedUrl { url: String, cause: String },
    #[error("URL {url:?} has no host component")]
    MissingHost { url: String },
    #[error("unknown addressing policy {value:?}, expected one of {expected:?}")]
    UnknownAddressingPolicy {
        value: String,
        expected: Vec<&'static str>,
    },
    #[error("unknown configuration property {name:?}")]
    UnknownProperty { name: String },
    #[error("invalid value {value:?} for property {name:?}")]
    InvalidPropertyValue { name: String, value: String },
}

/// Settings for the unit a client talks to.
///
/// `insecure` replaces a process-wide TLS switch: it is read once when the
/// transport is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    base_url: String,
    addressing: AddressingPolicy,
    /// Seconds; 0 means no timeout.
    connection_timeout: u64,
    insecure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    personium_version: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    default_headers: BTreeMap<String, String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            addressing: AddressingPolicy::default(),
            connection_timeout: 0,
            insecure: false,
            personium_version: None,
            default_headers: BTreeMap::new(),
        }
    }
}

impl Configuration {
    pub fn new(base_url: &str, addressing: AddressingPolicy) -> Self {
        Self {
            base_url: base_url.to_string(),
            addressing,
            ..Default::default()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn addressing(&self) -> AddressingPolicy {
        self.addressing
    }

    pub fn connection_timeout(&self) -> Option<Duration> {
        match self.connection_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn insecure(&self) -> bool {
        self.insecure
    }

    pub fn personium_version(&self) -> Option<&str> {
        self.personium_version.as_deref()
    }

    pub fn default_headers(&self) -> &BTreeMap<String, String> {
        &self.default_headers
    }

    pub fn set_base_url(&mut self, base_url: &str) {
        self.base_url = base_url.to_string();
    }

    pub fn set_addressing(&mut self, addressing: AddressingPolicy) {
        self.addressing = addressing;
    }

    pub fn set_connection_timeout(&mut self, secs: u64) {
        self.connection_timeout = secs;
    }

    pub fn set_insecure(&mut self, insecure: bool) {
        self.insecure = insecure;
    }

    pub fn set_personium_version(&mut self, version: Option<String>) {
        self.personium_version = version;
    }

    pub fn set_default_header(&mut self, name: &str, value: &str) {
        self.default_headers
            .insert(name.to_string(), value.to_string());
    }

    /// Sets a property by its configuration file key.
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<(), ConfigurationError> {
        let invalid = || ConfigurationError::InvalidPropertyValue {
            name: name.to_string(),
            value: value.to_string(),
        };

        match name {
            "base_url" => self.set_base_url(value),
            "addressing" => {
                let policy = value.parse::<AddressingPolicy>().map_err(|_| {
                    ConfigurationError::UnknownAddressingPolicy {
                        value: value.to_string(),
                        expected: AddressingPolicy::names(),
                    }
                })?;
                self.set_addressing(policy);
            }
            "connection_timeout" => {
                self.set_connection_timeout(value.parse::<u64>().map_err(|_| invalid())?)
            }
            "insecure" => self.set_insecure(value.parse::<bool>().map_err(|_| invalid())?),
            "personium_version" => {
                self.set_personium_version(Some(value.to_string()).filter(|v| !v.is_empty()))
            }
            _ => {
                return Err(ConfigurationError::UnknownProperty {
                    name: name.to_string(),
                })
            }
        }

        Ok(())
    }

    pub fn get_default_configuration_file_path() -> Result<PathBuf, ConfigurationError> {
        if let Ok(config_dir_str) = std::env::var("PERSONIUM_CONFIG_DIR") {
            let mut config_path = PathBuf::from(config_dir_str);
            config_path.push(DEFAULT_CONFIGURATION_FILE_NAME);
            return Ok(config_path);
        }

        match config_dir() {
            Some(configuration_directory) => {
                let mut default_config_file_path = configuration_directory;
                default_config_file_path.push(DEFAULT_APPLICATION_ID);
                default_config_file_path.push(DEFAULT_CONFIGURATION_FILE_NAME);

                Ok(default_config_file_path)
            }
            None => Err(ConfigurationError::FailedToFindConfigurationDirectory),
        }
    }

    pub fn load_default() -> Result<Configuration, ConfigurationError> {
        let default_file_path = Configuration::get_default_configuration_file_path()?;
        debug!("Loading configuration from {}...", default_file_path.display());
        Configuration::load_from_file(default_file_path)
    }

    /// Load default configuration, falling back to defaults when no file exists yet
    pub fn load_or_create_default() -> Result<Configuration, ConfigurationError> {
        let default_file_path = Configuration::get_default_configuration_file_path()?;
        debug!(
            "Loading or creating configuration from {}...",
            default_file_path.display()
        );

        match Configuration::load_from_file(default_file_path.clone()) {
            Ok(config) => Ok(config),
            Err(ConfigurationError::FailedToLoadData { cause })
                if cause
                    .downcast_ref::<std::io::Error>()
                    .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound) =>
            {
                debug!("Configuration file not found, using default configuration");
                Ok(Configuration::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn load_from_file(path: PathBuf) -> Result<Configuration, ConfigurationError> {
        let content = fs::read_to_string(path).map_err(|cause| {
            ConfigurationError::FailedToLoadData {
                cause: Box::new(cause),
            }
        })?;
        serde_yaml::from_str(&content).map_err(|cause| ConfigurationError::FailedToLoadData {
            cause: Box::new(cause),
        })
    }

    pub fn write(&self, writer: Box<dyn Write>) -> Result<(), ConfigurationError> {
        serde_yaml::to_writer(writer, self)
            .map_err(|e| ConfigurationError::FailedToWriteData { cause: Box::new(e) })
    }

    pub fn save(&self, path: &PathBuf) -> Result<(), ConfigurationError> {
        // first check if the parent directory exists and try to create it if not
        match path.parent() {
            Some(parent) => {
                fs::create_dir_all(parent)
                    .map_err(|_| ConfigurationError::FailedToFindConfigurationDirectory)?;
            }
            None => return Err(ConfigurationError::FailedToFindConfigurationDirectory),
        }

        let file = File::create(path)
            .map_err(|e| ConfigurationError::FailedToWriteData { cause: Box::new(e) })?;
        self.write(Box::new(file))
    }

    pub fn save_to_default(&self) -> Result<(), ConfigurationError> {
        self.save(&Self::get_default_configuration_file_path()?)
    }
}
