use std::path::PathBuf;

use crate::{configuration::Configuration, error::CliError};

pub fn show(configuration: &Configuration) -> Result<(), CliError> {
    configuration.write(Box::new(std::io::stdout()))?;
    Ok(())
}

pub fn path() -> Result<PathBuf, CliError> {
    Ok(Configuration::get_default_configuration_file_path()?)
}

/// Sets one property and writes the configuration to `path`
pub fn set(
    configuration: &mut Configuration,
    name: &str,
    value: &str,
    path: &PathBuf,
) -> Result<(), CliError> {
    configuration.set_property(name, value)?;
    configuration.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{configuration::ConfigurationError, url_resolver::AddressingPolicy};
    use tempfile::TempDir;

    #[test]
    fn test_set_saves_configuration() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.yml");
        let mut configuration = Configuration::default();

        set(&mut configuration, "addressing", "subdomain", &file).unwrap();
        set(&mut configuration, "connection_timeout", "30", &file).unwrap();

        let loaded = Configuration::load_from_file(file).unwrap();
        assert_eq!(loaded.addressing(), AddressingPolicy::Subdomain);
        assert_eq!(loaded.connection_timeout(), Some(std::time::Duration::from_secs(30)));
    }

    #[test]
    fn test_set_rejects_bad_value() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.yml");
        let mut configuration = Configuration::default();

        assert!(matches!(
            set(&mut configuration, "insecure", "maybe", &file),
            Err(CliError::ConfigurationError(
                ConfigurationError::InvalidPropertyValue { .. }
            ))
        ));
        assert!(!file.exists());
    }
}
