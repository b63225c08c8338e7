//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::HostConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<HostConfig, ConfigError> {
    let config: HostConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:0"

            [observability]
            log_format = "json"

            [[routes]]
            name = "by-id"
            template = "users/{id}"

            [[routes]]
            name = "me"
            template = "users/me"
            methods = ["get"]
            target = "GetCurrentUser"

            [[groups]]
            name = "admin"

            [[groups.routes]]
            name = "admin-home"
            template = "admin"

            [[groups.groups]]
            name = "admin-users"

            [[groups.groups.routes]]
            name = "admin-user"
            template = "admin/users/{id:int}"
            "#,
        )
        .unwrap();

        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(config.reorder.enabled);
        assert_eq!(config.routes[1].target(), "GetCurrentUser");
        assert_eq!(config.routes[0].target(), "by-id");

        let names: Vec<_> = config.all_routes().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["by-id", "me", "admin-home", "admin-user"]);
    }

    #[test]
    fn test_parse_error_and_validation_error() {
        assert!(matches!(parse_config("routes = 5"), Err(ConfigError::Parse(_))));

        let err = parse_config(
            r#"
            [[routes]]
            name = "bad"
            template = "{*rest}/tail"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().starts_with("Validation failed: route 'bad'"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/route-priority.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
