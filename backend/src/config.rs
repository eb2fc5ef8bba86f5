//! Server configuration.
//!
//! Values are layered: built-in defaults, then the YAML file named on the
//! command line (missing files are skipped), then `REGISTRY_`-prefixed
//! environment variables with `__` separating nested keys.
//!
//! ```text
//! REGISTRY_PORT=8080
//! REGISTRY_ADMIN__PASSWORD=change-me
//! ```

use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::domain::registration_form::DEFAULT_MAX_RECEIPT_BYTES;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Student registry API server")]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short = 'f', long, env = "REGISTRY_CONFIG", default_value = "config.yaml")]
    pub config: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite file, or ":memory:" for a throwaway database
    pub database_path: String,
    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,
    /// Name reported by the health endpoint
    pub service_name: String,
    /// Administrator created on first start
    pub admin: AdminSeedConfig,
    /// Largest accepted payment receipt, decoded
    pub max_receipt_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSeedConfig {
    pub username: String,
    pub password: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            database_path: "registry.db".to_string(),
            cors_origins: vec!["http://localhost:8080".to_string()],
            service_name: "Tutoring Registry API".to_string(),
            admin: AdminSeedConfig::default(),
            max_receipt_bytes: DEFAULT_MAX_RECEIPT_BYTES,
        }
    }
}

impl Default for AdminSeedConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin123".to_string(),
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        Self::figment(args).extract()
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("REGISTRY_").split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
        }
    }

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config, Config::default());
            assert_eq!(config.bind_address(), "127.0.0.1:5000");
            assert_eq!(config.admin.username, "admin");
            Ok(())
        });
    }

    #[test]
    fn test_yaml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
host: 0.0.0.0
port: 8081
database_path: ":memory:"
cors_origins:
  - http://localhost:3000
  - https://registry.example.com
admin:
  username: owner
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.port, 8081);
            assert_eq!(config.database_path, ":memory:");
            assert_eq!(config.cors_origins.len(), 2);
            assert_eq!(config.admin.username, "owner");
            // Untouched nested default
            assert_eq!(config.admin.password, "admin123");
            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 8081\n")?;
            jail.set_env("REGISTRY_PORT", "9090");
            jail.set_env("REGISTRY_ADMIN__PASSWORD", "s3cret");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.port, 9090);
            assert_eq!(config.admin.password, "s3cret");
            Ok(())
        });
    }
}
