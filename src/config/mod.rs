pub mod session;

use std::{
    env,
    net::IpAddr,
    path::{Component, Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::services::password::DEFAULT_ROUNDS;

const MIN_PRODUCTION_SECRET_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("Insecure production configuration: {0}")]
    InsecureProduction(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub environment: Environment,
    /// Decoded session signing secret.
    pub session_secret: Vec<u8>,
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub force_https: bool,
    pub download_path: PathBuf,
    pub static_dir: PathBuf,
    pub pbkdf2_rounds: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("environment", &self.environment)
            .field("session_secret", &"<redacted>")
            .field("database_url", &self.database_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("force_https", &self.force_https)
            .field("download_path", &self.download_path)
            .field("static_dir", &self.static_dir)
            .field("pbkdf2_rounds", &self.pbkdf2_rounds)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, validating it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let environment = get("ENVIRONMENT")
            .map(|value| Environment::parse(&value))
            .unwrap_or(Environment::Development);

        let secret = get("SESSION_SECRET").ok_or(ConfigError::Missing("SESSION_SECRET"))?;

        let host = match get("HOST") {
            Some(value) => value.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    key: "HOST",
                    reason: e.to_string(),
                }
            })?,
            None => IpAddr::from([127, 0, 0, 1]),
        };

        let port = match get("PORT") {
            Some(value) => value.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    key: "PORT",
                    reason: e.to_string(),
                }
            })?,
            None => 8080,
        };

        let pbkdf2_rounds = match get("PBKDF2_ROUNDS") {
            Some(value) => match value.parse::<u32>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        key: "PBKDF2_ROUNDS",
                        reason: "must be greater than zero".to_string(),
                    })
                }
                Ok(rounds) => rounds,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: "PBKDF2_ROUNDS",
                        reason: e.to_string(),
                    })
                }
            },
            None => DEFAULT_ROUNDS,
        };

        let config = AppConfig {
            environment,
            session_secret: decode_secret_bytes(&secret),
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://data/keyhole.db".to_string()),
            host,
            port,
            force_https: get("FORCE_HTTPS")
                .map(|value| env_flag_enabled(&value))
                .unwrap_or(false),
            download_path: get("DOWNLOAD_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("files/cheat_sheet.pdf")),
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
            pbkdf2_rounds,
        };

        config.validate_download_path()?;
        config.validate_production(&secret)?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Everything under `static_dir` is served without a session, so the
    /// protected file must live elsewhere.
    fn validate_download_path(&self) -> Result<(), ConfigError> {
        if resolve_path(&self.download_path).starts_with(resolve_path(&self.static_dir)) {
            return Err(ConfigError::Invalid {
                key: "DOWNLOAD_PATH",
                reason: format!(
                    "{} is inside the public STATIC_DIR {}",
                    self.download_path.display(),
                    self.static_dir.display()
                ),
            });
        }
        Ok(())
    }

    fn validate_production(&self, raw_secret: &str) -> Result<(), ConfigError> {
        if !self.is_production() {
            return Ok(());
        }

        if !self.force_https {
            return Err(ConfigError::InsecureProduction(
                "production requires HTTPS; set FORCE_HTTPS=true".to_string(),
            ));
        }

        if self.session_secret.len() < MIN_PRODUCTION_SECRET_LEN {
            return Err(ConfigError::InsecureProduction(format!(
                "SESSION_SECRET must be at least {} bytes",
                MIN_PRODUCTION_SECRET_LEN
            )));
        }

        let lowered = raw_secret.to_ascii_lowercase();
        if ["example", "changeme", "default"]
            .iter()
            .any(|placeholder| lowered.contains(placeholder))
        {
            return Err(ConfigError::InsecureProduction(
                "SESSION_SECRET appears to be a placeholder value".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_flag_enabled(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "True")
}

/// Absolute form of `path`, following symlinks when it exists.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    resolved
}

/// Accepts base64 secrets and falls back to the raw bytes.
pub fn decode_secret_bytes(secret: &str) -> Vec<u8> {
    STANDARD
        .decode(secret.as_bytes())
        .unwrap_or_else(|_| secret.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let result = AppConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ConfigError::Missing("SESSION_SECRET"))));

        let result = AppConfig::from_lookup(lookup(&[("SESSION_SECRET", "   ")]));
        assert!(matches!(result, Err(ConfigError::Missing("SESSION_SECRET"))));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("SESSION_SECRET", "dev-secret")])).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.session_secret, b"dev-secret".to_vec());
        assert_eq!(config.port, 8080);
        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.pbkdf2_rounds, DEFAULT_ROUNDS);
        assert_eq!(
            config.download_path,
            PathBuf::from("files/cheat_sheet.pdf")
        );
    }

    #[test]
    fn test_base64_secret_is_decoded() {
        let encoded = STANDARD.encode([7u8; 64]);
        let config =
            AppConfig::from_lookup(lookup(&[("SESSION_SECRET", encoded.as_str())])).unwrap();
        assert_eq!(config.session_secret, vec![7u8; 64]);
    }

    #[test]
    fn test_invalid_port_and_rounds() {
        let result = AppConfig::from_lookup(lookup(&[("SESSION_SECRET", "s"), ("PORT", "http")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));

        let result =
            AppConfig::from_lookup(lookup(&[("SESSION_SECRET", "s"), ("PBKDF2_ROUNDS", "0")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "PBKDF2_ROUNDS",
                ..
            })
        ));
    }

    #[test]
    fn test_download_path_inside_static_dir_is_rejected() {
        for download_path in [
            "static/files/cheat_sheet.pdf",
            "./static/cheat_sheet.pdf",
            "files/../static/cheat_sheet.pdf",
        ] {
            let result = AppConfig::from_lookup(lookup(&[
                ("SESSION_SECRET", "s"),
                ("DOWNLOAD_PATH", download_path),
            ]));
            assert!(
                matches!(result, Err(ConfigError::Invalid { key: "DOWNLOAD_PATH", .. })),
                "{download_path} should be rejected"
            );
        }

        let result = AppConfig::from_lookup(lookup(&[
            ("SESSION_SECRET", "s"),
            ("STATIC_DIR", "public"),
            ("DOWNLOAD_PATH", "public/secret.pdf"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "DOWNLOAD_PATH", .. })
        ));
    }

    #[test]
    fn test_download_path_beside_static_dir_is_accepted() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SESSION_SECRET", "s"),
            ("DOWNLOAD_PATH", "static-files/cheat_sheet.pdf"),
        ]))
        .unwrap();
        assert_eq!(
            config.download_path,
            PathBuf::from("static-files/cheat_sheet.pdf")
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config =
            AppConfig::from_lookup(lookup(&[("SESSION_SECRET", "super-secret-value")])).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
