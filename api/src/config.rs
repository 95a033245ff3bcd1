use std::{net::SocketAddr, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Env {
    Dev,
    Staging,
    Production,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub env: Env,
    pub bind_addr: SocketAddr,
    /// PostgreSQL connection string. Without it the in-memory store is used.
    pub database_url: Option<String>,
    pub database_max_connections: usize,
    /// Approval flag given to freshly submitted comments.
    pub comments_approved_by_default: bool,
    pub articles_per_page: i64,
    pub summary_words: usize,
    /// Empty means any origin in dev and none elsewhere.
    pub cors_allowed_origins: Vec<String>,
    pub seed_demo_data: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            env: Env::Dev,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            database_max_connections: 10,
            comments_approved_by_default: false,
            articles_per_page: 10,
            summary_words: 30,
            cors_allowed_origins: vec![],
            seed_demo_data: false,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Could not get the environment variable `{0}` due to unicode error")]
    NotUnicode(String),

    #[error("Environment variable `{key}` has an invalid value `{value}`")]
    Invalid { key: String, value: String },
}

fn var(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(env) => Ok(Some(env)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(key.into())),
    }
}

fn parse<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: key.into(),
                value,
            })
        }
        _ => Ok(default),
    }
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            key: key.into(),
            value: other.into(),
        }),
    }
}

impl ServerConfig {
    pub fn new_from_env() -> Result<Self, ConfigError> {
        let mut values = Vec::new();
        for key in [
            "ENVIRONMENT",
            "BIND_ADDR",
            "DATABASE_URL",
            "DATABASE_MAX_CONNECTIONS",
            "COMMENTS_APPROVED_BY_DEFAULT",
            "ARTICLES_PER_PAGE",
            "SUMMARY_WORDS",
            "CORS_ALLOWED_ORIGINS",
            "SEED_DEMO_DATA",
        ] {
            if let Some(value) = var(key)? {
                values.push((key, value));
            }
        }

        Self::from_lookup(|key| {
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        })
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let env = match lookup("ENVIRONMENT").as_deref() {
            Some("production") => Env::Production,
            Some("staging") => Env::Staging,
            Some("dev") | None => Env::Dev,
            Some(other) => {
                tracing::warn!(environment = other, "Unknown ENVIRONMENT, assuming dev");
                Env::Dev
            }
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let articles_per_page = parse(
            "ARTICLES_PER_PAGE",
            lookup("ARTICLES_PER_PAGE"),
            defaults.articles_per_page,
        )?;
        if articles_per_page < 1 {
            return Err(ConfigError::Invalid {
                key: "ARTICLES_PER_PAGE".into(),
                value: articles_per_page.to_string(),
            });
        }

        let database_max_connections = parse(
            "DATABASE_MAX_CONNECTIONS",
            lookup("DATABASE_MAX_CONNECTIONS"),
            defaults.database_max_connections,
        )?;
        if database_max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS".into(),
                value: "0".into(),
            });
        }

        Ok(ServerConfig {
            env,
            bind_addr: parse("BIND_ADDR", lookup("BIND_ADDR"), defaults.bind_addr)?,
            seed_demo_data: parse_bool(
                "SEED_DEMO_DATA",
                lookup("SEED_DEMO_DATA"),
                env == Env::Dev && database_url.is_none(),
            )?,
            database_url,
            database_max_connections,
            comments_approved_by_default: parse_bool(
                "COMMENTS_APPROVED_BY_DEFAULT",
                lookup("COMMENTS_APPROVED_BY_DEFAULT"),
                defaults.comments_approved_by_default,
            )?,
            articles_per_page,
            summary_words: parse("SUMMARY_WORDS", lookup("SUMMARY_WORDS"), defaults.summary_words)?,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.env, Env::Dev);
        assert!(config.database_url.is_none());
        assert!(!config.comments_approved_by_default);
        assert_eq!(config.articles_per_page, 10);
        assert_eq!(config.summary_words, 30);
        // dev without a database gets demo content
        assert!(config.seed_demo_data);
    }

    #[test]
    fn reads_all_variables() {
        let config = config_from(&[
            ("ENVIRONMENT", "production"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://news@localhost/news"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("COMMENTS_APPROVED_BY_DEFAULT", "true"),
            ("ARTICLES_PER_PAGE", "5"),
            ("SUMMARY_WORDS", "12"),
            ("CORS_ALLOWED_ORIGINS", "https://news.test, https://admin.news.test,"),
        ])
        .unwrap();

        assert_eq!(config.env, Env::Production);
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.database_max_connections, 4);
        assert!(config.comments_approved_by_default);
        assert_eq!(config.articles_per_page, 5);
        assert_eq!(config.summary_words, 12);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://news.test", "https://admin.news.test"]
        );
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(
            config_from(&[("ARTICLES_PER_PAGE", "many")]).unwrap_err(),
            ConfigError::Invalid {
                key: "ARTICLES_PER_PAGE".into(),
                value: "many".into()
            }
        );
        assert!(config_from(&[("ARTICLES_PER_PAGE", "0")]).is_err());
        assert!(config_from(&[("COMMENTS_APPROVED_BY_DEFAULT", "maybe")]).is_err());
        assert!(config_from(&[("BIND_ADDR", "localhost")]).is_err());
    }
}
