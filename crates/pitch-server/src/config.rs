//! Server configuration.
//!
//! Read from the TOML file named by `PITCH_CONFIG` (all defaults when
//! unset), then overridden by `PITCH_BIND_ADDR`, `PITCH_DB_URL` and
//! `PITCH_PUBLIC_BASE_URL`.

use pitch_auth::AuthConfig;
use pitch_db::DbConfig;
use serde::Deserialize;

use crate::error::ServerError;

/// Complete server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Origin under which public campaign pages are served.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            public_base_url: default_public_base_url(),
            db: DbConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from `PITCH_CONFIG` and apply environment overrides.
    pub fn load() -> Result<Self, ServerError> {
        let mut config = match std::env::var("PITCH_CONFIG") {
            Ok(path) => {
                let content =
                    std::fs::read_to_string(&path).map_err(|source| ServerError::ConfigRead {
                        path: path.clone(),
                        source,
                    })?;
                Self::from_toml(&content)?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ServerError> {
        Ok(toml::from_str(content)?)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("PITCH_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(url) = lookup("PITCH_DB_URL") {
            self.db.url = url;
        }
        if let Some(base) = lookup("PITCH_PUBLIC_BASE_URL") {
            self.public_base_url = base;
        }
    }

    /// Absolute URL of a project's public page.
    pub fn public_url(&self, slug: &str) -> String {
        format!("{}/p/{slug}", self.public_base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.db.namespace, "pitch");
        assert_eq!(config.auth.cookie_chunk_size, 3180);
    }

    #[test]
    fn nested_sections_override_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            bind_addr = "127.0.0.1:9000"

            [db]
            url = "mem://"

            [auth]
            jwt_issuer = "pitch-staging"
            cookie_secure = false
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.db.url, "mem://");
        assert_eq!(config.db.database, "main");
        assert_eq!(config.auth.jwt_issuer, "pitch-staging");
        assert!(!config.auth.cookie_secure);
    }

    #[test]
    fn environment_wins_over_file() {
        let mut config = ServerConfig::default();
        config.apply_overrides(|key| match key {
            "PITCH_DB_URL" => Some("mem://".into()),
            "PITCH_PUBLIC_BASE_URL" => Some("https://pitch.example/".into()),
            _ => None,
        });
        assert_eq!(config.db.url, "mem://");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.public_url("acme-x1"), "https://pitch.example/p/acme-x1");
    }
}
