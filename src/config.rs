use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub sweep: SweepConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_access_ttl_secs() -> i64 {
    900 // 15 minutes
}

fn default_refresh_ttl_secs() -> i64 {
    7 * 24 * 3600 // 7 days
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

type Builder = config::builder::ConfigBuilder<config::builder::DefaultState>;

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::Environment::default().separator("__"));
        let config = Self::with_defaults(builder)?.build()?;

        Ok(config.try_deserialize()?)
    }

    fn with_defaults(builder: Builder) -> std::result::Result<Builder, config::ConfigError> {
        builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "postgres://localhost/notes")?
            .set_default("database.max_connections", 10)?
            .set_default("jwt.secret", "development-secret-change-in-production")?
            .set_default("jwt.access_ttl_secs", 900)?
            .set_default("jwt.refresh_ttl_secs", 7 * 24 * 3600)?
            .set_default("cookie.secure", false)?
            .set_default("sweep.interval_secs", 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Defaults only, no environment source: the test must not depend on
    // whatever SERVER__PORT-style variables the host process carries.
    #[test]
    fn test_defaults_deserialize() {
        let config: Config = Config::with_defaults(config::Config::builder())
            .and_then(|b| b.build())
            .expect("defaults should build")
            .try_deserialize()
            .expect("defaults should deserialize");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.jwt.access_ttl_secs, 900);
        assert_eq!(config.jwt.refresh_ttl_secs, 7 * 24 * 3600);
        assert!(!config.cookie.secure);
        assert_eq!(config.sweep.interval_secs, 3600);
    }
}
