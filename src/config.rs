const DEFAULT_SECRET: &str = "insecure-dev-secret-change-me";

/// Process configuration, read from the environment once at startup.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub listen_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        let secret_key = match std::env::var("SECRET_KEY") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                tracing::warn!("SECRET_KEY not set, using insecure default");
                DEFAULT_SECRET.to_string()
            }
        };

        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://expenses.db?mode=rwc".to_string()),
            secret_key,
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        }
    }
}
