use serde::Deserialize;

/// Runtime configuration, loaded once at startup and passed into the
/// application state explicitly. Nothing here is read from ambient
/// globals after boot.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub scoring_base_url: String,
    /// Lifetime of an issued session token, in seconds.
    pub session_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            scoring_base_url: std::env::var("SCORING_BASE_URL")
                .map_err(|_| anyhow::anyhow!("SCORING_BASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("SCORING_BASE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("SCORING_BASE_URL must start with http:// or https://");
                    }
                    Ok(url.trim_end_matches('/').to_string())
                })?,
            session_ttl_secs: std::env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SESSION_TTL_SECS must be a positive number"))
                .and_then(|ttl: i64| {
                    if ttl <= 0 {
                        anyhow::bail!("SESSION_TTL_SECS must be a positive number");
                    }
                    Ok(ttl)
                })?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Scoring base URL: {}", config.scoring_base_url);
        tracing::debug!("Server port: {}", config.port);

        Ok(config)
    }
}
