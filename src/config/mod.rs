use std::env;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 100;
pub const SETTLEMENT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string. Without it the in-memory repository is used.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,

    // Pagination
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub settlement_page_size: usize,

    /// Key for signing continuation tokens. Random per process when unset,
    /// so tokens do not survive a restart.
    pub page_token_secret: Option<String>,

    /// Bearer token required on `/api/*` when set.
    pub api_token: Option<String>,

    pub log_json: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            default_page_size: parse_or("DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            max_page_size: parse_or("MAX_PAGE_SIZE", MAX_PAGE_SIZE)?,
            settlement_page_size: parse_or("SETTLEMENT_PAGE_SIZE", SETTLEMENT_PAGE_SIZE)?,

            page_token_secret: env::var("PAGE_TOKEN_SECRET").ok().filter(|s| !s.is_empty()),
            api_token: env::var("API_TOKEN").ok().filter(|s| !s.is_empty()),

            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.max_page_size == 0 || self.settlement_page_size == 0 {
            anyhow::bail!("MAX_PAGE_SIZE and SETTLEMENT_PAGE_SIZE must be positive");
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            anyhow::bail!(
                "DEFAULT_PAGE_SIZE must be between 1 and MAX_PAGE_SIZE ({})",
                self.max_page_size
            );
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: "127.0.0.1".into(),
            port: 8080,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            settlement_page_size: SETTLEMENT_PAGE_SIZE,
            page_token_secret: None,
            api_token: None,
            log_json: false,
        }
    }
}

fn parse_or(key: &str, default: usize) -> anyhow::Result<usize> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} must be a positive integer: {e}")),
        Err(_) => Ok(default),
    }
}
