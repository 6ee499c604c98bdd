use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub mail_from: String,
    /// Quantity a freshly created component starts with in stock.
    pub stock_initial_quantity: i32,
    /// Default amount used by staff replenish/reduce actions.
    pub stock_adjust_step: i32,
    pub topup_code_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let mail_from =
            env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@pc-storefront.local".to_string());
        Ok(Self {
            port,
            database_url,
            host,
            mail_from,
            stock_initial_quantity: parse_env("STOCK_INITIAL_QUANTITY", 10),
            stock_adjust_step: parse_env("STOCK_ADJUST_STEP", 10),
            topup_code_ttl_minutes: parse_env("TOPUP_CODE_TTL_MINUTES", 15),
        })
    }

    /// Configuration with every optional value at its default.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            mail_from: "noreply@pc-storefront.local".to_string(),
            stock_initial_quantity: 10,
            stock_adjust_step: 10,
            topup_code_ttl_minutes: 15,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
