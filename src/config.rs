use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    /// Hard cap on the number of occurrences one recurring request may expand to.
    pub max_recurrence_occurrences: usize,
    pub idempotency_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            max_recurrence_occurrences: env::var("MAX_RECURRENCE_OCCURRENCES")
                .unwrap_or_else(|_| "366".to_string())
                .parse()
                .expect("MAX_RECURRENCE_OCCURRENCES must be a number"),
            idempotency_ttl_secs: env::var("IDEMPOTENCY_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .expect("IDEMPOTENCY_TTL_SECS must be a number"),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_secs(self.idempotency_ttl_secs)
    }
}
