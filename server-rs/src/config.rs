use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub store_backend: StoreBackend,
    pub db: DbConfig,
    pub redis_url: Option<String>,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub leaderboard: LeaderboardConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Clone, Debug)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub pool_min: u32,
    pub pool_max: u32,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_secs: i64,
    pub bcrypt_cost: u32,
    /// Accounts registered with one of these emails get the ADMIN role.
    pub admin_emails: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u32,
    pub join_max: u32,
}

#[derive(Clone, Debug)]
pub struct LeaderboardConfig {
    pub cache_seconds: u64,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_or_parse("PORT", 5000),
            cors_origins: split_list(&env_or("CORS_ORIGINS", "http://localhost:5173")),
            store_backend: match env_or("STORE_BACKEND", "postgres").to_lowercase().as_str() {
                "memory" => StoreBackend::Memory,
                _ => StoreBackend::Postgres,
            },
            db: DbConfig {
                host: env_or("DB_HOST", "localhost"),
                port: env_or_parse("DB_PORT", 5432),
                database: env_or("DB_NAME", "ff_arena"),
                user: env_or("DB_USER", "arena"),
                password: env_or("DB_PASSWORD", ""),
                pool_min: env_or_parse("DB_POOL_MIN", 2),
                pool_max: env_or_parse("DB_POOL_MAX", 20),
            },
            redis_url: env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            auth: AuthConfig {
                jwt_secret: env_or("JWT_SECRET", "change-me-to-a-secure-random-string"),
                token_expiry_secs: parse_duration_to_secs(&env_or("JWT_EXPIRY", "7d")),
                bcrypt_cost: env_or_parse("BCRYPT_COST", bcrypt::DEFAULT_COST),
                admin_emails: split_list(&env_or("ADMIN_EMAILS", ""))
                    .into_iter()
                    .map(|e| e.to_lowercase())
                    .collect(),
            },
            rate_limit: RateLimitConfig {
                window_secs: 60,
                max_requests: env_or_parse("RATE_LIMIT_MAX", 100),
                join_max: env_or_parse("RATE_LIMIT_JOIN", 10),
            },
            leaderboard: LeaderboardConfig {
                cache_seconds: env_or_parse("LEADERBOARD_CACHE_SEC", 30),
            },
        }
    }

    pub fn database_url(&self) -> String {
        if let Ok(url) = env::var("DATABASE_URL") {
            return url;
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db.user, self.db.password, self.db.host, self.db.port, self.db.database
        )
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.auth.admin_emails.iter().any(|e| *e == email)
    }
}

fn parse_duration_to_secs(s: &str) -> i64 {
    let s = s.trim();
    if s.is_empty() {
        return 3600;
    }
    let split = s.char_indices().last().map_or(0, |(i, _)| i);
    let (num_str, unit) = s.split_at(split);
    let num: i64 = num_str.parse().unwrap_or(1);
    match unit {
        "s" => num,
        "m" => num * 60,
        "h" => num * 3600,
        "d" => num * 86400,
        _ => s.parse().unwrap_or(3600),
    }
}
