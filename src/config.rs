use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub iot: IotConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

/// Shared secret used by the station fleet to sign sync messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IotConfig {
    pub secret: String,
    #[serde(default = "default_timestamp_tolerance")]
    pub timestamp_tolerance_secs: i64,
}

fn default_timestamp_tolerance() -> i64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaymentsConfig {
    pub webhook_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    pub signup_bonus_points: i64,
    pub referral_inviter_points: i64,
    pub referral_invitee_points: i64,
    pub referral_expiry_days: i64,
    pub rental_completion_points: i64,
    /// Points per full 100 NPR topped up.
    pub topup_points_per_100: i64,
    /// Points exchanged for 1 NPR of wallet credit.
    #[serde(default = "default_redemption_points_per_npr")]
    pub redemption_points_per_npr: i64,
}

fn default_redemption_points_per_npr() -> i64 {
    10
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            signup_bonus_points: 50,
            referral_inviter_points: 100,
            referral_invitee_points: 50,
            referral_expiry_days: 30,
            rental_completion_points: 5,
            topup_points_per_100: 10,
            redemption_points_per_npr: default_redemption_points_per_npr(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    pub overdue_check_interval_secs: u64,
    pub pending_rental_timeout_minutes: i64,
    pub referral_expiry_interval_secs: u64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            overdue_check_interval_secs: 60,
            pending_rental_timeout_minutes: 5,
            referral_expiry_interval_secs: 3600,
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| format!("failed to parse config file: {e}"))?,
            // No file: build everything from the environment and defaults
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env()?,
            Err(e) => {
                return Err(format!("cannot read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let database_url = get_env("DATABASE_URL")
            .ok_or("DATABASE_URL is not set and no config.toml was found")?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET")
                    .unwrap_or_else(|| "change-me-in-production".to_string()),
                access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 3600i64),
                refresh_token_expires_in: get_env_parse("JWT_REFRESH_EXPIRES_IN", 2_592_000i64),
            },
            iot: IotConfig {
                secret: get_env("IOT_SECRET").unwrap_or_default(),
                timestamp_tolerance_secs: get_env_parse(
                    "IOT_TIMESTAMP_TOLERANCE_SECS",
                    default_timestamp_tolerance(),
                ),
            },
            payments: PaymentsConfig {
                webhook_secret: get_env("PAYMENT_WEBHOOK_SECRET").unwrap_or_default(),
            },
            rewards: RewardsConfig::default(),
            tasks: TasksConfig::default(),
        })
    }

    /// Environment variables win over file values.
    fn apply_env_overrides(&mut self) {
        if let Some(v) = get_env("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = get_env("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Some(v) = get_env("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = get_env("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Some(v) = get_env("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Some(v) = get_env("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Some(v) = get_env("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.refresh_token_expires_in = n;
        }
        if let Some(v) = get_env("IOT_SECRET") {
            self.iot.secret = v;
        }
        if let Some(v) = get_env("IOT_TIMESTAMP_TOLERANCE_SECS")
            && let Ok(n) = v.parse()
        {
            self.iot.timestamp_tolerance_secs = n;
        }
        if let Some(v) = get_env("PAYMENT_WEBHOOK_SECRET") {
            self.payments.webhook_secret = v;
        }
        if let Some(v) = get_env("REFERRAL_EXPIRY_DAYS")
            && let Ok(n) = v.parse()
        {
            self.rewards.referral_expiry_days = n;
        }
        if let Some(v) = get_env("PENDING_RENTAL_TIMEOUT_MINUTES")
            && let Ok(n) = v.parse()
        {
            self.tasks.pending_rental_timeout_minutes = n;
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_toml_fills_defaults() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgres://localhost/chargeghar"
            max_connections = 5

            [jwt]
            secret = "s3cret"
            access_token_expires_in = 600
            refresh_token_expires_in = 86400

            [iot]
            secret = "device-secret"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.iot.timestamp_tolerance_secs, 300);
        assert_eq!(config.rewards.referral_inviter_points, 100);
        assert_eq!(config.rewards.referral_invitee_points, 50);
        assert_eq!(config.rewards.referral_expiry_days, 30);
        assert!(config.payments.webhook_secret.is_empty());
        assert_eq!(config.tasks.overdue_check_interval_secs, 60);
    }

    #[test]
    fn test_rewards_section_overrides_defaults() {
        let raw = r#"
            signup_bonus_points = 0
            referral_inviter_points = 200
            referral_invitee_points = 75
            referral_expiry_days = 14
            rental_completion_points = 1
            topup_points_per_100 = 0
        "#;
        let rewards: RewardsConfig = toml::from_str(raw).unwrap();
        assert_eq!(rewards.referral_inviter_points, 200);
        assert_eq!(rewards.referral_expiry_days, 14);
        assert_eq!(rewards.redemption_points_per_npr, 10);
    }
}
