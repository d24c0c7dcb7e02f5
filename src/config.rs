use std::net::IpAddr;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub allowed_origins: Vec<String>,
    pub trusted_proxies: Vec<IpNet>,
    pub rate_limit: RateLimitConfig,
    pub log_level: String,
    pub mail: Option<MailConfig>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_submissions: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp: SmtpConfig,
    pub from: String,
    pub recipient: String,
    pub site_name: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub tls: TlsMode,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TlsMode {
    /// Implicit TLS, usually port 465.
    Tls,
    StartTls,
    None,
}

impl TlsMode {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "tls" | "ssl" => Ok(TlsMode::Tls),
            "starttls" => Ok(TlsMode::StartTls),
            "none" => Ok(TlsMode::None),
            other => Err(format!("Invalid CONTACT_SMTP_TLS '{other}': expected tls, starttls or none")),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let host: IpAddr = env_or("CONTACT_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid CONTACT_HOST: {e}"))?;

        let port: u16 = env_or("CONTACT_PORT", "5000")
            .parse()
            .map_err(|e| format!("Invalid CONTACT_PORT: {e}"))?;

        let max_body_size: usize = env_or("CONTACT_MAX_BODY_SIZE", "10240")
            .parse()
            .map_err(|e| format!("Invalid CONTACT_MAX_BODY_SIZE: {e}"))?;

        let allowed_origins = parse_origins(&env_or("CONTACT_ALLOWED_ORIGINS", ""));

        let trusted_proxies: Vec<IpNet> = env_or("CONTACT_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid CONTACT_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rate_limit = RateLimitConfig {
            max_submissions: env_or("CONTACT_RATE_LIMIT", "5")
                .parse()
                .map_err(|e| format!("Invalid CONTACT_RATE_LIMIT: {e}"))?,
            window_secs: env_or("CONTACT_RATE_LIMIT_WINDOW_SECS", "900")
                .parse()
                .map_err(|e| format!("Invalid CONTACT_RATE_LIMIT_WINDOW_SECS: {e}"))?,
        };

        let log_level = env_or("CONTACT_LOG_LEVEL", "info");

        let mail = match (
            std::env::var("CONTACT_SMTP_USER").ok(),
            std::env::var("CONTACT_SMTP_PASS").ok(),
            std::env::var("CONTACT_RECIPIENT_EMAIL").ok(),
        ) {
            (Some(user), Some(pass), Some(recipient)) => {
                let smtp = SmtpConfig {
                    host: env_or("CONTACT_SMTP_HOST", "smtp.hostinger.com"),
                    port: env_or("CONTACT_SMTP_PORT", "465")
                        .parse()
                        .map_err(|e| format!("Invalid CONTACT_SMTP_PORT: {e}"))?,
                    tls: TlsMode::parse(&env_or("CONTACT_SMTP_TLS", "tls"))?,
                    user: user.clone(),
                    pass,
                };
                Some(MailConfig {
                    smtp,
                    from: env_or("CONTACT_MAIL_FROM", &user),
                    recipient,
                    site_name: env_or("CONTACT_SITE_NAME", "Our Team"),
                })
            }
            _ => None,
        };

        Ok(Config {
            database_url,
            host,
            port,
            max_body_size,
            allowed_origins,
            trusted_proxies,
            rate_limit,
            log_level,
            mail,
        })
    }
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
