use std::env;
use tracing::warn;

pub const DEFAULT_BUSINESS_TIMEZONE: &str = "America/Sao_Paulo";
pub const DEFAULT_SLOT_BUFFER_MINUTES: u32 = 5;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// IANA zone that defines "today" and "now" for slot cutoffs.
    pub business_timezone: String,
    /// Slots starting within this many minutes from now are not offered.
    pub slot_buffer_minutes: u32,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            business_timezone: env::var("BUSINESS_TIMEZONE")
                .unwrap_or_else(|_| DEFAULT_BUSINESS_TIMEZONE.to_string()),
            slot_buffer_minutes: parse_or_default("SLOT_BOOKING_BUFFER_MINUTES", DEFAULT_SLOT_BUFFER_MINUTES),
            port: parse_or_default("PORT", DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
