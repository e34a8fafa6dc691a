use std::env;

use chrono::NaiveTime;
use tracing::warn;

/// Application configuration loaded from the environment.
///
/// Clinic hours and slot granularity are fixed, externally configured
/// constants; the scheduling engine never derives them from data.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_port: u16,
    pub clinic_open: NaiveTime,
    pub clinic_close: NaiveTime,
    pub slot_minutes: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            bind_port: env::var("BIND_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            clinic_open: parse_time_var("CLINIC_OPEN", NaiveTime::from_hms_opt(8, 0, 0).unwrap()),
            clinic_close: parse_time_var("CLINIC_CLOSE", NaiveTime::from_hms_opt(20, 0, 0).unwrap()),
            slot_minutes: match env::var("SLOT_MINUTES").ok().and_then(|v| v.parse().ok()) {
                Some(0) => {
                    warn!("SLOT_MINUTES must be positive, using default");
                    30
                }
                Some(minutes) => minutes,
                None => 30,
            },
        };

        if config.clinic_open >= config.clinic_close {
            warn!("CLINIC_OPEN is not before CLINIC_CLOSE - every booking will be rejected");
        }

        config
    }
}

fn parse_time_var(name: &str, default: NaiveTime) -> NaiveTime {
    match env::var(name) {
        Ok(raw) => NaiveTime::parse_from_str(&raw, "%H:%M").unwrap_or_else(|_| {
            warn!("{} is not a valid HH:MM time, using default", name);
            default
        }),
        Err(_) => default,
    }
}
