use crate::time::TimeOfDay;
use anyhow::{anyhow, Context};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub const LOG_ENV: &str = "EDUTRACKER_LOG";

#[derive(Debug, Clone)]
pub struct Config {
    pub workspace: Option<PathBuf>,
    pub cache_ttl: Duration,
    pub cache_refresh_after: Duration,
    pub day_start: TimeOfDay,
    pub day_end: TimeOfDay,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            cache_ttl: Duration::from_secs(5 * 60),
            cache_refresh_after: Duration::from_secs(3 * 60),
            day_start: TimeOfDay::from_minutes(8 * 60).unwrap_or(TimeOfDay::MIDNIGHT),
            day_end: TimeOfDay::from_minutes(18 * 60).unwrap_or(TimeOfDay::MIDNIGHT),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let workspace = lookup("EDUTRACKER_WORKSPACE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let ttl_secs: u64 = load(&lookup, "EDUTRACKER_CACHE_TTL_SECS", defaults.cache_ttl.as_secs())?;
        let refresh_secs: u64 = load(
            &lookup,
            "EDUTRACKER_CACHE_REFRESH_SECS",
            defaults.cache_refresh_after.as_secs(),
        )?;
        let day_start: TimeOfDay = load(&lookup, "EDUTRACKER_DAY_START", defaults.day_start)?;
        let day_end: TimeOfDay = load(&lookup, "EDUTRACKER_DAY_END", defaults.day_end)?;
        if day_start >= day_end {
            return Err(anyhow!(
                "EDUTRACKER_DAY_START ({}) must be before EDUTRACKER_DAY_END ({})",
                day_start,
                day_end
            ));
        }
        Ok(Self {
            workspace,
            cache_ttl: Duration::from_secs(ttl_secs),
            cache_refresh_after: Duration::from_secs(refresh_secs.min(ttl_secs)),
            day_start,
            day_end,
        })
    }
}

fn load<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {key} value {raw:?}")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert!(cfg.workspace.is_none());
        assert_eq!(cfg.cache_ttl, Duration::from_secs(300));
        assert_eq!(cfg.cache_refresh_after, Duration::from_secs(180));
        assert_eq!(cfg.day_start.format_24h(), "08:00");
        assert_eq!(cfg.day_end.format_24h(), "18:00");
    }

    #[test]
    fn overrides_and_rejects_bad_values() {
        let cfg = Config::from_lookup(lookup(&[
            ("EDUTRACKER_CACHE_TTL_SECS", "60"),
            ("EDUTRACKER_CACHE_REFRESH_SECS", "120"),
            ("EDUTRACKER_DAY_START", "7:30 AM"),
        ]))
        .unwrap();
        assert_eq!(cfg.cache_ttl, Duration::from_secs(60));
        assert_eq!(cfg.cache_refresh_after, Duration::from_secs(60));
        assert_eq!(cfg.day_start.format_24h(), "07:30");

        assert!(Config::from_lookup(lookup(&[("EDUTRACKER_CACHE_TTL_SECS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("EDUTRACKER_DAY_START", "19:00"),
            ("EDUTRACKER_DAY_END", "18:00"),
        ]))
        .is_err());
    }
}
