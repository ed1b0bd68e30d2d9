use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use urania::houses::SYSTEM_NAMES;
use urania::timing::{TimingSettings, MAX_HORIZON_DAYS, MIN_HORIZON_DAYS};
use urania::BirthData;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "ORRERY_CONFIG";

const SEARCH_PATHS: [&str; 2] = ["configs/orrery.toml", "../../configs/orrery.toml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between global ephemeris ticks
    pub tick_period_secs: u64,
    /// First retry delay after an ephemeris failure
    pub backoff_initial_secs: u64,
    /// Retry delay ceiling; never longer than the tick period
    pub backoff_max_secs: u64,
    /// Seconds allowed for one ephemeris query
    pub provider_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_period_secs: 3600,
            backoff_initial_secs: 30,
            backoff_max_secs: 3600,
            provider_timeout_secs: 30,
        }
    }
}

impl SchedulerConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.tick_period_secs)
    }

    pub fn backoff_initial(&self) -> Duration {
        Duration::from_secs(self.backoff_initial_secs)
    }

    /// Backoff ceiling, bounded by the tick period.
    pub fn backoff_max(&self) -> Duration {
        Duration::from_secs(self.backoff_max_secs.min(self.tick_period_secs))
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WorkerConfig {
    /// Per-user recomputations running at once
    pub concurrency: usize,
    /// Milliseconds before a per-user job is abandoned for the tick
    pub job_timeout_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            job_timeout_ms: 5_000,
        }
    }
}

impl WorkerConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TimingConfig {
    pub horizon_days: u32,
    pub sample_interval_hours: u32,
    pub lunar_sample_hours: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let defaults = TimingSettings::default();
        Self {
            horizon_days: defaults.horizon_days,
            sample_interval_hours: defaults.sample_interval_hours,
            lunar_sample_hours: defaults.lunar_sample_hours,
        }
    }
}

impl TimingConfig {
    pub fn settings(&self) -> TimingSettings {
        TimingSettings {
            horizon_days: self.horizon_days,
            sample_interval_hours: self.sample_interval_hours,
            lunar_sample_hours: self.lunar_sample_hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TransitConfig {
    /// Transit aspects tighter than this (degrees) are active
    pub active_orb: f64,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            active_orb: urania::transit::DEFAULT_ACTIVE_ORB,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ChartConfig {
    /// `equal`, `whole_sign` or `porphyry`
    pub house_system: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            house_system: "equal".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Undelivered messages kept per subscriber before the oldest is dropped
    pub mailbox_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 16,
        }
    }
}

/// A user whose birth data is loaded at start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeedUser {
    pub id: String,
    pub date: String,
    pub time: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl SeedUser {
    pub fn birth_data(&self) -> BirthData {
        let data = BirthData::new(&self.date, &self.time, self.lat, self.lng);
        match &self.timezone {
            Some(tz) => data.with_timezone(tz),
            None => data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OrreryConfig {
    pub scheduler: SchedulerConfig,
    pub workers: WorkerConfig,
    pub timing: TimingConfig,
    pub transit: TransitConfig,
    pub chart: ChartConfig,
    pub broadcast: BroadcastConfig,
    pub seed_users: Vec<SeedUser>,
}

impl OrreryConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: OrreryConfig =
            toml::from_str(text).map_err(|e| anyhow::anyhow!("Failed to parse orrery config: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Could not read {}: {e}", path.display()))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scheduler.tick_period_secs == 0 {
            anyhow::bail!("scheduler.tick_period_secs must be positive");
        }
        if self.scheduler.backoff_initial_secs == 0 {
            anyhow::bail!("scheduler.backoff_initial_secs must be positive");
        }
        if self.scheduler.backoff_max_secs < self.scheduler.backoff_initial_secs {
            anyhow::bail!(
                "scheduler.backoff_max_secs ({}) is below backoff_initial_secs ({})",
                self.scheduler.backoff_max_secs,
                self.scheduler.backoff_initial_secs
            );
        }
        if self.scheduler.provider_timeout_secs == 0 {
            anyhow::bail!("scheduler.provider_timeout_secs must be positive");
        }
        if self.workers.concurrency == 0 {
            anyhow::bail!("workers.concurrency must be at least 1");
        }
        if self.workers.job_timeout_ms == 0 {
            anyhow::bail!("workers.job_timeout_ms must be positive");
        }
        if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&self.timing.horizon_days) {
            anyhow::bail!(
                "timing.horizon_days must be within {}..={}, got {}",
                MIN_HORIZON_DAYS,
                MAX_HORIZON_DAYS,
                self.timing.horizon_days
            );
        }
        if self.timing.sample_interval_hours == 0 || self.timing.lunar_sample_hours == 0 {
            anyhow::bail!("timing sample intervals must be positive");
        }
        if !(self.transit.active_orb > 0.0 && self.transit.active_orb <= 10.0) {
            anyhow::bail!("transit.active_orb must be in (0, 10], got {}", self.transit.active_orb);
        }
        urania::houses::system_by_name(&self.chart.house_system).map_err(|_| {
            anyhow::anyhow!(
                "chart.house_system {:?} is unknown. Valid systems: {:?}",
                self.chart.house_system,
                SYSTEM_NAMES
            )
        })?;
        if self.broadcast.mailbox_capacity == 0 {
            anyhow::bail!("broadcast.mailbox_capacity must be at least 1");
        }
        for seed in &self.seed_users {
            if seed.id.trim().is_empty() {
                anyhow::bail!("seed_users entries need a non-empty id");
            }
        }
        Ok(())
    }
}

/// Reads the config text: `$ORRERY_CONFIG` if set, otherwise the first of the common relative
/// paths that exists. `Ok(None)` when nothing was found.
pub fn read_config_text() -> anyhow::Result<Option<(PathBuf, String)>> {
    if let Ok(explicit) = env::var(CONFIG_ENV) {
        let path = PathBuf::from(explicit);
        let text = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("{CONFIG_ENV}={} is not readable: {e}", path.display()))?;
        return Ok(Some((path, text)));
    }
    for p in &SEARCH_PATHS {
        if let Ok(text) = fs::read_to_string(p) {
            return Ok(Some((PathBuf::from(p), text)));
        }
    }
    Ok(None)
}

/// Loads and validates the config. Falls back to defaults when no file exists.
pub fn load() -> anyhow::Result<(OrreryConfig, Option<PathBuf>)> {
    match read_config_text()? {
        Some((path, text)) => {
            let config = OrreryConfig::from_toml_str(&text)
                .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
            Ok((config, Some(path)))
        }
        None => Ok((OrreryConfig::default(), None)),
    }
}

/// JSON schema of the config file.
pub fn config_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(OrreryConfig)).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = OrreryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timing.horizon_days, 30);
        assert_eq!(config.transit.active_orb, 5.0);
    }

    #[test]
    fn test_backoff_capped_by_period() {
        let scheduler = SchedulerConfig {
            tick_period_secs: 60,
            backoff_max_secs: 600,
            ..SchedulerConfig::default()
        };
        assert_eq!(scheduler.backoff_max(), Duration::from_secs(60));
    }

    #[test]
    fn test_seed_user_birth_data() {
        let seed = SeedUser {
            id: "ada".into(),
            date: "1815-12-10".into(),
            time: "12:00".into(),
            lat: 51.5,
            lng: -0.13,
            timezone: Some("+00:00".into()),
        };
        assert!(seed.birth_data().validate().is_ok());
    }
}
