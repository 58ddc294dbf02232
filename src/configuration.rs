use crate::{
    differential_controller::PolicyConfig, driver::TransportConfig, localisation::AxisMapping,
};
use config::Config;
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};
use tracing::*;

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub path_file: PathBuf,
    #[serde(default)]
    pub tick_period_ms: Option<u64>,
    #[serde(default)]
    pub policy: PolicyConfig,
    pub transport: TransportConfig,
    #[serde(default)]
    pub axes: AxisMapping,
}

/// `APP_TICK_PERIOD_MS=50` or `APP_POLICY__KIND=heading_error` style overrides.
fn environment() -> config::Environment {
    config::Environment::with_prefix("APP")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl AppConfig {
    pub fn load_config(config: &Option<PathBuf>) -> anyhow::Result<Self> {
        let settings = if let Some(config) = config {
            info!("Using configuration from {:?}", config);
            Config::builder()
                .add_source(config::File::with_name(
                    config
                        .to_str()
                        .ok_or_else(|| anyhow::anyhow!("Failed to convert path"))?,
                ))
                .add_source(environment())
                .build()?
        } else {
            info!("Using dev configuration");
            Config::builder()
                .add_source(config::File::with_name("config/settings"))
                .add_source(config::File::with_name("config/dev_settings").required(false))
                .add_source(environment())
                .build()?
        };

        Ok(settings.try_deserialize()?)
    }

    pub fn tick_period(&self) -> Option<Duration> {
        self.tick_period_ms.map(Duration::from_millis)
    }
}
