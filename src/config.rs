use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::channel::Polarity;
use crate::models::light_state::TemperatureRange;
use crate::protocol::topics::Topics;

const CONFIG_DIR: &str = "tunelight";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Json,
    Table,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub output_mode: OutputMode,
    pub verbose: bool,
}

/// Everything needed to run one light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Used as MQTT client id, discovery name and topic segment.
    pub hostname: String,
    pub broker: BrokerConfig,
    pub temperature: TemperatureRange,
    pub reconnect_delay_secs: u64,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub polarity: Polarity,
    pub pwm: Option<PwmConfig>,
}

/// Linux sysfs PWM channels driving the two LED strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PwmConfig {
    /// e.g. `/sys/class/pwm/pwmchip0`
    pub chip: PathBuf,
    pub cool_channel: u32,
    pub warm_channel: u32,
    #[serde(default = "default_pwm_period")]
    pub period_ns: u64,
}

fn default_pwm_period() -> u64 {
    // 1 kHz
    1_000_000
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            hostname: "office_lights".into(),
            broker: BrokerConfig::default(),
            temperature: TemperatureRange::default(),
            reconnect_delay_secs: 5,
            output: OutputConfig::default(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 1883,
            username: None,
            password: None,
            keep_alive_secs: 15,
        }
    }
}

impl DeviceConfig {
    pub fn topics(&self) -> Topics {
        Topics::for_hostname(&self.hostname)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.hostname.is_empty() {
            return Err(AppError::Config("hostname must not be empty".into()));
        }
        if self.hostname.contains(['/', '+', '#']) {
            return Err(AppError::Config(format!(
                "hostname {:?} contains an MQTT topic separator or wildcard",
                self.hostname
            )));
        }
        if self.broker.host.is_empty() {
            return Err(AppError::Config("broker host must not be empty".into()));
        }
        let range = &self.temperature;
        if range.min_kelvin == 0 {
            return Err(AppError::Config("min_kelvin must be positive".into()));
        }
        if range.min_kelvin >= range.max_kelvin {
            return Err(AppError::Config(format!(
                "min_kelvin ({}) must be below max_kelvin ({})",
                range.min_kelvin, range.max_kelvin
            )));
        }
        if let Some(pwm) = &self.output.pwm {
            if pwm.period_ns == 0 {
                return Err(AppError::Config("pwm period_ns must be positive".into()));
            }
            if pwm.cool_channel == pwm.warm_channel {
                return Err(AppError::Config(
                    "cool and warm PWM channels must differ".into(),
                ));
            }
        }
        Ok(())
    }
}

/// `<config_dir>/tunelight/config.json`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load the device config from `path`, or from the default location.
///
/// An explicit path must exist; the default location is optional and falls
/// back to built-in defaults.
pub fn load_device_config(path: Option<&Path>) -> Result<DeviceConfig, AppError> {
    match path {
        Some(path) => read_config_file(path),
        None => match default_config_path() {
            Some(path) if path.exists() => read_config_file(&path),
            _ => Ok(DeviceConfig::default()),
        },
    }
}

fn read_config_file(path: &Path) -> Result<DeviceConfig, AppError> {
    let config_error = |message: String| AppError::ConfigFile {
        path: path.display().to_string(),
        message,
    };
    let contents = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| config_error(e.to_string()))
}
