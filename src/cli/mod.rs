pub mod decode;
pub mod discovery;
pub mod mix;
pub mod output;
pub mod run;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{DeviceConfig, PwmConfig};
use crate::models::channel::Polarity;

#[derive(Parser)]
#[command(
    name = "tunelight",
    version,
    about = "Tunable-white light controller for MQTT / Home Assistant"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as human-readable table instead of JSON
    #[arg(short = 't', long = "table", global = true)]
    pub table: bool,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON config file (default: <config dir>/tunelight/config.json)
    #[arg(short, long, global = true, env = "TUNELIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to the broker and control the light
    Run,

    /// Show the discovery descriptor and topic names
    Discovery,

    /// Compute channel output for a light state
    Mix {
        /// Evaluate the light switched off
        #[arg(long)]
        off: bool,
        /// Brightness (0-255)
        #[arg(long, default_value_t = 255)]
        brightness: u8,
        /// Color temperature in kelvin (default: midpoint of the range)
        #[arg(long)]
        kelvin: Option<u16>,
    },

    /// Decode a command payload against the boot state
    Decode {
        /// JSON payload as it would arrive on the command topic
        payload: String,
    },
}

/// Device settings that override the config file.
#[derive(Args, Debug, Default)]
pub struct DeviceArgs {
    /// Device hostname (topic segment and MQTT client id)
    #[arg(long, global = true, env = "TUNELIGHT_HOSTNAME")]
    pub hostname: Option<String>,

    /// MQTT broker host
    #[arg(long, global = true, env = "MQTT_HOST")]
    pub mqtt_host: Option<String>,

    /// MQTT broker port
    #[arg(long, global = true, env = "MQTT_PORT")]
    pub mqtt_port: Option<u16>,

    /// MQTT username
    #[arg(long, global = true, env = "MQTT_USER")]
    pub mqtt_user: Option<String>,

    /// MQTT password
    #[arg(long, global = true, env = "MQTT_PASS", hide_env_values = true)]
    pub mqtt_pass: Option<String>,

    /// Warmest supported color temperature (K)
    #[arg(long, global = true, env = "TUNELIGHT_MIN_KELVIN")]
    pub min_kelvin: Option<u16>,

    /// Coolest supported color temperature (K)
    #[arg(long, global = true, env = "TUNELIGHT_MAX_KELVIN")]
    pub max_kelvin: Option<u16>,

    /// Seconds between failed connection attempts
    #[arg(long, global = true, env = "TUNELIGHT_RETRY_SECS")]
    pub retry_secs: Option<u64>,

    /// Pin polarity of the LED channels
    #[arg(long, global = true, value_enum, env = "TUNELIGHT_POLARITY")]
    pub polarity: Option<Polarity>,

    /// sysfs PWM chip, e.g. /sys/class/pwm/pwmchip0
    #[arg(long, global = true, env = "TUNELIGHT_PWM_CHIP")]
    pub pwm_chip: Option<PathBuf>,

    /// PWM channel for the cool LEDs
    #[arg(long, global = true)]
    pub pwm_cool: Option<u32>,

    /// PWM channel for the warm LEDs
    #[arg(long, global = true)]
    pub pwm_warm: Option<u32>,
}

impl DeviceArgs {
    pub fn apply_to(&self, config: &mut DeviceConfig) {
        if let Some(ref hostname) = self.hostname {
            config.hostname = hostname.clone();
        }
        if let Some(ref host) = self.mqtt_host {
            config.broker.host = host.clone();
        }
        if let Some(port) = self.mqtt_port {
            config.broker.port = port;
        }
        if let Some(ref user) = self.mqtt_user {
            config.broker.username = Some(user.clone());
        }
        if let Some(ref pass) = self.mqtt_pass {
            config.broker.password = Some(pass.clone());
        }
        if let Some(min) = self.min_kelvin {
            config.temperature.min_kelvin = min;
        }
        if let Some(max) = self.max_kelvin {
            config.temperature.max_kelvin = max;
        }
        if let Some(secs) = self.retry_secs {
            config.reconnect_delay_secs = secs;
        }
        if let Some(polarity) = self.polarity {
            config.output.polarity = polarity;
        }

        if let Some(ref chip) = self.pwm_chip {
            let pwm = config.output.pwm.get_or_insert_with(|| PwmConfig {
                chip: chip.clone(),
                cool_channel: 0,
                warm_channel: 1,
                period_ns: 1_000_000,
            });
            pwm.chip = chip.clone();
        }
        if let Some(ref mut pwm) = config.output.pwm {
            if let Some(channel) = self.pwm_cool {
                pwm.cool_channel = channel;
            }
            if let Some(channel) = self.pwm_warm {
                pwm.warm_channel = channel;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::light_state::TemperatureRange;

    #[test]
    fn test_args_override_config() {
        let args = DeviceArgs {
            hostname: Some("bedroom".into()),
            mqtt_port: Some(8883),
            max_kelvin: Some(6500),
            polarity: Some(Polarity::ActiveHigh),
            ..Default::default()
        };
        let mut config = DeviceConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.hostname, "bedroom");
        assert_eq!(config.broker.port, 8883);
        assert_eq!(config.broker.host, "127.0.0.1");
        assert_eq!(config.temperature, TemperatureRange::new(2000, 6500));
        assert_eq!(config.output.polarity, Polarity::ActiveHigh);
        assert!(config.output.pwm.is_none());
    }

    #[test]
    fn test_pwm_chip_enables_pwm_output() {
        let args = DeviceArgs {
            pwm_chip: Some("/sys/class/pwm/pwmchip0".into()),
            pwm_warm: Some(3),
            ..Default::default()
        };
        let mut config = DeviceConfig::default();
        args.apply_to(&mut config);

        let pwm = config.output.pwm.unwrap();
        assert_eq!(pwm.cool_channel, 0);
        assert_eq!(pwm.warm_channel, 3);
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
