use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::config::PwmConfig;
use crate::error::AppError;
use crate::models::channel::{DriveLevels, CHANNEL_FULL};

/// Sink for per-pin drive levels. Writes are assumed to succeed; a driver
/// that can fail logs and carries on.
pub trait ChannelDriver {
    fn write(&mut self, levels: DriveLevels);
}

/// Logs levels instead of driving pins. Useful without PWM hardware.
#[derive(Debug, Default)]
pub struct LogDriver {
    last: Option<DriveLevels>,
}

impl LogDriver {
    pub fn last(&self) -> Option<DriveLevels> {
        self.last
    }
}

impl ChannelDriver for LogDriver {
    fn write(&mut self, levels: DriveLevels) {
        info!("output: cool={} warm={}", levels.cool, levels.warm);
        self.last = Some(levels);
    }
}

/// Linux sysfs PWM (`/sys/class/pwm/pwmchipN/pwmM`).
#[derive(Debug)]
pub struct SysfsPwmDriver {
    cool: PathBuf,
    warm: PathBuf,
    period_ns: u64,
}

impl SysfsPwmDriver {
    /// Export both channels if needed, program the period and enable them.
    pub fn open(config: &PwmConfig) -> Result<Self, AppError> {
        let cool = export_channel(&config.chip, config.cool_channel)?;
        let warm = export_channel(&config.chip, config.warm_channel)?;

        for channel in [&cool, &warm] {
            // duty_cycle must never exceed period, so zero it first.
            write_attr(channel, "duty_cycle", 0)?;
            write_attr(channel, "period", config.period_ns)?;
            write_attr(channel, "enable", 1)?;
        }

        Ok(Self {
            cool,
            warm,
            period_ns: config.period_ns,
        })
    }

    fn duty_ns(&self, level: u8) -> u64 {
        u64::from(level) * self.period_ns / u64::from(CHANNEL_FULL)
    }
}

impl ChannelDriver for SysfsPwmDriver {
    fn write(&mut self, levels: DriveLevels) {
        for (channel, level) in [(&self.cool, levels.cool), (&self.warm, levels.warm)] {
            if let Err(e) = write_attr(channel, "duty_cycle", self.duty_ns(level)) {
                warn!("output: {}", e);
            }
        }
    }
}

fn export_channel(chip: &Path, channel: u32) -> Result<PathBuf, AppError> {
    let dir = chip.join(format!("pwm{}", channel));
    if dir.is_dir() {
        return Ok(dir);
    }

    fs::write(chip.join("export"), channel.to_string()).map_err(|e| {
        AppError::Driver(format!("exporting pwm{} on {}: {}", channel, chip.display(), e))
    })?;

    // udev may take a moment to create the attribute files.
    for _ in 0..20 {
        if dir.is_dir() {
            return Ok(dir);
        }
        thread::sleep(Duration::from_millis(10));
    }
    Err(AppError::Driver(format!("{} did not appear", dir.display())))
}

fn write_attr(channel: &Path, attr: &str, value: u64) -> Result<(), AppError> {
    let path = channel.join(attr);
    fs::write(&path, value.to_string())
        .map_err(|e| AppError::Driver(format!("writing {}: {}", path.display(), e)))
}
