use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::light_state::{LightState, TemperatureRange};

pub const CHANNEL_OFF: u8 = 0;
pub const CHANNEL_FULL: u8 = 255;

/// Logical light output per channel: 0 is dark, 255 is full intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelOutput {
    pub cool: u8,
    pub warm: u8,
}

impl ChannelOutput {
    pub const OFF: ChannelOutput = ChannelOutput {
        cool: CHANNEL_OFF,
        warm: CHANNEL_OFF,
    };

    pub fn is_dark(&self) -> bool {
        *self == Self::OFF
    }

    /// Translate logical output into the values written to the pins.
    pub fn drive_levels(&self, polarity: Polarity) -> DriveLevels {
        match polarity {
            Polarity::ActiveHigh => DriveLevels {
                cool: self.cool,
                warm: self.warm,
            },
            Polarity::ActiveLow => DriveLevels {
                cool: CHANNEL_FULL - self.cool,
                warm: CHANNEL_FULL - self.warm,
            },
        }
    }
}

/// How a channel's pin level relates to emitted light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
    /// 255 on the pin is full light.
    ActiveHigh,
    /// 255 on the pin is dark (LED driver sinks current).
    #[default]
    ActiveLow,
}

/// Raw per-pin duty values, already adjusted for polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriveLevels {
    pub cool: u8,
    pub warm: u8,
}

/// Map a light state onto the cool/warm channel pair.
///
/// Below the midpoint of `range` the warm channel runs at full and the cool
/// channel fades in with temperature; above it the cool channel runs at full
/// and the warm channel fades out. `brightness` does not scale the result.
pub fn mix(
    on: bool,
    _brightness: u8,
    temperature_k: u16,
    range: &TemperatureRange,
) -> ChannelOutput {
    if !on {
        return ChannelOutput::OFF;
    }

    let t = i32::from(temperature_k);
    let min = i32::from(range.min_kelvin);
    let max = i32::from(range.max_kelvin);
    let mid = i32::from(range.midpoint());

    if t > mid {
        ChannelOutput {
            cool: CHANNEL_FULL,
            warm: to_channel(map_range(t, mid, max, 255, 0)),
        }
    } else {
        ChannelOutput {
            cool: to_channel(map_range(t, min, mid, 0, 255)),
            warm: CHANNEL_FULL,
        }
    }
}

pub fn mix_state(state: &LightState, range: &TemperatureRange) -> ChannelOutput {
    mix(state.on, state.brightness, state.color_temperature, range)
}

// Integer linear interpolation, truncating toward zero.
fn map_range(x: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_max == in_min {
        return out_max;
    }
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

fn to_channel(value: i32) -> u8 {
    value.clamp(i32::from(CHANNEL_OFF), i32::from(CHANNEL_FULL)) as u8
}
