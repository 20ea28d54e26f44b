use serde::{Deserialize, Serialize};

pub const MAX_BRIGHTNESS: u8 = 255;

/// Inclusive color-temperature bounds of the fixture, in kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureRange {
    pub min_kelvin: u16,
    pub max_kelvin: u16,
}

impl TemperatureRange {
    pub const fn new(min_kelvin: u16, max_kelvin: u16) -> Self {
        Self {
            min_kelvin,
            max_kelvin,
        }
    }

    pub fn midpoint(&self) -> u16 {
        ((u32::from(self.min_kelvin) + u32::from(self.max_kelvin)) / 2) as u16
    }

    pub fn clamp(&self, kelvin: i64) -> u16 {
        kelvin.clamp(i64::from(self.min_kelvin), i64::from(self.max_kelvin)) as u16
    }

    pub fn contains(&self, kelvin: u16) -> bool {
        (self.min_kelvin..=self.max_kelvin).contains(&kelvin)
    }
}

impl Default for TemperatureRange {
    fn default() -> Self {
        Self::new(2000, 6535)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LightState {
    pub on: bool,
    pub brightness: u8,
    /// Kelvin, always inside the manager's `TemperatureRange`.
    pub color_temperature: u16,
}

impl LightState {
    /// Boot state: on, full brightness, halfway between the temperature bounds.
    pub fn initial(range: &TemperatureRange) -> Self {
        Self {
            on: true,
            brightness: MAX_BRIGHTNESS,
            color_temperature: range.midpoint(),
        }
    }
}

/// Fields decoded from one command message. `None` leaves the field untouched.
///
/// Numeric values are carried unclamped; `LightStateManager::apply` owns the
/// range policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialUpdate {
    pub on: Option<bool>,
    pub brightness: Option<i64>,
    /// Kelvin, already converted from the mireds used on the wire.
    pub color_temperature: Option<i64>,
}

/// Owner of the authoritative light state.
#[derive(Debug, Clone)]
pub struct LightStateManager {
    state: LightState,
    range: TemperatureRange,
}

impl LightStateManager {
    pub fn new(range: TemperatureRange) -> Self {
        Self {
            state: LightState::initial(&range),
            range,
        }
    }

    pub fn range(&self) -> &TemperatureRange {
        &self.range
    }

    /// Merge `update` into the current state.
    ///
    /// Out-of-range brightness and temperature are clamped to the nearest
    /// bound: the command channel has no way to report a rejection back to
    /// the sender. Returns whether anything changed.
    pub fn apply(&mut self, update: &PartialUpdate) -> bool {
        let before = self.state;

        if let Some(on) = update.on {
            self.state.on = on;
        }
        if let Some(brightness) = update.brightness {
            self.state.brightness = brightness.clamp(0, i64::from(MAX_BRIGHTNESS)) as u8;
        }
        if let Some(kelvin) = update.color_temperature {
            self.state.color_temperature = self.range.clamp(kelvin);
        }
        debug_assert!(self.range.contains(self.state.color_temperature));

        before != self.state
    }

    pub fn snapshot(&self) -> LightState {
        self.state
    }
}
